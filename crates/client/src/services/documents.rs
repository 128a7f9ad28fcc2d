use civica_core::input::{FilePart, SubmitPayload};
use civica_core::models::{AdminVerification, Document, VerificationAnalysis};

use crate::error::ApiError;
use crate::http::HttpClient;

/// Documents attached to instances and their verification.
#[derive(Debug, Clone)]
pub struct DocumentsService {
    http: HttpClient,
}

impl DocumentsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn get(&self, id: &str) -> Result<Document, ApiError> {
        self.http
            .get("load document", &format!("/documents/{id}"))
            .await
    }

    pub async fn list_for_instance(&self, instance_id: &str) -> Result<Vec<Document>, ApiError> {
        self.http
            .get(
                "list documents",
                &format!("/instances/{instance_id}/documents"),
            )
            .await
    }

    /// Upload a file to an instance as multipart.
    pub async fn upload(&self, instance_id: &str, file: FilePart) -> Result<Document, ApiError> {
        let payload = SubmitPayload::Multipart {
            fields: vec![],
            files: vec![file],
        };
        self.http
            .post_payload(
                "upload document",
                &format!("/instances/{instance_id}/documents"),
                &payload,
            )
            .await
    }

    pub async fn analyze(&self, id: &str) -> Result<VerificationAnalysis, ApiError> {
        let analysis: VerificationAnalysis = self
            .http
            .get("analyze document", &format!("/documents/{id}/analyze"))
            .await?;
        analysis.validate()?;
        Ok(analysis)
    }

    pub async fn admin_verify(
        &self,
        id: &str,
        verification: &AdminVerification,
    ) -> Result<Document, ApiError> {
        self.http
            .post(
                "verify document",
                &format!("/admin/documents/{id}/admin-verify"),
                verification,
            )
            .await
    }
}
