use civica_core::models::{Team, TeamDraft, TeamMember, TeamRole};
use serde::Serialize;

use crate::error::ApiError;
use crate::http::HttpClient;

#[derive(Debug, Clone, Serialize)]
struct AddMember<'a> {
    user_id: &'a str,
    role: TeamRole,
}

/// Teams and their membership.
#[derive(Debug, Clone)]
pub struct TeamsService {
    http: HttpClient,
}

impl TeamsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<Team>, ApiError> {
        self.http.get("list teams", "/teams").await
    }

    pub async fn get(&self, id: &str) -> Result<Team, ApiError> {
        self.http.get("load team", &format!("/teams/{id}")).await
    }

    pub async fn create(&self, draft: &TeamDraft) -> Result<Team, ApiError> {
        draft.validate()?;
        self.http.post("create team", "/teams", draft).await
    }

    pub async fn update(&self, id: &str, draft: &TeamDraft) -> Result<Team, ApiError> {
        draft.validate()?;
        self.http
            .put("update team", &format!("/teams/{id}"), draft)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.http
            .delete("delete team", &format!("/teams/{id}"))
            .await
    }

    pub async fn members(&self, id: &str) -> Result<Vec<TeamMember>, ApiError> {
        self.http
            .get("list team members", &format!("/teams/{id}/members"))
            .await
    }

    pub async fn add_member(
        &self,
        id: &str,
        user_id: &str,
        role: TeamRole,
    ) -> Result<TeamMember, ApiError> {
        self.http
            .post(
                "add team member",
                &format!("/teams/{id}/members"),
                &AddMember { user_id, role },
            )
            .await
    }

    pub async fn remove_member(&self, id: &str, user_id: &str) -> Result<(), ApiError> {
        self.http
            .delete(
                "remove team member",
                &format!("/teams/{id}/members/{user_id}"),
            )
            .await
    }
}
