use std::sync::Arc;

use crate::auth::{StaticToken, TokenProvider};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::services::{
    AdminService, AssignmentsService, CatalogsService, CategoriesService, DocumentsService,
    InstancesService, TeamsService, UsersService, WorkflowsService,
};

/// Every domain service over one shared HTTP client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub workflows: WorkflowsService,
    pub instances: InstancesService,
    pub assignments: AssignmentsService,
    pub catalogs: CatalogsService,
    pub categories: CategoriesService,
    pub teams: TeamsService,
    pub users: UsersService,
    pub documents: DocumentsService,
    pub admin: AdminService,
}

impl ApiClient {
    pub fn new(http: HttpClient) -> Self {
        Self {
            workflows: WorkflowsService::new(http.clone()),
            instances: InstancesService::new(http.clone()),
            assignments: AssignmentsService::new(http.clone()),
            catalogs: CatalogsService::new(http.clone()),
            categories: CategoriesService::new(http.clone()),
            teams: TeamsService::new(http.clone()),
            users: UsersService::new(http.clone()),
            documents: DocumentsService::new(http.clone()),
            admin: AdminService::new(http),
        }
    }

    /// Build from configuration, using `API_TOKEN` as a static token.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let token: Arc<dyn TokenProvider> = match &config.api_token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(StaticToken::none()),
        };
        Self::with_token(config, token)
    }

    pub fn with_token(
        config: &ClientConfig,
        token: Arc<dyn TokenProvider>,
    ) -> Result<Self, ApiError> {
        Ok(Self::new(HttpClient::new(config, token)?))
    }
}
