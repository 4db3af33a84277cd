use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Endpoints advertised on `/` and in 404 responses.
pub const AVAILABLE_ENDPOINTS: &[&str] = &["GET /", "GET /status", "POST /gerar", "POST /validar"];

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueKeyRequest {
    pub monetizzy_token: Option<String>,
    pub link: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IssueKeyResponse {
    pub success: bool,
    pub key: String,
    pub short_link: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RedeemKeyRequest {
    pub key: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RedeemKeyResponse {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusResponse {
    pub total: usize,
    pub used: usize,
    pub available: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct IndexResponse {
    pub status: String,
    pub message: String,
    pub total: usize,
    pub used: usize,
    pub available: usize,
    pub timestamp: DateTime<Utc>,
    pub endpoints: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundResponse {
    pub success: bool,
    pub error: String,
    pub available_endpoints: Vec<String>,
}
