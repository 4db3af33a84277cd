use std::sync::Arc;

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{error, trace, warn};

use super::types::{
    AVAILABLE_ENDPOINTS, ErrorResponse, IndexResponse, IssueKeyRequest, IssueKeyResponse,
    NotFoundResponse, RedeemKeyRequest, RedeemKeyResponse, StatusResponse,
};
use crate::errors::KeygateError;
use crate::services::{KeyService, Redemption};
use crate::utils::constant_time_eq;

const GENERIC_INTERNAL_MESSAGE: &str = "Erro interno do servidor";
const GENERIC_GATEWAY_MESSAGE: &str = "Falha ao gerar o link encurtado";

/// Error code for a request body over `server.max_body_size`.
pub const PAYLOAD_TOO_LARGE_CODE: &str = "E413";

/// Request-facing settings shared by the key handlers.
#[derive(Clone, Debug)]
pub struct ApiSettings {
    /// Shared credential expected in `monetizzyToken`
    pub auth_token: String,
    /// Hide internal error detail from clients
    pub production: bool,
}

pub struct KeyApi;

impl KeyApi {
    pub async fn index(service: web::Data<Arc<KeyService>>) -> impl Responder {
        let stats = service.status();
        HttpResponse::Ok().json(IndexResponse {
            status: "online".to_string(),
            message: "Keygate API online".to_string(),
            total: stats.total,
            used: stats.used,
            available: stats.available,
            timestamp: chrono::Utc::now(),
            endpoints: endpoint_list(),
        })
    }

    pub async fn status(service: web::Data<Arc<KeyService>>) -> impl Responder {
        let stats = service.status();
        HttpResponse::Ok().json(StatusResponse {
            total: stats.total,
            used: stats.used,
            available: stats.available,
            timestamp: chrono::Utc::now(),
        })
    }

    /// `POST /gerar`
    pub async fn issue(
        body: web::Json<IssueKeyRequest>,
        service: web::Data<Arc<KeyService>>,
        settings: web::Data<ApiSettings>,
    ) -> HttpResponse {
        let request = body.into_inner();

        let Some(token) = non_empty(request.monetizzy_token.as_deref()) else {
            return issue_error(
                &KeygateError::validation("Token Monetizzy é obrigatório"),
                settings.production,
            );
        };
        let Some(link) = non_empty(request.link.as_deref()) else {
            return issue_error(
                &KeygateError::validation("Link é obrigatório"),
                settings.production,
            );
        };

        if settings.auth_token.is_empty() || !constant_time_eq(token, &settings.auth_token) {
            warn!("Issuance rejected: token mismatch");
            return issue_error(
                &KeygateError::auth("Token Monetizzy inválido"),
                settings.production,
            );
        }

        match service.create_key(link).await {
            Ok(record) => HttpResponse::Ok().json(IssueKeyResponse {
                success: true,
                key: record.id,
                short_link: record.short_link,
                created_at: record.created_at,
            }),
            Err(e) => issue_error(&e, settings.production),
        }
    }

    /// `POST /validar`
    pub async fn redeem(
        body: web::Json<RedeemKeyRequest>,
        service: web::Data<Arc<KeyService>>,
        settings: web::Data<ApiSettings>,
    ) -> HttpResponse {
        let Some(key) = non_empty(body.key.as_deref()) else {
            return HttpResponse::BadRequest().json(RedeemKeyResponse {
                valid: false,
                message: "Chave é obrigatória".to_string(),
                used_at: None,
            });
        };

        match service.redeem(key) {
            Ok(outcome) => {
                let used_at = match &outcome {
                    Redemption::Valid { used_at } => Some(*used_at),
                    _ => None,
                };
                HttpResponse::Ok().json(RedeemKeyResponse {
                    valid: outcome.is_valid(),
                    message: outcome.message().to_string(),
                    used_at,
                })
            }
            Err(e) => {
                if e.is_internal() {
                    error!("Redemption failed: {}", e);
                }
                HttpResponse::build(status_of(&e)).json(RedeemKeyResponse {
                    valid: false,
                    message: client_message(&e, settings.production),
                    used_at: None,
                })
            }
        }
    }

    pub async fn not_found(req: HttpRequest) -> HttpResponse {
        trace!("No route for {} {}", req.method(), req.path());
        HttpResponse::NotFound().json(NotFoundResponse {
            success: false,
            error: "Endpoint não encontrado".to_string(),
            available_endpoints: endpoint_list(),
        })
    }
}

/// Key routes
///
/// A known path hit with the wrong method is answered like an unknown path.
pub fn key_routes() -> actix_web::Scope {
    web::scope("")
        .service(
            web::resource("/")
                .route(web::get().to(KeyApi::index))
                .default_service(web::to(KeyApi::not_found)),
        )
        .service(
            web::resource("/status")
                .route(web::get().to(KeyApi::status))
                .default_service(web::to(KeyApi::not_found)),
        )
        .service(
            web::resource("/gerar")
                .route(web::post().to(KeyApi::issue))
                .default_service(web::to(KeyApi::not_found)),
        )
        .service(
            web::resource("/validar")
                .route(web::post().to(KeyApi::redeem))
                .default_service(web::to(KeyApi::not_found)),
        )
}

/// JSON extractor config: bounded body, malformed or oversized bodies
/// answered in the API's own error shape.
pub fn json_config(max_body_size: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(max_body_size)
        .error_handler(|err, _req| {
            let (status, message, code) = match &err {
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Corpo da requisição muito grande",
                    PAYLOAD_TOO_LARGE_CODE,
                ),
                _ => (
                    StatusCode::BAD_REQUEST,
                    "Corpo da requisição inválido",
                    KeygateError::validation("").code(),
                ),
            };
            trace!("Rejected request body: {}", err);
            let response = HttpResponse::build(status).json(ErrorResponse {
                success: false,
                error: message.to_string(),
                code: code.to_string(),
            });
            InternalError::from_response(err, response).into()
        })
}

fn issue_error(err: &KeygateError, production: bool) -> HttpResponse {
    if err.is_internal() {
        error!("Issuance failed: {}", err);
    }
    HttpResponse::build(status_of(err)).json(ErrorResponse {
        success: false,
        error: client_message(err, production),
        code: err.code().to_string(),
    })
}

fn status_of(err: &KeygateError) -> StatusCode {
    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn client_message(err: &KeygateError, production: bool) -> String {
    match err {
        KeygateError::Storage(_) if production => GENERIC_INTERNAL_MESSAGE.to_string(),
        KeygateError::Gateway(_) if production => GENERIC_GATEWAY_MESSAGE.to_string(),
        _ => err.message().to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn endpoint_list() -> Vec<String> {
    AVAILABLE_ENDPOINTS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_internal_detail_in_production() {
        let err = KeygateError::storage("disk full at /var/lib/keys.json");
        assert_eq!(client_message(&err, true), GENERIC_INTERNAL_MESSAGE);
        assert!(client_message(&err, false).contains("disk full"));
    }

    #[test]
    fn test_client_message_keeps_user_errors() {
        let err = KeygateError::validation("Link é obrigatório");
        assert_eq!(client_message(&err, true), "Link é obrigatório");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(&KeygateError::gateway_timeout("t")), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(status_of(&KeygateError::gateway_auth("a")), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(&KeygateError::auth("a")), StatusCode::FORBIDDEN);
        assert_eq!(status_of(&KeygateError::storage("s")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty(Some("  abc ")), Some("abc"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }
}
