//! Link-shortener gateway
//!
//! One outbound POST per issuance. The blocking `ureq` call runs on the
//! blocking pool and is bounded by the agent's global timeout. No retries:
//! a retried request could mint a second short link for the same issuance.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};
use ureq::Agent;

use crate::config::GatewayConfig;
use crate::errors::{KeygateError, Result};

/// Response fields that may carry the shortened URL, in lookup order.
const SHORT_LINK_FIELDS: &[&str] = &["shortLink", "shortUrl", "short_url", "link"];

#[async_trait]
pub trait LinkShortener: Send + Sync {
    /// Shorten `original_link`, returning the external short URL.
    async fn shorten(&self, original_link: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// HTTP client for the Monetizzy shortener API.
#[derive(Clone)]
pub struct MonetizzyGateway {
    agent: Agent,
    api_url: String,
    api_token: String,
    domain: String,
    link_type: String,
}

impl MonetizzyGateway {
    pub fn new(config: &GatewayConfig, api_token: &str) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            api_url: config.api_url.clone(),
            api_token: api_token.to_string(),
            domain: config.domain.clone(),
            link_type: config.link_type.clone(),
        }
    }

    fn shorten_blocking(&self, original_link: &str) -> Result<String> {
        let payload = json!({
            "url": original_link,
            "domain": self.domain,
            "type": self.link_type,
        });

        let resp = self
            .agent
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Accept", "application/json")
            .send_json(&payload)
            .map_err(map_transport_error)?;

        let body: Value = resp.into_body().read_json().map_err(|e| {
            warn!("Shortener response from {} parse failed: {}", self.api_url, e);
            map_transport_error(e)
        })?;

        parse_short_link(&body)
    }
}

#[async_trait]
impl LinkShortener for MonetizzyGateway {
    async fn shorten(&self, original_link: &str) -> Result<String> {
        let this = self.clone();
        let link = original_link.to_string();

        let short_link = tokio::task::spawn_blocking(move || this.shorten_blocking(&link))
            .await
            .map_err(|e| {
                warn!("Shortener spawn_blocking failed: {}", e);
                KeygateError::gateway("falha ao contatar o encurtador")
            })??;

        debug!("Shortener returned {}", short_link);
        Ok(short_link)
    }

    fn name(&self) -> &'static str {
        "Monetizzy"
    }
}

/// Map a `ureq` failure onto the gateway error kinds.
pub fn map_transport_error(err: ureq::Error) -> KeygateError {
    match err {
        ureq::Error::Timeout(t) => {
            warn!("Shortener request timed out ({:?})", t);
            KeygateError::gateway_timeout("tempo limite do encurtador excedido")
        }
        ureq::Error::Io(ref e) if e.kind() == ErrorKind::TimedOut => {
            warn!("Shortener request timed out: {}", e);
            KeygateError::gateway_timeout("tempo limite do encurtador excedido")
        }
        ureq::Error::StatusCode(code @ (401 | 403)) => {
            warn!("Shortener rejected credentials with status {}", code);
            KeygateError::gateway_auth("token do encurtador inválido ou expirado")
        }
        ureq::Error::StatusCode(code) => {
            warn!("Shortener responded with status {}", code);
            KeygateError::gateway(format!("encurtador respondeu com status {}", code))
        }
        other => {
            warn!("Shortener request failed: {}", other);
            KeygateError::gateway(format!("falha ao contatar o encurtador: {}", other))
        }
    }
}

/// Pull the short link out of a successful response body.
///
/// Accepts the field at the top level or nested under `data`; an explicit
/// `success: false` is reported as an upstream failure.
pub fn parse_short_link(body: &Value) -> Result<String> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("sem detalhes");
        return Err(KeygateError::gateway(format!(
            "encurtador recusou o pedido: {}",
            message
        )));
    }

    let candidates = [Some(body), body.get("data")];
    candidates
        .into_iter()
        .flatten()
        .flat_map(|obj| SHORT_LINK_FIELDS.iter().filter_map(move |f| obj.get(*f)))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| KeygateError::gateway("resposta do encurtador sem link encurtado"))
}
