use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::error::{GatewayError, Result};
use crate::services::Credentials;
use crate::AppState;

pub const API_ENDPOINT_HEADER: &str = "X-API-Endpoint";
pub const MJ_PATH_HEADER: &str = "X-MJ-Endpoint-Path";
pub const HL_PATH_HEADER: &str = "X-HL-Endpoint-Path";
pub const KL_PATH_HEADER: &str = "X-KL-Endpoint-Path";

/// Upstream credentials carried by request headers: `Authorization:
/// Bearer <key>` plus `X-API-Endpoint`, which falls back to the configured
/// default endpoint.
pub struct GatewayAuth(pub Credentials);

impl FromRequest for GatewayAuth {
    type Error = GatewayError;
    type Future = Ready<Result<Self>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(credentials_from(req).map(GatewayAuth))
    }
}

pub fn credentials_from(req: &HttpRequest) -> Result<Credentials> {
    let api_key = header_value(req, AUTHORIZATION.as_str())
        .map(|value| strip_bearer(&value).to_string())
        .filter(|key| !key.is_empty())
        .ok_or(GatewayError::MissingHeader("Authorization"))?;

    let endpoint = header_value(req, API_ENDPOINT_HEADER)
        .or_else(|| {
            req.app_data::<web::Data<AppState>>()
                .and_then(|state| state.config.gateway.default_endpoint.clone())
        })
        .ok_or(GatewayError::MissingHeader(API_ENDPOINT_HEADER))?;

    Ok(Credentials::new(api_key, endpoint))
}

pub fn required_header(req: &HttpRequest, name: &'static str) -> Result<String> {
    header_value(req, name).ok_or(GatewayError::MissingHeader(name))
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn strip_bearer(value: &str) -> &str {
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_bearer_key_and_endpoint() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer sk-123"))
            .insert_header((API_ENDPOINT_HEADER, "https://maas.example.com/"))
            .to_http_request();
        let credentials = credentials_from(&req).unwrap();
        assert_eq!(credentials.api_key, "sk-123");
        assert_eq!(credentials.endpoint, "https://maas.example.com");
    }

    #[test]
    fn missing_headers_are_named() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            credentials_from(&req),
            Err(GatewayError::MissingHeader("Authorization"))
        ));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer sk-123"))
            .to_http_request();
        assert!(matches!(
            credentials_from(&req),
            Err(GatewayError::MissingHeader(API_ENDPOINT_HEADER))
        ));
        assert!(required_header(&req, MJ_PATH_HEADER).is_err());
    }

    #[test]
    fn raw_keys_are_accepted() {
        assert_eq!(strip_bearer("sk-raw"), "sk-raw");
        assert_eq!(strip_bearer("bearer  sk-1"), "sk-1");
    }
}
