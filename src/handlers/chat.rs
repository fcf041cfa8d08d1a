use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use bytes::Bytes;
use reqwest::{Method, Response};
use serde_json::Value;

use crate::error::GatewayError;
use crate::middleware::GatewayAuth;
use crate::services::GatewayClient;
use crate::AppState;

pub async fn chat_completions(
    state: web::Data<AppState>,
    GatewayAuth(credentials): GatewayAuth,
    body: web::Json<Value>,
) -> Result<HttpResponse, GatewayError> {
    let stream = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
    let http = if stream {
        state.stream_http.clone()
    } else {
        state.http.clone()
    };

    let upstream = GatewayClient::new(http, credentials)
        .forward(Method::POST, "/v1/chat/completions", Some(&body.0))
        .await?;
    relay(upstream, stream).await
}

/// Copies an upstream response to the client. Successful streams are
/// passed through chunk by chunk without reframing.
pub(crate) async fn relay(upstream: Response, stream: bool) -> Result<HttpResponse, GatewayError> {
    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "upstream returned an error");
    }

    if stream && status.is_success() {
        return Ok(HttpResponse::build(status)
            .insert_header((CONTENT_TYPE, content_type))
            .insert_header((CACHE_CONTROL, "no-cache"))
            .streaming(upstream.bytes_stream()));
    }

    let body: Bytes = upstream.bytes().await?;
    Ok(HttpResponse::build(status)
        .insert_header((CONTENT_TYPE, content_type))
        .body(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::{app_state, auth_headers};
    use crate::routes::api;
    use actix_web::{test, App};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[actix_web::test]
    async fn forwards_body_verbatim() {
        let server = MockServer::start().await;
        let request = json!({"model": "gpt-4o", "messages": [{"role": "user", "content": "hi"}]});
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_json(request.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "chatcmpl-1"})))
            .mount(&server)
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(api::config()),
        )
        .await;
        let req = auth_headers(test::TestRequest::post().uri("/api/chat/completions"), &server.uri())
            .set_json(&request)
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["id"], "chatcmpl-1");
    }

    #[actix_web::test]
    async fn relays_event_stream_unchanged() {
        let server = MockServer::start().await;
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\ndata: [DONE]\n\n";
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse.as_bytes().to_vec(), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(api::config()),
        )
        .await;
        let req = auth_headers(test::TestRequest::post().uri("/api/chat/completions"), &server.uri())
            .set_json(json!({"model": "gpt-4o", "stream": true, "messages": []}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap(),
            "text/event-stream"
        );
        let body = test::read_body(resp).await;
        assert_eq!(body, Bytes::from(sse));
    }

    #[actix_web::test]
    async fn upstream_errors_keep_their_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": "slow down"})))
            .mount(&server)
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(api::config()),
        )
        .await;
        let req = auth_headers(test::TestRequest::post().uri("/api/chat/completions"), &server.uri())
            .set_json(json!({"model": "gpt-4o", "messages": []}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[actix_web::test]
    async fn missing_authorization_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(api::config()),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/chat/completions")
            .set_json(json!({"messages": []}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
