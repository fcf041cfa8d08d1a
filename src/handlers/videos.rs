use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::error::GatewayError;
use crate::handlers::tasks::{invalid, run_task};
use crate::middleware::{required_header, GatewayAuth, HL_PATH_HEADER, KL_PATH_HEADER};
use crate::models::{GenerationRequest, VideoRequest};
use crate::services::providers::{HlAdapter, KlAdapter};
use crate::AppState;

pub async fn hl_generate(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    GatewayAuth(credentials): GatewayAuth,
    req: web::Json<VideoRequest>,
) -> Result<HttpResponse, GatewayError> {
    if let Err(e) = req.validate() {
        return Ok(invalid(e));
    }
    let hl_path = required_header(&http_req, HL_PATH_HEADER)?;

    // Only text-to-video is wired up for this provider
    if !req.model.to_lowercase().contains("t2v") {
        return Err(GatewayError::UnsupportedModel(format!(
            "{} (only t2v models are supported)",
            req.model
        )));
    }
    if req.prompt.as_deref().map_or(true, |p| p.trim().is_empty()) {
        return Err(GatewayError::InvalidRequest("prompt is required".to_string()));
    }

    let request = GenerationRequest::from_video(req.into_inner(), hl_path);
    run_task(&state, &HlAdapter, credentials, request).await
}

pub async fn kl_generate(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    GatewayAuth(credentials): GatewayAuth,
    req: web::Json<VideoRequest>,
) -> Result<HttpResponse, GatewayError> {
    if let Err(e) = req.validate() {
        return Ok(invalid(e));
    }
    let kl_path = required_header(&http_req, KL_PATH_HEADER)?;

    let request = GenerationRequest::from_video(req.into_inner(), kl_path);
    if request.prompt.is_none() && request.image.is_none() {
        return Err(GatewayError::InvalidRequest(
            "either prompt or image is required".to_string(),
        ));
    }
    run_task(&state, &KlAdapter, credentials, request).await
}

#[cfg(test)]
mod tests {
    use crate::handlers::tests::{app_state, auth_headers};
    use crate::middleware::{HL_PATH_HEADER, KL_PATH_HEADER};
    use crate::routes::api;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use rstest::rstest;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[actix_web::test]
    async fn hl_route_resolves_media_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/ai/hl-acct/hailuo/video/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "t1"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/ai/hl-acct/hailuo/video/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Processing"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/ai/hl-acct/hailuo/video/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS", "fileId": "f1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/ai/hl-acct/hailuo/file/retrieve"))
            .and(query_param("fileId", "f1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"mediaUrl": "http://x/v.mp4"})),
            )
            .mount(&server)
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(api::config()),
        )
        .await;
        let req = auth_headers(test::TestRequest::post().uri("/api/videos/hl"), &server.uri())
            .insert_header((HL_PATH_HEADER, "hl-acct"))
            .set_json(json!({"model": "video-01-t2v", "prompt": "a whale"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["data"],
            json!([{"url": "http://x/v.mp4", "revised_prompt": "a whale"}])
        );
    }

    #[rstest]
    #[case("video-01-i2v")]
    #[case("hl_video_i2v")]
    #[case("MiniMax-Hailuo-02")]
    #[case("video-01")]
    #[actix_web::test]
    async fn hl_rejects_non_t2v_models(#[case] model: &str) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(api::config()),
        )
        .await;
        let req = auth_headers(test::TestRequest::post().uri("/api/videos/hl"), "http://127.0.0.1:9")
            .insert_header((HL_PATH_HEADER, "hl-acct"))
            .set_json(json!({"model": model, "prompt": "a whale"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn kl_route_uses_text2video_without_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/kl/v1/videos/text2video"))
            .and(body_json(json!({"model_name": "kling-v1", "prompt": "rain"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"task_id": "k1"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/kl/v1/videos/text2video/k1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {
                "task_status": "succeed",
                "task_result": {"videos": [{"url": "http://x/v2.mp4"}]}
            }})))
            .mount(&server)
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(api::config()),
        )
        .await;
        let req = auth_headers(test::TestRequest::post().uri("/api/videos/kl"), &server.uri())
            .insert_header((KL_PATH_HEADER, "kl"))
            .set_json(json!({"model": "kling-v1", "prompt": "rain"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["url"], "http://x/v2.mp4");
    }

    #[actix_web::test]
    async fn kl_timeout_surfaces_as_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/kl/v1/videos/text2video"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"task_id": "k9"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/kl/v1/videos/text2video/k9"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"task_status": "processing"}})),
            )
            .expect(5)
            .mount(&server)
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(api::config()),
        )
        .await;
        let req = auth_headers(test::TestRequest::post().uri("/api/videos/kl"), &server.uri())
            .insert_header((KL_PATH_HEADER, "kl"))
            .set_json(json!({"model": "kling-v1", "prompt": "rain"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn kl_needs_prompt_or_image() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(api::config()),
        )
        .await;
        let req = auth_headers(test::TestRequest::post().uri("/api/videos/kl"), "http://127.0.0.1:9")
            .insert_header((KL_PATH_HEADER, "kl"))
            .set_json(json!({"model": "kling-v1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
