pub mod chat;
pub mod endpoints;
pub mod health;
pub mod images;
pub mod models;
pub mod tasks;
pub mod videos;

pub use chat::*;
pub use endpoints::*;
pub use health::*;
pub use images::*;
pub use models::*;
pub use videos::*;

#[cfg(test)]
pub(crate) mod tests {
    use actix_web::test::TestRequest;

    use crate::config::Config;
    use crate::middleware::API_ENDPOINT_HEADER;
    use crate::services::ModelRegistry;
    use crate::AppState;

    /// State with millisecond polling and short budgets.
    pub fn app_state() -> AppState {
        let mut config = Config::default();
        config.polling.interval_ms = 1;
        config.polling.mj_max_attempts = 5;
        config.polling.hl_max_attempts = 5;
        config.polling.kl_max_attempts = 5;
        AppState::new(config, ModelRegistry::with_defaults().unwrap()).unwrap()
    }

    pub fn auth_headers(req: TestRequest, endpoint: &str) -> TestRequest {
        req.insert_header(("Authorization", "Bearer sk-test"))
            .insert_header((API_ENDPOINT_HEADER, endpoint.to_string()))
    }
}
