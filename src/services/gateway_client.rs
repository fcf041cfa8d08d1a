use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::error::Result;

/// Caller-supplied access to the upstream gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub endpoint: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into().trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }
}

/// Status and body of an upstream reply. Bodies that are not JSON are kept
/// as a JSON string holding the raw text.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    async fn read(response: Response) -> Result<Self> {
        let status = response.status();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(Self { status, body })
    }
}

#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    credentials: Credentials,
}

impl GatewayClient {
    pub fn new(http: Client, credentials: Credentials) -> Self {
        Self { http, credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub async fn post_json(&self, url: &str, body: &Value) -> Result<UpstreamReply> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.credentials.api_key)
            .json(body)
            .send()
            .await?;
        UpstreamReply::read(response).await
    }

    pub async fn get_json(&self, url: &str, timeout: Option<Duration>) -> Result<UpstreamReply> {
        let mut request = self.http.get(url).bearer_auth(&self.credentials.api_key);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        UpstreamReply::read(request.send().await?).await
    }

    /// Sends `body` to `path` under the endpoint and hands back the raw
    /// response, for relays that stream or re-shape it themselves.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        let mut request = self
            .http
            .request(method, self.credentials.url(path))
            .bearer_auth(&self.credentials.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn credentials_trim_trailing_slash() {
        let credentials = Credentials::new("k", "https://api.example.com/ ");
        assert_eq!(
            credentials.url("/v1/models"),
            "https://api.example.com/v1/models"
        );
    }

    #[tokio::test]
    async fn non_json_bodies_are_kept_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plain"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = GatewayClient::new(Client::new(), Credentials::new("secret", server.uri()));
        let reply = client
            .get_json(&format!("{}/plain", server.uri()), None)
            .await
            .unwrap();
        assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
        assert_eq!(reply.body, json!("bad gateway"));
    }
}
