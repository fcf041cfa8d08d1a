use reqwest::Url;

use crate::error::{GatewayError, Result};

/// Base URL for a provider path: an absolute `http(s)` path is used as is,
/// anything else is nested under `endpoint` behind `prefix`.
pub fn provider_base(endpoint: &str, prefix: &str, provider_path: &str) -> String {
    let path = provider_path.trim().trim_matches('/');
    if is_absolute(provider_path.trim()) {
        return provider_path.trim().trim_end_matches('/').to_string();
    }
    let mut base = endpoint.trim().trim_end_matches('/').to_string();
    for segment in [prefix.trim_matches('/'), path] {
        if !segment.is_empty() {
            base.push('/');
            base.push_str(segment);
        }
    }
    base
}

pub fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

fn parse(base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| GatewayError::InvalidRequest(format!("invalid endpoint {base}: {e}")))
}

/// Appends percent-encoded path segments to `base`.
pub fn join_segments(base: &str, segments: &[&str]) -> Result<String> {
    let mut url = parse(base)?;
    url.path_segments_mut()
        .map_err(|_| GatewayError::InvalidRequest(format!("invalid endpoint {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}

/// Adds a single percent-encoded query pair to `base`.
pub fn with_query(base: &str, key: &str, value: &str) -> Result<String> {
    let mut url = parse(base)?;
    url.query_pairs_mut().append_pair(key, value);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://api.example.com/", "", "mj-path", "https://api.example.com/mj-path")]
    #[case("https://api.example.com", "v1/ai", "/hl123/", "https://api.example.com/v1/ai/hl123")]
    #[case("https://api.example.com", "v1/ai", "https://hl.example.com/x/", "https://hl.example.com/x")]
    #[case("https://api.example.com", "", "", "https://api.example.com")]
    fn builds_provider_base(
        #[case] endpoint: &str,
        #[case] prefix: &str,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(provider_base(endpoint, prefix, path), expected);
    }

    #[rstest]
    #[case("http://h/v1/models", "black-forest-labs/flux", "http://h/v1/models/black-forest-labs%2Fflux")]
    #[case("http://h/tob/job/", "j 1", "http://h/tob/job/j%201")]
    #[case("http://h/v1/videos/text2video", "k1", "http://h/v1/videos/text2video/k1")]
    fn encodes_path_segments(#[case] base: &str, #[case] segment: &str, #[case] expected: &str) {
        assert_eq!(join_segments(base, &[segment]).unwrap(), expected);
    }

    #[test]
    fn encodes_query_values() {
        assert_eq!(
            with_query("http://h/hailuo/file/retrieve", "fileId", "f1&x=2").unwrap(),
            "http://h/hailuo/file/retrieve?fileId=f1%26x%3D2"
        );
    }

    #[test]
    fn rejects_relative_endpoints() {
        assert!(join_segments("not a url", &["x"]).is_err());
    }
}
