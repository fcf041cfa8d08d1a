use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::middleware::credentials_from;
use crate::models::{DetectionMethod, ModelConfigEntry, ProviderFamily};
use crate::AppState;

const MJ_FALLBACK: &[&str] = &["mj", "midjourney", "mj-api"];
const HL_FALLBACK: &[&str] = &["hailuo", "minimax", "hl"];
const KL_FALLBACK: &[&str] = &["kling", "klingai", "kl"];

#[derive(Debug, Serialize)]
pub struct EndpointSuggestions {
    pub mj: Vec<String>,
    pub hl: Vec<String>,
    pub kl: Vec<String>,
    pub detected: bool,
}

#[derive(Debug, Serialize)]
pub struct HlEndpointSuggestions {
    pub endpoints: Vec<String>,
    pub detected: bool,
}

/// Recovers the account path segment from a detected endpoint, e.g.
/// `/v1/ai/acct42/hailuo/video/generate` → `acct42`.
fn path_segment(provider: ProviderFamily, endpoint: &str) -> Option<String> {
    let endpoint = endpoint.trim();
    let segment = match provider {
        ProviderFamily::Mj => endpoint.strip_suffix("/tob/diffusion")?,
        ProviderFamily::Hl => {
            let rest = endpoint.strip_suffix("/hailuo/video/generate")?;
            rest.strip_prefix("/v1/ai").unwrap_or(rest)
        }
        ProviderFamily::Kl => &endpoint[..endpoint.find("/v1/videos")?],
        _ => return None,
    };
    let segment = segment.trim_matches('/');
    (!segment.is_empty()).then(|| segment.to_string())
}

fn suggestions(
    state: &AppState,
    entry: Option<&ModelConfigEntry>,
    provider: ProviderFamily,
    fallback: &[&str],
) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    if let Some(entry) = entry {
        for (model_id, config) in &entry.model_configs {
            if !config.kind.is_media() || state.registry.resolve(model_id).provider != provider {
                continue;
            }
            if let Some(segment) = path_segment(provider, &config.endpoint) {
                if !paths.contains(&segment) {
                    paths.push(segment);
                }
            }
        }
    }
    for path in fallback {
        if !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    }
    paths
}

async fn detected_entry(state: &AppState, http_req: &HttpRequest) -> Option<ModelConfigEntry> {
    let credentials = credentials_from(http_req).ok()?;
    let entry = state.model_configs.get(&credentials).await;
    (entry.detection_method != DetectionMethod::Static).then_some(entry)
}

pub async fn endpoints(state: web::Data<AppState>, http_req: HttpRequest) -> HttpResponse {
    let entry = detected_entry(&state, &http_req).await;
    HttpResponse::Ok().json(EndpointSuggestions {
        mj: suggestions(&state, entry.as_ref(), ProviderFamily::Mj, MJ_FALLBACK),
        hl: suggestions(&state, entry.as_ref(), ProviderFamily::Hl, HL_FALLBACK),
        kl: suggestions(&state, entry.as_ref(), ProviderFamily::Kl, KL_FALLBACK),
        detected: entry.is_some(),
    })
}

pub async fn hl_endpoints(state: web::Data<AppState>, http_req: HttpRequest) -> HttpResponse {
    let entry = detected_entry(&state, &http_req).await;
    HttpResponse::Ok().json(HlEndpointSuggestions {
        endpoints: suggestions(&state, entry.as_ref(), ProviderFamily::Hl, HL_FALLBACK),
        detected: entry.is_some(),
    })
}
