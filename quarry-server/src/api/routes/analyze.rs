//! Video analysis route: URL in, downloadable-format catalog out.

use axum::{Json, Router, extract::State, routing::post};
use tracing::debug;
use url::Url;
use ytdlp_bridge::{ExtractorError, VideoCatalog, normalize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::AnalyzeRequest;
use crate::api::server::AppState;

/// Create the analyze router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(analyze))
}

/// Analyze a video URL and return its downloadable-format catalog.
///
/// Provisioning completes (success or definitive failure) before the engine
/// is ever invoked; one provisioning check and one extraction attempt per
/// request, no internal retries.
async fn analyze(State(state): State<AppState>, body: String) -> ApiResult<Json<VideoCatalog>> {
    let request = decode_request(&body)?;
    let url = validate_url(&request.url)?;

    state
        .engine
        .ensure_ready()
        .await
        .map_err(ExtractorError::EngineInit)?;

    let raw = state.extractor.fetch_metadata(url.as_str()).await?;
    let catalog = normalize(&raw);
    debug!(url = %url, formats = catalog.formats.len(), "catalog built");

    Ok(Json(catalog))
}

/// The upstream client sends either a JSON object or that object encoded
/// once more as a JSON string; accept both.
fn decode_request(body: &str) -> Result<AnalyzeRequest, ApiError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|_| ApiError::bad_request("Request body must be JSON"))?;

    let value = match value {
        serde_json::Value::String(inner) => serde_json::from_str(&inner)
            .map_err(|_| ApiError::bad_request("Request body must be JSON"))?,
        other => other,
    };

    serde_json::from_value(value)
        .map_err(|_| ApiError::bad_request("Field 'url' is required"))
}

fn validate_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw)
        .map_err(|_| ApiError::from(ExtractorError::InvalidUrl(raw.to_string())))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ApiError::from(ExtractorError::InvalidUrl(raw.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::routes;
    use crate::config::EngineConfig;

    #[test]
    fn test_decode_plain_json_body() {
        let request = decode_request(r#"{"url":"https://example.com/v"}"#).unwrap();
        assert_eq!(request.url, "https://example.com/v");
    }

    #[test]
    fn test_decode_double_encoded_body() {
        let request = decode_request(r#""{\"url\":\"https://example.com/v\"}""#).unwrap();
        assert_eq!(request.url, "https://example.com/v");
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(decode_request("url=https://example.com").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_url() {
        assert!(decode_request(r#"{"link":"https://example.com/v"}"#).is_err());
    }

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        assert!(validate_url("http://example.com/v").is_ok());
        assert!(validate_url("https://example.com/v").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_other_schemes() {
        assert!(validate_url("ftp://example.com/v").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("not a url").is_err());
    }

    fn test_app() -> Router {
        routes::create_router(AppState::new(&EngineConfig::default()))
    }

    #[tokio::test]
    async fn test_non_post_is_method_not_allowed() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/analyze")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_http_url_is_bad_request() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"url":"rtmp://example.com/live"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
