//! Smoke test against a deployed service
//!
//! Exercises the public and protected routes the same way an operator would
//! after a deployment, and collects the security headers that came back.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// All checks plus the security headers of the last authenticated answer
#[derive(Debug, Default)]
pub struct SmokeReport {
    pub checks: Vec<Check>,
    pub security_headers: Vec<(String, String)>,
}

impl SmokeReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    fn record(&mut self, name: &'static str, expected: StatusCode, actual: StatusCode) {
        self.checks.push(Check {
            name,
            passed: expected == actual,
            detail: format!("expected {expected}, got {actual}"),
        });
    }
}

/// Headers worth printing, matched by name fragment
const HEADER_FRAGMENTS: [&str; 5] = ["security", "transport", "content", "frame", "xss"];

/// Run every check against `base_url`
pub async fn run(
    client: &Client,
    base_url: &str,
    api_key: Option<&str>,
    message: &str,
) -> anyhow::Result<SmokeReport> {
    let base = base_url.trim_end_matches('/');
    let body = json!({ "message": message });
    let mut report = SmokeReport::default();

    let health = client.get(format!("{base}/health")).send().await?;
    report.record("health", StatusCode::OK, health.status());
    let key_required = health
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| v["security_status"]["api_key_required"].as_bool())
        .unwrap_or(true);

    let security = client.get(format!("{base}/security-test")).send().await?;
    report.record("security-test", StatusCode::OK, security.status());

    let public = client
        .post(format!("{base}/ask-public"))
        .json(&body)
        .send()
        .await?;
    report.record("ask-public", StatusCode::OK, public.status());

    let anonymous = client.post(format!("{base}/ask")).json(&body).send().await?;
    let expected = if key_required {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    report.record("ask without key", expected, anonymous.status());

    let last = match api_key {
        Some(key) => {
            let authed = client
                .post(format!("{base}/ask"))
                .header("X-API-Key", key)
                .json(&body)
                .send()
                .await?;
            report.record("ask with key", StatusCode::OK, authed.status());
            authed
        }
        None => public,
    };

    report.security_headers = last
        .headers()
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            HEADER_FRAGMENTS.iter().any(|f| name.contains(f))
        })
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode as AxumStatus},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };

    async fn fake_ask(headers: HeaderMap) -> impl IntoResponse {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some("good-key") {
            (
                AxumStatus::OK,
                [("x-frame-options", "DENY")],
                Json(json!({ "response": "Wine A" })),
            )
                .into_response()
        } else {
            AxumStatus::UNAUTHORIZED.into_response()
        }
    }

    async fn spawn() -> String {
        let router = Router::new()
            .route(
                "/health",
                get(|| async {
                    Json(json!({ "security_status": { "api_key_required": true } }))
                }),
            )
            .route("/security-test", get(|| async { Json(json!({})) }))
            .route(
                "/ask-public",
                post(|| async { Json(json!({ "response": "Wine A" })) }),
            )
            .route("/ask", post(fake_ask));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_smoke_passes_against_healthy_service() {
        let base = spawn().await;

        let report = run(&Client::new(), &base, Some("good-key"), "Which red?")
            .await
            .unwrap();

        assert_eq!(report.checks.len(), 5);
        assert!(report.all_passed(), "{:?}", report.checks);
        assert!(report
            .security_headers
            .contains(&("x-frame-options".to_string(), "DENY".to_string())));
    }

    #[tokio::test]
    async fn test_smoke_flags_rejected_key() {
        let base = spawn().await;

        let report = run(&Client::new(), &base, Some("bad-key"), "Which red?")
            .await
            .unwrap();

        assert!(!report.all_passed());
        let failed: Vec<_> = report
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name)
            .collect();
        assert_eq!(failed, vec!["ask with key"]);
    }
}
