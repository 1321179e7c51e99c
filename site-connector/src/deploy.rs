//! Pushes generated code to a site through the plugin REST endpoints.
//!
//! Input is validated before any request is built: an unknown code type or a
//! missing field never reaches the network. Transport is a single attempt with
//! a 10 second timeout; the upstream JSON is handed back verbatim.

use std::{fmt, str::FromStr, time::Duration};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{
    endpoints::{
        API_KEY_HEADER, deploy_batch_url, deploy_url, normalize_site_url, require_http_scheme,
    },
    errors::{SiteConnectorError, SiteConnectorResult, UpstreamFailure, body_value},
};

/// Timeout of a deploy request.
pub const DEPLOY_TIMEOUT: Duration = Duration::from_secs(10);

/// Kinds of code the plugin accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    Css,
    Js,
    Html,
}

impl CodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeType::Css => "css",
            CodeType::Js => "js",
            CodeType::Html => "html",
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeType {
    type Err = SiteConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "css" => Ok(CodeType::Css),
            "js" => Ok(CodeType::Js),
            "html" => Ok(CodeType::Html),
            _ => Err(SiteConnectorError::Validation(format!(
                "Invalid codeType '{s}'. Must be one of: css, js, html"
            ))),
        }
    }
}

/// One entry of a batch deployment as received from callers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployItem {
    #[serde(default)]
    pub code: String,
    #[serde(default, alias = "code_type")]
    pub code_type: String,
}

/// Validated payload item sent to the plugin.
#[derive(Debug, Serialize)]
struct DeployPayload<'a> {
    code: &'a str,
    code_type: CodeType,
}

#[derive(Debug, Serialize)]
struct BatchPayload<'a> {
    deployments: Vec<DeployPayload<'a>>,
}

/// HTTP client for the plugin deploy endpoints.
#[derive(Debug, Clone)]
pub struct DeploymentClient {
    http: Client,
}

impl DeploymentClient {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Deploys a single piece of code.
    ///
    /// # Errors
    /// - [`SiteConnectorError::Validation`] for a bad code type or missing field
    /// - [`SiteConnectorError::Deployment`] for transport failures and non-2xx answers
    pub async fn deploy_single(
        &self,
        site_url: &str,
        api_key: &str,
        code: &str,
        code_type: &str,
    ) -> SiteConnectorResult<Value> {
        let code_type: CodeType = code_type.parse()?;
        let site_url = validated_site(site_url, api_key)?;
        if code.trim().is_empty() {
            return Err(SiteConnectorError::Validation("code is required".into()));
        }

        let body = DeployPayload { code, code_type };
        info!(%site_url, %code_type, code_len = code.len(), "deploying code");
        self.post(&deploy_url(&site_url), api_key, &body).await
    }

    /// Deploys several pieces of code in one request.
    ///
    /// Every item is validated first; the site decides how partial failures
    /// are applied and reports them in its response body.
    pub async fn deploy_batch(
        &self,
        site_url: &str,
        api_key: &str,
        items: &[DeployItem],
    ) -> SiteConnectorResult<Value> {
        if items.is_empty() {
            return Err(SiteConnectorError::Validation(
                "deployments must be a non-empty array".into(),
            ));
        }

        let mut deployments = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let code_type: CodeType = item.code_type.parse().map_err(|_| {
                SiteConnectorError::Validation(format!(
                    "deployments[{i}].codeType '{}' must be one of: css, js, html",
                    item.code_type
                ))
            })?;
            if item.code.trim().is_empty() {
                return Err(SiteConnectorError::Validation(format!(
                    "deployments[{i}].code is required"
                )));
            }
            deployments.push(DeployPayload {
                code: &item.code,
                code_type,
            });
        }

        let site_url = validated_site(site_url, api_key)?;
        info!(%site_url, count = deployments.len(), "deploying code batch");
        self.post(&deploy_batch_url(&site_url), api_key, &BatchPayload { deployments })
            .await
    }

    async fn post<B: Serialize>(&self, url: &str, api_key: &str, body: &B) -> SiteConnectorResult<Value> {
        debug!(%url, "POST");

        let resp = self
            .http
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .timeout(DEPLOY_TIMEOUT)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "deploy request failed");
                SiteConnectorError::Deployment(UpstreamFailure::from_transport(&e))
            })?;

        if !resp.status().is_success() {
            let failure = UpstreamFailure::from_response(resp).await;
            error!(%url, status = ?failure.status, "deploy rejected by site");
            return Err(SiteConnectorError::Deployment(failure));
        }

        let text = resp.text().await.map_err(|e| {
            SiteConnectorError::Deployment(UpstreamFailure::from_transport(&e))
        })?;
        Ok(body_value(&text).unwrap_or(Value::Null))
    }
}

fn validated_site(site_url: &str, api_key: &str) -> SiteConnectorResult<String> {
    if site_url.trim().is_empty() || api_key.trim().is_empty() {
        return Err(SiteConnectorError::Validation(
            "Missing required parameters: siteUrl, apiKey".into(),
        ));
    }
    let site_url = normalize_site_url(site_url);
    require_http_scheme(&site_url)?;
    Ok(site_url)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::json;

    use super::*;
    use crate::test_support::spawn_stub;

    async fn counting_site(status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = hits.clone();
        let h2 = hits.clone();
        let app = Router::new()
            .route(
                "/wp-json/ai-code-deployer/v1/deploy",
                post(move |Json(body): Json<Value>| {
                    let hits = h1.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        (status, Json(json!({"id": 7, "received": body})))
                    }
                }),
            )
            .route(
                "/wp-json/ai-code-deployer/v1/deploy-batch",
                post(move |Json(body): Json<Value>| {
                    let hits = h2.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        let n = body["deployments"].as_array().map_or(0, Vec::len);
                        (status, Json(json!({"applied": n})))
                    }
                }),
            );
        (spawn_stub(app).await, hits)
    }

    #[test]
    fn code_type_parsing() {
        assert_eq!("CSS".parse::<CodeType>().unwrap(), CodeType::Css);
        assert_eq!("js".parse::<CodeType>().unwrap(), CodeType::Js);
        assert!("xml".parse::<CodeType>().is_err());
    }

    #[tokio::test]
    async fn invalid_code_type_never_hits_the_site() {
        let (url, hits) = counting_site(StatusCode::OK).await;
        let err = DeploymentClient::new(Client::new())
            .deploy_single(&url, "key", "<x/>", "xml")
            .await
            .unwrap_err();
        assert!(matches!(err, SiteConnectorError::Validation(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_deploy_returns_upstream_body() {
        let (url, hits) = counting_site(StatusCode::OK).await;
        let body = DeploymentClient::new(Client::new())
            .deploy_single(&format!("{url}/"), "key", ".a{}", "css")
            .await
            .unwrap();
        assert_eq!(body["id"], 7);
        assert_eq!(body["received"]["code_type"], "css");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_deploy_preserves_status_and_body() {
        let (url, _) = counting_site(StatusCode::UNAUTHORIZED).await;
        let err = DeploymentClient::new(Client::new())
            .deploy_single(&url, "key", ".a{}", "css")
            .await
            .unwrap_err();
        match err {
            SiteConnectorError::Deployment(f) => {
                assert_eq!(f.status, Some(401));
                assert_eq!(f.body.unwrap()["id"], 7);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn batch_is_one_request() {
        let (url, hits) = counting_site(StatusCode::OK).await;
        let items = vec![
            DeployItem {
                code: ".a{}".into(),
                code_type: "css".into(),
            },
            DeployItem {
                code: "console.log(1)".into(),
                code_type: "js".into(),
            },
        ];
        let body = DeploymentClient::new(Client::new())
            .deploy_batch(&url, "key", &items)
            .await
            .unwrap();
        assert_eq!(body["applied"], 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn batch_validates_every_item_first() {
        let (url, hits) = counting_site(StatusCode::OK).await;
        let items = vec![
            DeployItem {
                code: ".a{}".into(),
                code_type: "css".into(),
            },
            DeployItem {
                code: "x".into(),
                code_type: "php".into(),
            },
        ];
        let client = DeploymentClient::new(Client::new());
        let err = client.deploy_batch(&url, "key", &items).await.unwrap_err();
        assert!(err.to_string().contains("deployments[1]"));
        assert!(client.deploy_batch(&url, "key", &[]).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
