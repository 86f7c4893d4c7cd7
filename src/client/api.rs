use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::order::Order;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("subscription failed: {0}")]
    Subscription(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("protocol encode: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Snapshot read of one order. `Ok(None)` is the server's definite not-found
/// signal; transport and server failures stay errors so callers can tell a
/// stale id from a flaky network.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn fetch_order(&self, id: &str) -> Result<Option<Order>, ClientError>;
}

pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpApi {
    /// `base_url` like `http://localhost:5000`, trailing slashes tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl OrderApi for HttpApi {
    async fn fetch_order(&self, id: &str) -> Result<Option<Order>, ClientError> {
        let url = format!("{}/api/orders/{}", self.base_url, id.trim());
        let response = self.http.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(response.error_for_status()?.json().await?))
    }
}
