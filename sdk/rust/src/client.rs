use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response was not JSON (status {status}): {body}")]
    Decode { status: StatusCode, body: String },
}

/// Body of `POST /api/transactions/payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub data_id: String,
    pub amount: f64,
    /// `solana` or `bsc`.
    pub blockchain: String,
}

/// Status code plus decoded JSON body. Non-2xx statuses are not errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success() && self.body["success"] != Value::Bool(false)
    }
}

pub struct BiocoinClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BiocoinClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Send `Authorization: Bearer <api_key>` on every request.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> Result<ApiResponse, SdkError> {
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        match serde_json::from_str(&text) {
            Ok(body) => Ok(ApiResponse { status, body }),
            Err(_) => Err(SdkError::Decode { status, body: text }),
        }
    }

    pub async fn health(&self) -> Result<ApiResponse, SdkError> {
        Self::send(self.get("/health")).await
    }

    pub async fn health_detailed(&self) -> Result<ApiResponse, SdkError> {
        Self::send(self.get("/health/detailed")).await
    }

    /// Pay for access to a dataset.
    pub async fn pay(&self, request: &PaymentRequest) -> Result<ApiResponse, SdkError> {
        Self::send(self.post("/api/transactions/payment").json(request)).await
    }

    /// Send an arbitrary payment body, e.g. to exercise validation.
    pub async fn pay_raw(&self, body: &Value) -> Result<ApiResponse, SdkError> {
        Self::send(self.post("/api/transactions/payment").json(body)).await
    }

    pub async fn balances(&self) -> Result<ApiResponse, SdkError> {
        Self::send(self.get("/api/transactions/balances")).await
    }

    pub async fn history(&self) -> Result<ApiResponse, SdkError> {
        Self::send(self.get("/api/transactions/history")).await
    }
}
