//! HTTP adapter for the freight API.
//!
//! One function per REST operation. Each call issues exactly one request,
//! parses the body into its typed model at the boundary, and reports
//! failures through [`ApiError`]. No retries, no caching, no auth.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{
    Ack, ChatHistory, ChatReply, Company, CompanyDraft, FreightOrder, FreightOrderDraft,
    PageParams, Paginated, StatsOverview,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response did not match the expected shape: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Non-2xx becomes `Status`; a 2xx body that does not parse becomes
    /// `Decode`. Transport failures propagate unmodified.
    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), body });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn expect_success(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::parse(response).await
    }

    // ===== Stats =====

    pub async fn stats(&self) -> Result<StatsOverview, ApiError> {
        tracing::debug!("fetching stats overview");
        self.get_json("/stats").await
    }

    // ===== Chat =====

    pub async fn send_chat_message(&self, query: &str) -> Result<ChatReply, ApiError> {
        tracing::debug!(query, "sending chat message");
        let response = self
            .client
            .post(self.url("/chat"))
            .json(&ChatRequest { query })
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn chat_history(&self) -> Result<ChatHistory, ApiError> {
        tracing::debug!("fetching chat history");
        self.get_json("/chat/history").await
    }

    pub async fn clear_chat_history(&self) -> Result<(), ApiError> {
        tracing::debug!("clearing chat history");
        let response = self.client.post(self.url("/chat/clear")).send().await?;
        Self::expect_success(response).await
    }

    // ===== Companies =====

    pub async fn list_companies(&self, params: PageParams) -> Result<Paginated<Company>, ApiError> {
        tracing::debug!(page = params.page, per_page = params.per_page, "listing companies");
        let response = self
            .client
            .get(self.url("/companies"))
            .query(&params.as_query())
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_company(&self, id: Uuid) -> Result<Company, ApiError> {
        tracing::debug!(%id, "fetching company");
        self.get_json(&format!("/companies/{id}")).await
    }

    pub async fn create_company(&self, draft: &CompanyDraft) -> Result<Ack, ApiError> {
        tracing::debug!(nome = %draft.nome, "creating company");
        let response = self
            .client
            .post(self.url("/companies"))
            .json(draft)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn update_company(&self, id: Uuid, draft: &CompanyDraft) -> Result<Ack, ApiError> {
        tracing::debug!(%id, "updating company");
        let response = self
            .client
            .put(self.url(&format!("/companies/{id}")))
            .json(draft)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn delete_company(&self, id: Uuid) -> Result<(), ApiError> {
        tracing::debug!(%id, "deleting company");
        let response = self
            .client
            .delete(self.url(&format!("/companies/{id}")))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    // ===== Freight orders =====

    pub async fn list_freight_orders(
        &self,
        params: PageParams,
    ) -> Result<Paginated<FreightOrder>, ApiError> {
        tracing::debug!(page = params.page, per_page = params.per_page, "listing freight orders");
        let response = self
            .client
            .get(self.url("/freight-orders"))
            .query(&params.as_query())
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_freight_order(&self, id: Uuid) -> Result<FreightOrder, ApiError> {
        tracing::debug!(%id, "fetching freight order");
        self.get_json(&format!("/freight-orders/{id}")).await
    }

    pub async fn create_freight_order(&self, draft: &FreightOrderDraft) -> Result<Ack, ApiError> {
        tracing::debug!(numero = %draft.numero, "creating freight order");
        let response = self
            .client
            .post(self.url("/freight-orders"))
            .json(draft)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn update_freight_order(
        &self,
        id: Uuid,
        draft: &FreightOrderDraft,
    ) -> Result<Ack, ApiError> {
        tracing::debug!(%id, "updating freight order");
        let response = self
            .client
            .put(self.url(&format!("/freight-orders/{id}")))
            .json(draft)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn delete_freight_order(&self, id: Uuid) -> Result<(), ApiError> {
        tracing::debug!(%id, "deleting freight order");
        let response = self
            .client
            .delete(self.url(&format!("/freight-orders/{id}")))
            .send()
            .await?;
        Self::expect_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_url: &str) -> ApiClient {
        let config = Config { api_base_url: base_url.to_string(), ..Config::default() };
        ApiClient::new(&config)
    }

    #[test]
    fn urls_join_base_and_path() {
        let api = client_for("http://localhost:3000/api/v1");
        assert_eq!(api.url("/stats"), "http://localhost:3000/api/v1/stats");
        assert_eq!(api.url("/chat/history"), "http://localhost:3000/api/v1/chat/history");
    }

    #[test]
    fn trailing_slash_on_base_url_is_normalized() {
        let api = client_for("http://localhost:3000/api/v1/");
        assert_eq!(api.url("/companies"), "http://localhost:3000/api/v1/companies");
    }

    #[test]
    fn decode_error_carries_the_serde_failure() {
        let err: ApiError = serde_json::from_str::<ChatHistory>("{}").unwrap_err().into();
        assert!(matches!(err, ApiError::Decode(_)));
        assert!(err.to_string().contains("expected shape"));
    }
}
