//! Wire-level records for the freight API.
//!
//! Every payload crossing the HTTP boundary has an explicit shape here and
//! is parsed into it before anything else touches the data. The records are
//! owned by the backend; the client only displays and forwards them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== Analytics snapshot =====

/// Aggregate read-only snapshot rendered by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreightSummary {
    pub timestamp: DateTime<Utc>,
    pub total_records: u64,
    pub metrics: SummaryMetrics,
    pub date_range: DateRange,
    pub top_clients: Vec<TopClient>,
    pub top_routes: Vec<TopRoute>,
    pub payment_methods: Vec<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_value: f64,
    pub total_weight: f64,
    pub total_volume: f64,
    pub avg_value: f64,
    pub avg_weight: f64,
    pub avg_volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
    pub days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopClient {
    pub name: String,
    pub order_count: u64,
    pub total_value: f64,
    pub avg_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopRoute {
    pub route: String,
    pub frequency: u64,
    pub total_value: f64,
    pub avg_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub method: String,
    pub count: u64,
    /// Share of all orders, 0-100. Rendered as provided, never recomputed.
    pub percentage: f64,
}

// ===== Chat =====

/// Anything the backend labels with an unknown role renders on the
/// assistant side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChatRole {
    User,
    Assistant,
}

impl<'de> Deserialize<'de> for ChatRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let role = String::deserialize(deserializer)?;
        Ok(match role.as_str() {
            "User" => ChatRole::User,
            _ => ChatRole::Assistant,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// 0-1, shown as a rounded percentage.
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    pub messages: Vec<ChatMessage>,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub confidence: f64,
    #[serde(default)]
    pub tokens_used: u64,
}

// ===== Stats =====

/// Compact record counters from GET /stats. Feeds the header, not the
/// dashboard body (that one comes from the summary snapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsOverview {
    pub companies: u64,
    pub freight_orders: u64,
    #[serde(default)]
    pub timesheets: u64,
    #[serde(default)]
    pub routes: u64,
    pub total_revenue: f64,
}

// ===== Companies =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanyType {
    Cliente,
    Fornecedor,
    Parceiro,
    Transportadora,
    Outros,
}

impl CompanyType {
    pub fn label(&self) -> &'static str {
        match self {
            CompanyType::Cliente => "Cliente",
            CompanyType::Fornecedor => "Fornecedor",
            CompanyType::Parceiro => "Parceiro",
            CompanyType::Transportadora => "Transportadora",
            CompanyType::Outros => "Outros",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub nome: String,
    pub nome_fantasia: Option<String>,
    pub cnpj: Option<String>,
    pub tipo: CompanyType,
    pub cidade: String,
    pub estado: String,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub ativo: bool,
}

/// Writable subset sent on create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub nome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_fantasia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    pub tipo: CompanyType,
    pub cidade: String,
    pub estado: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// ===== Freight orders =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendente",
            OrderStatus::InTransit => "Em trânsito",
            OrderStatus::Delivered => "Entregue",
            OrderStatus::Cancelled => "Cancelada",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreightOrder {
    pub id: Uuid,
    pub numero: String,
    pub data_emissao: NaiveDate,
    pub pagador_nome: String,
    pub remetente_cidade: String,
    pub destinatario_cidade: String,
    pub volumes: i32,
    pub peso: f64,
    pub valor_notas: f64,
    pub valor_frete: f64,
    pub forma_pagamento: Option<String>,
    pub status: OrderStatus,
}

impl FreightOrder {
    pub fn rota(&self) -> String {
        format!("{} → {}", self.remetente_cidade, self.destinatario_cidade)
    }
}

/// Writable subset sent on create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreightOrderDraft {
    pub numero: String,
    pub data_emissao: NaiveDate,
    pub pagador_nome: String,
    pub remetente_cidade: String,
    pub destinatario_cidade: String,
    pub volumes: i32,
    pub peso: f64,
    pub valor_notas: f64,
    pub valor_frete: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forma_pagamento: Option<String>,
}

// ===== Pagination =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

impl PageParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Query tuple fed to the HTTP layer unmodified.
    pub fn as_query(&self) -> [(&'static str, u32); 2] {
        [("page", self.page), ("per_page", self.per_page)]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Create/update acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub id: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_default_to_first_page_of_ten() {
        let params = PageParams::default();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 10);
        assert_eq!(params.as_query(), [("page", 1), ("per_page", 10)]);
    }

    #[test]
    fn explicit_page_params_pass_through() {
        let params = PageParams::new(3, 25);
        assert_eq!(params.as_query(), [("page", 3), ("per_page", 25)]);
    }

    #[test]
    fn chat_message_without_metadata_parses() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role": "User", "content": "quantos fretes?"}"#).unwrap();
        assert_eq!(msg.role, ChatRole::User);
        assert!(msg.metadata.is_none());
    }

    #[test]
    fn unknown_role_falls_back_to_assistant() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"role": "System", "content": "ok", "metadata": {"confidence": 0.85}}"#,
        )
        .unwrap();
        assert_eq!(msg.role, ChatRole::Assistant);
        assert_eq!(msg.metadata.unwrap().confidence, 0.85);
    }

    #[test]
    fn order_status_uses_snake_case_on_the_wire() {
        let status: OrderStatus = serde_json::from_str(r#""in_transit""#).unwrap();
        assert_eq!(status, OrderStatus::InTransit);
        assert_eq!(serde_json::to_string(&OrderStatus::Delivered).unwrap(), r#""delivered""#);
    }

    #[test]
    fn summary_parses_with_empty_sections() {
        let json = r#"{
            "timestamp": "2025-06-01T12:00:00Z",
            "total_records": 0,
            "metrics": {
                "total_value": 0.0, "total_weight": 0.0, "total_volume": 0.0,
                "avg_value": 0.0, "avg_weight": 0.0, "avg_volume": 0.0
            },
            "date_range": {"start": "2025-01-01", "end": "2025-06-01", "days": 151},
            "top_clients": [],
            "top_routes": [],
            "payment_methods": []
        }"#;

        let summary: FreightSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.total_records, 0);
        assert!(summary.top_routes.is_empty());
    }
}
