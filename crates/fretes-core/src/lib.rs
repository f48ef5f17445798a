pub mod api;
pub mod config;
pub mod fetch;
pub mod format;
pub mod models;
pub mod summary;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError};
pub use config::Config;
pub use fetch::{Mutation, Query, QueryState};
pub use models::{
    ChatHistory, ChatMessage, ChatReply, ChatRole, Company, CompanyType, FreightOrder,
    FreightSummary, MessageMetadata, OrderStatus, PageParams, Paginated, StatsOverview,
};
pub use summary::load_summary;
