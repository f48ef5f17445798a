use ratatui::widgets::TableState;
use uuid::Uuid;

use fretes_core::api::ApiClient;
use fretes_core::config::Config;
use fretes_core::fetch::{Mutation, Query};
use fretes_core::models::{
    ChatHistory, ChatMessage, ChatReply, ChatRole, Company, FreightOrder, FreightSummary,
    MessageMetadata, PageParams, Paginated, StatsOverview,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Chat,
    Companies,
    Orders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// A send that settled with an error, kept so `r` can resend the same
/// query without duplicating the user's transcript row.
#[derive(Debug, Clone)]
pub struct ChatFailure {
    pub query: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum DeleteTarget {
    Company { id: Uuid, nome: String },
    Order { id: Uuid, numero: String },
}

impl DeleteTarget {
    pub fn description(&self) -> String {
        match self {
            DeleteTarget::Company { nome, .. } => format!("empresa \"{nome}\""),
            DeleteTarget::Order { numero, .. } => format!("frete nº {numero}"),
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub config: Config,
    pub api: ApiClient,

    // Header counters (live /stats)
    pub stats: Query<StatsOverview>,

    // Dashboard (analytics snapshot)
    pub summary: Query<FreightSummary>,

    // Chat state
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input, in chars
    pub chat_messages: Vec<ChatMessage>,
    pub chat_history: Query<ChatHistory>,
    pub chat_send: Mutation<ChatReply>,
    pub chat_clear: Mutation<()>,
    pub chat_failure: Option<ChatFailure>,
    pending_query: Option<String>,
    pub chat_scroll: u16,
    pub chat_height: u16, // transcript area, for scroll calculations
    pub chat_width: u16,  // transcript area, for wrap calculations
    pub animation_frame: u8,

    // Companies
    pub companies: Query<Paginated<Company>>,
    pub companies_page: u32,
    pub companies_table: TableState,

    // Freight orders
    pub orders: Query<Paginated<FreightOrder>>,
    pub orders_page: u32,
    pub orders_table: TableState,

    // Delete flow, shared by both record screens
    pub delete: Mutation<()>,
    pub confirm_delete: Option<DeleteTarget>,

    // Non-chat mutation failures, shown in the footer until the next key
    pub status_error: Option<String>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let api = ApiClient::new(&config);

        Self {
            should_quit: false,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            config,
            api,

            stats: Query::new(),
            summary: Query::new(),

            chat_input: String::new(),
            chat_cursor: 0,
            chat_messages: Vec::new(),
            chat_history: Query::new(),
            chat_send: Mutation::new(),
            chat_clear: Mutation::new(),
            chat_failure: None,
            pending_query: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,

            companies: Query::new(),
            companies_page: 1,
            companies_table: TableState::default(),

            orders: Query::new(),
            orders_page: 1,
            orders_table: TableState::default(),

            delete: Mutation::new(),
            confirm_delete: None,

            status_error: None,
        }
    }

    /// Initial fetches for the screen shown at startup.
    pub fn bootstrap(&mut self) {
        self.load_summary();
        self.load_stats();
    }

    /// Switch screens: abort the old screen's in-flight load, kick off the
    /// new screen's fetches if nothing is cached.
    pub fn enter_screen(&mut self, screen: Screen) {
        if screen == self.screen {
            return;
        }

        match self.screen {
            Screen::Dashboard => self.summary.abort(),
            Screen::Chat => self.chat_history.abort(),
            Screen::Companies => self.companies.abort(),
            Screen::Orders => self.orders.abort(),
        }

        self.screen = screen;
        self.input_mode = InputMode::Normal;
        self.status_error = None;

        match screen {
            Screen::Dashboard => {
                if self.summary.is_idle() {
                    self.load_summary();
                }
                if self.stats.is_idle() {
                    self.load_stats();
                }
            }
            Screen::Chat => {
                if self.chat_history.is_idle() {
                    self.load_history();
                }
            }
            Screen::Companies => {
                if self.companies.is_idle() {
                    self.load_companies();
                }
            }
            Screen::Orders => {
                if self.orders.is_idle() {
                    self.load_orders();
                }
            }
        }
    }

    // ===== Fetch wiring =====

    pub fn load_summary(&mut self) {
        let path = self.config.summary_path.clone();
        self.summary.spawn(async move { fretes_core::load_summary(&path).await });
    }

    pub fn load_stats(&mut self) {
        let api = self.api.clone();
        self.stats.spawn(async move { Ok(api.stats().await?) });
    }

    pub fn load_history(&mut self) {
        let api = self.api.clone();
        self.chat_history.spawn(async move { Ok(api.chat_history().await?) });
    }

    pub fn load_companies(&mut self) {
        let api = self.api.clone();
        let params = PageParams::new(self.companies_page, self.config.page_size);
        self.companies.spawn(async move { Ok(api.list_companies(params).await?) });
    }

    pub fn load_orders(&mut self) {
        let api = self.api.clone();
        let params = PageParams::new(self.orders_page, self.config.page_size);
        self.orders.spawn(async move { Ok(api.list_freight_orders(params).await?) });
    }

    pub fn reload_dashboard(&mut self) {
        self.summary.invalidate();
        self.stats.invalidate();
        self.load_summary();
        self.load_stats();
    }

    /// Advance every binding and apply settlements. Called on every tick.
    pub fn poll_tasks(&mut self) {
        self.stats.poll();
        self.summary.poll();
        self.companies.poll();
        self.orders.poll();
        self.chat_history.poll();

        // Adopt the fetched transcript, unless a send is mid-flight (the
        // locally appended user row would be lost).
        if !self.chat_send.is_pending() {
            if let Some(history) = self.chat_history.take_ready() {
                self.chat_messages = history.messages;
                self.scroll_chat_to_bottom();
            }
        }

        if let Some(outcome) = self.chat_send.poll_settled() {
            match outcome {
                Ok(reply) => {
                    self.pending_query = None;
                    self.chat_messages.push(ChatMessage {
                        role: ChatRole::Assistant,
                        content: reply.response,
                        metadata: Some(MessageMetadata { confidence: reply.confidence }),
                    });
                    // Server-side ordering stays authoritative: the next
                    // screen entry refetches the transcript.
                    self.chat_history.invalidate();
                }
                Err(message) => {
                    let query = self.pending_query.take().unwrap_or_default();
                    // Give the text back for editing, unless the user
                    // already typed something new.
                    if self.chat_input.is_empty() {
                        self.chat_input = query.clone();
                        self.chat_cursor = query.chars().count();
                    }
                    self.chat_failure = Some(ChatFailure { query, message });
                }
            }
            self.scroll_chat_to_bottom();
        }

        if let Some(outcome) = self.chat_clear.poll_settled() {
            match outcome {
                Ok(()) => {
                    self.chat_messages.clear();
                    self.chat_scroll = 0;
                    self.chat_history.invalidate();
                }
                Err(message) => self.status_error = Some(message),
            }
        }

        if let Some(outcome) = self.delete.poll_settled() {
            match outcome {
                Ok(()) => match self.screen {
                    Screen::Companies => {
                        self.companies.invalidate();
                        self.load_companies();
                    }
                    Screen::Orders => {
                        self.orders.invalidate();
                        self.load_orders();
                    }
                    _ => {}
                },
                Err(message) => self.status_error = Some(message),
            }
        }
    }

    // ===== Chat =====

    /// Submit is accepted iff the trimmed input is non-empty and no send is
    /// pending.
    pub fn chat_can_submit(&self) -> bool {
        !self.chat_input.trim().is_empty() && !self.chat_send.is_pending()
    }

    pub fn submit_chat(&mut self) {
        if !self.chat_can_submit() {
            return;
        }

        let query = self.chat_input.trim().to_string();
        self.chat_failure = None;
        self.chat_messages.push(ChatMessage {
            role: ChatRole::User,
            content: query.clone(),
            metadata: None,
        });
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.send_chat(query);
        self.scroll_chat_to_bottom();
    }

    /// Resend the query from a failed send, without a new transcript row.
    pub fn retry_chat(&mut self) {
        if self.chat_send.is_pending() {
            return;
        }
        if let Some(failure) = self.chat_failure.take() {
            if self.chat_input == failure.query {
                self.chat_input.clear();
                self.chat_cursor = 0;
            }
            self.send_chat(failure.query);
            self.scroll_chat_to_bottom();
        }
    }

    fn send_chat(&mut self, query: String) {
        let api = self.api.clone();
        self.pending_query = Some(query.clone());
        let _started = self
            .chat_send
            .submit(async move { Ok(api.send_chat_message(&query).await?) });
    }

    pub fn clear_chat(&mut self) {
        if self.chat_clear.is_pending() {
            return;
        }
        let api = self.api.clone();
        let _started = self
            .chat_clear
            .submit(async move { Ok(api.clear_chat_history().await?) });
    }

    /// Tick animation frame while a send is pending.
    pub fn tick_animation(&mut self) {
        if self.chat_send.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Keep the newest exchange (and the pending indicator) in view.
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 60 };

        let mut total_lines: u16 = 0;
        for msg in &self.chat_messages {
            total_lines += 1; // role line
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8 content
                let chars = line.chars().count();
                total_lines += if chars == 0 { 1 } else { (chars / wrap_width + 1) as u16 };
            }
            if msg.metadata.is_some() {
                total_lines += 1; // confidence line
            }
            total_lines += 1; // gap after message
        }
        if self.chat_send.is_pending() || self.chat_failure.is_some() {
            total_lines += 2;
        }

        let visible = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_scroll = total_lines.saturating_sub(visible);
    }

    // ===== Companies =====

    pub fn companies_nav_down(&mut self) {
        let len = self.companies.data().map_or(0, |page| page.data.len());
        if len > 0 {
            let i = self.companies_table.selected().unwrap_or(0);
            self.companies_table.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn companies_nav_up(&mut self) {
        let i = self.companies_table.selected().unwrap_or(0);
        self.companies_table.select(Some(i.saturating_sub(1)));
    }

    pub fn companies_next_page(&mut self) {
        let Some(page) = self.companies.data() else { return };
        if self.companies_page < page.pagination.total_pages {
            self.companies_page += 1;
            self.companies_table.select(Some(0));
            self.companies.invalidate();
            self.load_companies();
        }
    }

    pub fn companies_prev_page(&mut self) {
        if self.companies_page > 1 && self.companies.data().is_some() {
            self.companies_page -= 1;
            self.companies_table.select(Some(0));
            self.companies.invalidate();
            self.load_companies();
        }
    }

    pub fn selected_company(&self) -> Option<&Company> {
        let i = self.companies_table.selected()?;
        self.companies.data()?.data.get(i)
    }

    // ===== Freight orders =====

    pub fn orders_nav_down(&mut self) {
        let len = self.orders.data().map_or(0, |page| page.data.len());
        if len > 0 {
            let i = self.orders_table.selected().unwrap_or(0);
            self.orders_table.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn orders_nav_up(&mut self) {
        let i = self.orders_table.selected().unwrap_or(0);
        self.orders_table.select(Some(i.saturating_sub(1)));
    }

    pub fn orders_next_page(&mut self) {
        let Some(page) = self.orders.data() else { return };
        if self.orders_page < page.pagination.total_pages {
            self.orders_page += 1;
            self.orders_table.select(Some(0));
            self.orders.invalidate();
            self.load_orders();
        }
    }

    pub fn orders_prev_page(&mut self) {
        if self.orders_page > 1 && self.orders.data().is_some() {
            self.orders_page -= 1;
            self.orders_table.select(Some(0));
            self.orders.invalidate();
            self.load_orders();
        }
    }

    pub fn selected_order(&self) -> Option<&FreightOrder> {
        let i = self.orders_table.selected()?;
        self.orders.data()?.data.get(i)
    }

    // ===== Delete flow =====

    pub fn request_delete(&mut self) {
        self.confirm_delete = match self.screen {
            Screen::Companies => self
                .selected_company()
                .map(|c| DeleteTarget::Company { id: c.id, nome: c.nome.clone() }),
            Screen::Orders => self
                .selected_order()
                .map(|o| DeleteTarget::Order { id: o.id, numero: o.numero.clone() }),
            _ => None,
        };
    }

    pub fn confirm_pending_delete(&mut self) {
        if self.delete.is_pending() {
            self.confirm_delete = None;
            return;
        }
        let Some(target) = self.confirm_delete.take() else { return };
        let api = self.api.clone();
        let _started = match target {
            DeleteTarget::Company { id, .. } => {
                self.delete.submit(async move { Ok(api.delete_company(id).await?) })
            }
            DeleteTarget::Order { id, .. } => {
                self.delete.submit(async move { Ok(api.delete_freight_order(id).await?) })
            }
        };
    }

    pub fn cancel_pending_delete(&mut self) {
        self.confirm_delete = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_app() -> App {
        // Port 1 is never listening; sends settle quickly with a transport
        // error, which is exactly what the failure-path tests need.
        let config = Config {
            api_base_url: "http://127.0.0.1:1/api/v1".to_string(),
            ..Config::default()
        };
        App::new(config)
    }

    async fn settle_send(app: &mut App) {
        for _ in 0..200 {
            app.poll_tasks();
            if !app.chat_send.is_pending() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("chat send did not settle");
    }

    #[test]
    fn whitespace_input_is_not_submitted() {
        let mut app = test_app();
        app.chat_input = "   \t ".to_string();

        assert!(!app.chat_can_submit());
        app.submit_chat();

        assert!(app.chat_messages.is_empty());
        assert!(!app.chat_send.is_pending());
        assert_eq!(app.chat_input, "   \t ");
    }

    #[tokio::test]
    async fn submit_pushes_user_row_and_clears_input() {
        let mut app = test_app();
        app.chat_input = "  quantos fretes em maio?  ".to_string();

        app.submit_chat();

        assert_eq!(app.chat_messages.len(), 1);
        assert_eq!(app.chat_messages[0].role, ChatRole::User);
        assert_eq!(app.chat_messages[0].content, "quantos fretes em maio?");
        assert!(app.chat_input.is_empty());
        assert!(app.chat_send.is_pending());
    }

    #[tokio::test]
    async fn submit_is_refused_while_pending() {
        let mut app = test_app();
        app.chat_input = "primeira".to_string();
        app.submit_chat();

        app.chat_input = "segunda".to_string();
        assert!(!app.chat_can_submit());
        app.submit_chat();

        assert_eq!(app.chat_messages.len(), 1);
        assert_eq!(app.chat_input, "segunda");
    }

    #[tokio::test]
    async fn failed_send_surfaces_retry_with_the_same_query() {
        let mut app = test_app();
        app.chat_input = "qual o faturamento?".to_string();
        app.submit_chat();

        settle_send(&mut app).await;

        let failure = app.chat_failure.as_ref().expect("failure should be surfaced");
        assert_eq!(failure.query, "qual o faturamento?");
        assert!(!app.chat_send.is_pending());
        // The text comes back for editing
        assert_eq!(app.chat_input, "qual o faturamento?");

        // Retry resends without a duplicate user row
        app.retry_chat();
        assert!(app.chat_send.is_pending());
        assert!(app.chat_failure.is_none());
        assert_eq!(app.chat_messages.len(), 1);
        assert!(app.chat_input.is_empty());
    }

    #[tokio::test]
    async fn entering_a_screen_mounts_its_fetch_once() {
        let mut app = test_app();
        app.enter_screen(Screen::Companies);
        assert!(app.companies.is_loading());

        // Re-entering does not stack a second fetch
        app.enter_screen(Screen::Chat);
        app.enter_screen(Screen::Companies);
        assert!(app.companies.is_loading() || app.companies.error().is_some());
    }

    #[tokio::test]
    async fn delete_needs_a_selected_row() {
        let mut app = test_app();
        app.enter_screen(Screen::Companies);
        app.request_delete();
        assert!(app.confirm_delete.is_none());
    }
}
