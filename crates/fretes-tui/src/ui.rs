use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
};

use fretes_core::fetch::QueryState;
use fretes_core::format;
use fretes_core::models::{
    ChatMessage, ChatRole, Company, FreightOrder, FreightSummary, Paginated, TopClient, TopRoute,
};

use crate::app::{App, ChatFailure, InputMode, Screen};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Dashboard => render_dashboard(app, frame, body_area),
        Screen::Chat => render_chat(app, frame, body_area),
        Screen::Companies => render_companies(app, frame, body_area),
        Screen::Orders => render_orders(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.confirm_delete.is_some() {
        render_confirm_modal(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let counters = match app.stats.data() {
        Some(stats) => format!(
            " {} empresas · {} fretes · {} ",
            format::count(stats.companies),
            format::count(stats.freight_orders),
            format::currency(stats.total_revenue),
        ),
        None => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" Fretes — Painel Administrativo ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(counters, Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Dashboard => " PAINEL ",
        Screen::Chat => " CHAT ",
        Screen::Companies => " EMPRESAS ",
        Screen::Orders => " FRETES ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    // A failed clear/delete shows up here until the next keypress
    if let Some(error) = &app.status_error {
        let footer = Paragraph::new(Line::from(vec![
            Span::styled(mode_text, mode_style),
            Span::styled(format!(" {error} "), Style::default().bg(Color::Black).fg(Color::Red)),
        ]))
        .style(Style::default().bg(Color::Black));
        frame.render_widget(footer, area);
        return;
    }

    let mut hints = vec![
        Span::styled(" 1-4 ", key_style),
        Span::styled(" telas ", label_style),
    ];

    match (app.screen, app.input_mode) {
        (Screen::Dashboard, _) => hints.extend(vec![
            Span::styled(" r ", key_style),
            Span::styled(" recarregar ", label_style),
        ]),
        (Screen::Chat, InputMode::Normal) => {
            hints.extend(vec![
                Span::styled(" i ", key_style),
                Span::styled(" escrever ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" rolar ", label_style),
                Span::styled(" C ", key_style),
                Span::styled(" limpar ", label_style),
            ]);
            if app.chat_failure.is_some() {
                hints.extend(vec![
                    Span::styled(" r ", key_style),
                    Span::styled(" reenviar ", label_style),
                ]);
            }
        }
        (Screen::Chat, InputMode::Editing) => {
            let send_label = if app.chat_send.is_pending() { " aguardando... " } else { " enviar " };
            hints.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(send_label, label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" parar de escrever ", label_style),
            ]);
        }
        (Screen::Companies | Screen::Orders, _) => hints.extend(vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" n/p ", key_style),
            Span::styled(" página ", label_style),
            Span::styled(" d ", key_style),
            Span::styled(" excluir ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" recarregar ", label_style),
        ]),
    }

    hints.extend(vec![
        Span::styled(" q ", key_style),
        Span::styled(" sair ", label_style),
    ]);

    let footer_content = Line::from(
        vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)]
            .into_iter()
            .chain(hints)
            .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

// ===== Dashboard =====

fn render_dashboard(app: &mut App, frame: &mut Frame, area: Rect) {
    match app.summary.state() {
        QueryState::Idle | QueryState::Loading => {
            let loading = Paragraph::new("Carregando dados...")
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(loading, area);
        }
        QueryState::Failed(error) => {
            render_error_panel(frame, area, "Erro ao carregar dados", error);
        }
        QueryState::Ready(summary) => render_summary(summary, frame, area),
    }
}

fn render_summary(summary: &FreightSummary, frame: &mut Frame, area: Rect) {
    let has_routes = !summary.top_routes.is_empty();

    let constraints = if has_routes {
        vec![
            Constraint::Length(5),
            Constraint::Min(8),
            Constraint::Length(6),
            Constraint::Length(4),
        ]
    } else {
        vec![Constraint::Length(5), Constraint::Min(8), Constraint::Length(4)]
    };
    let chunks = Layout::vertical(constraints).split(area);

    render_kpi_row(summary, frame, chunks[0]);

    let [clients_area, payments_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(chunks[1]);
    render_top_clients(&summary.top_clients, frame, clients_area);
    render_payment_methods(summary, frame, payments_area);

    if has_routes {
        render_top_routes(&summary.top_routes, frame, chunks[2]);
    }

    let averages_area = if has_routes { chunks[3] } else { chunks[2] };
    render_averages(summary, frame, averages_area);
}

pub(crate) struct KpiCard {
    pub title: &'static str,
    pub value: String,
    pub subtitle: Option<String>,
}

pub(crate) fn kpi_cards(summary: &FreightSummary) -> [KpiCard; 4] {
    [
        KpiCard {
            title: "Total de Pedidos",
            value: format::count(summary.total_records),
            subtitle: None,
        },
        KpiCard {
            title: "Valor Total",
            value: format::currency(summary.metrics.total_value),
            subtitle: None,
        },
        KpiCard {
            title: "Peso Total",
            value: format!("{} kg", format::number(summary.metrics.total_weight)),
            subtitle: None,
        },
        KpiCard {
            title: "Período",
            value: format!("{} dias", summary.date_range.days),
            subtitle: Some(format!("{} a {}", summary.date_range.start, summary.date_range.end)),
        },
    ]
}

fn render_kpi_row(summary: &FreightSummary, frame: &mut Frame, area: Rect) {
    let cells = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);

    for (card, cell) in kpi_cards(summary).into_iter().zip(cells.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" {} ", card.title));

        let mut lines = vec![Line::from(Span::styled(
            card.value,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))];
        if let Some(subtitle) = card.subtitle {
            lines.push(Line::from(Span::styled(subtitle, Style::default().fg(Color::Gray))));
        }

        frame.render_widget(Paragraph::new(lines).block(block), *cell);
    }
}

/// First five clients, input order.
pub(crate) fn visible_clients(clients: &[TopClient]) -> &[TopClient] {
    &clients[..clients.len().min(5)]
}

fn render_top_clients(clients: &[TopClient], frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Top Clientes ");

    if clients.is_empty() {
        let empty = Paragraph::new("Sem dados de clientes")
            .style(Style::default().fg(Color::Gray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = visible_clients(clients)
        .iter()
        .map(|client| {
            ListItem::new(Text::from(vec![
                Line::from(vec![
                    Span::styled(client.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!("  {} pedidos", format::count(client.order_count)),
                        Style::default().fg(Color::Gray),
                    ),
                ]),
                Line::from(Span::styled(
                    format!(
                        "  {}  (média {})",
                        format::currency(client.total_value),
                        format::currency(client.avg_value)
                    ),
                    Style::default().fg(Color::Cyan),
                )),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Proportional bar built from the percentage the backend provides.
pub(crate) fn payment_bar(percentage: f64, width: usize) -> String {
    let clamped = percentage.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn render_payment_methods(summary: &FreightSummary, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Formas de Pagamento ");

    if summary.payment_methods.is_empty() {
        let empty = Paragraph::new("Sem dados de pagamento")
            .style(Style::default().fg(Color::Gray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let bar_width = (area.width.saturating_sub(4) / 2).clamp(10, 24) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for method in &summary.payment_methods {
        lines.push(Line::from(vec![
            Span::styled(method.method.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {} ({:.1}%)", format::count(method.count), method.percentage),
                Style::default().fg(Color::Gray),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            payment_bar(method.percentage, bar_width),
            Style::default().fg(Color::Green),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

/// First six routes, input order. The section itself is skipped when the
/// list is empty.
pub(crate) fn visible_routes(routes: &[TopRoute]) -> &[TopRoute] {
    &routes[..routes.len().min(6)]
}

fn render_top_routes(routes: &[TopRoute], frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Rotas Principais ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = visible_routes(routes);
    let rows = Layout::vertical([Constraint::Ratio(1, 2); 2]).split(inner);

    for (row_idx, row_area) in rows.iter().enumerate() {
        let cells = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(*row_area);
        for (col_idx, cell) in cells.iter().enumerate() {
            let Some(route) = visible.get(row_idx * 3 + col_idx) else { continue };
            let text = Text::from(vec![
                Line::from(Span::styled(
                    route.route.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(vec![
                    Span::styled(
                        format!("{} viagens  ", format::count(route.frequency)),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::styled(
                        format!("{}/viagem", format::currency(route.avg_value)),
                        Style::default().fg(Color::Magenta),
                    ),
                ]),
            ]);
            frame.render_widget(Paragraph::new(text), *cell);
        }
    }
}

fn render_averages(summary: &FreightSummary, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Médias Gerais ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(inner);
    let averages = [
        ("Valor Médio por Pedido", format::currency(summary.metrics.avg_value)),
        ("Peso Médio por Pedido", format!("{} kg", format::number(summary.metrics.avg_weight))),
        ("Volume Médio por Pedido", format::number(summary.metrics.avg_volume)),
    ];

    for ((label, value), cell) in averages.into_iter().zip(cells.iter()) {
        let text = Text::from(vec![
            Line::from(Span::styled(label, Style::default().fg(Color::Gray))),
            Line::from(Span::styled(value, Style::default().fg(Color::Cyan).bold())),
        ]);
        frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), *cell);
    }
}

// ===== Chat =====

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Inner dimensions for wrap/scroll bookkeeping
    app.chat_height = transcript_area.height.saturating_sub(2);
    app.chat_width = transcript_area.width.saturating_sub(2);

    let transcript_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Assistente ");

    let pending = app.chat_send.is_pending();
    let transcript = if app.chat_messages.is_empty() && !pending && app.chat_failure.is_none() {
        if app.chat_history.is_loading() {
            Text::from(Span::styled("Carregando conversa...", Style::default().fg(Color::Gray)))
        } else if let Some(error) = app.chat_history.error() {
            Text::from(vec![
                Line::from(Span::styled(
                    format!("Erro ao carregar conversa: {error}"),
                    Style::default().fg(Color::Red),
                )),
                Line::from(Span::styled(
                    "pressione r para recarregar",
                    Style::default().fg(Color::Gray),
                )),
            ])
        } else {
            Text::from(Span::styled(
                "Pergunte sobre fretes, clientes e faturamento...",
                Style::default().fg(Color::Gray),
            ))
        }
    } else {
        Text::from(transcript_lines(
            &app.chat_messages,
            app.chat_failure.as_ref(),
            pending,
            app.animation_frame,
        ))
    };

    let chat = Paragraph::new(transcript)
        .block(transcript_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, transcript_area);

    let (input_title, border_color) = if pending {
        (" Pergunta (aguardando resposta) ", Color::DarkGray)
    } else if app.input_mode == InputMode::Editing {
        (" Pergunta (Enter envia) ", Color::Yellow)
    } else {
        (" Pergunta (i para escrever) ", Color::DarkGray)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(input_title);

    let input = Paragraph::new(app.chat_input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if app.input_mode == InputMode::Editing {
        frame.set_cursor_position((input_area.x + app.chat_cursor as u16 + 1, input_area.y + 1));
    }
}

/// Transcript rows: user messages right-aligned, everything else left.
/// A message without metadata gets no confidence line.
pub(crate) fn transcript_lines(
    messages: &[ChatMessage],
    failure: Option<&ChatFailure>,
    pending: bool,
    animation_frame: u8,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in messages {
        let (label, label_style, alignment) = match msg.role {
            ChatRole::User => (
                "Você",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                Alignment::Right,
            ),
            ChatRole::Assistant => (
                "Assistente",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                Alignment::Left,
            ),
        };

        lines.push(Line::from(Span::styled(label, label_style)).alignment(alignment));
        for content_line in msg.content.lines() {
            lines.push(Line::from(content_line.to_string()).alignment(alignment));
        }
        if let Some(metadata) = &msg.metadata {
            lines.push(
                Line::from(Span::styled(
                    format!("Confiança: {}", format::confidence(metadata.confidence)),
                    Style::default().fg(Color::Gray),
                ))
                .alignment(alignment),
            );
        }
        lines.push(Line::default());
    }

    if pending {
        lines.push(Line::from(Span::styled(
            "Assistente",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        let dots = ".".repeat(animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("Pensando{dots}"),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    if let Some(failure) = failure {
        lines.push(Line::from(Span::styled(
            format!("Falha ao enviar: {}", failure.message),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from(Span::styled(
            "pressione r para reenviar",
            Style::default().fg(Color::Gray),
        )));
    }

    lines
}

// ===== Record screens =====

fn render_companies(app: &mut App, frame: &mut Frame, area: Rect) {
    match app.companies.state() {
        QueryState::Idle | QueryState::Loading => render_loading_panel(frame, area, " Empresas "),
        QueryState::Failed(error) => render_error_panel(frame, area, "Erro ao listar empresas", error),
        QueryState::Ready(page) => {
            let title = page_title(" Empresas ", page);
            if page.data.is_empty() {
                render_empty_panel(frame, area, &title);
                return;
            }

            let header = Row::new(vec!["Nome", "Tipo", "Cidade/UF", "Telefone", "Ativa"])
                .style(Style::default().add_modifier(Modifier::BOLD));
            let rows: Vec<Row> = page
                .data
                .iter()
                .map(|company: &Company| {
                    Row::new(vec![
                        company.nome.clone(),
                        company.tipo.label().to_string(),
                        format!("{}/{}", company.cidade, company.estado),
                        company.telefone.clone().unwrap_or_else(|| "—".to_string()),
                        if company.ativo { "sim".to_string() } else { "não".to_string() },
                    ])
                })
                .collect();

            let table = Table::new(
                rows,
                [
                    Constraint::Percentage(35),
                    Constraint::Percentage(15),
                    Constraint::Percentage(20),
                    Constraint::Percentage(20),
                    Constraint::Percentage(10),
                ],
            )
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(title),
            )
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
            .highlight_symbol("> ");

            frame.render_stateful_widget(table, area, &mut app.companies_table);
        }
    }
}

fn render_orders(app: &mut App, frame: &mut Frame, area: Rect) {
    match app.orders.state() {
        QueryState::Idle | QueryState::Loading => render_loading_panel(frame, area, " Fretes "),
        QueryState::Failed(error) => render_error_panel(frame, area, "Erro ao listar fretes", error),
        QueryState::Ready(page) => {
            let title = page_title(" Fretes ", page);
            if page.data.is_empty() {
                render_empty_panel(frame, area, &title);
                return;
            }

            let header = Row::new(vec!["Número", "Emissão", "Pagador", "Rota", "Valor", "Status"])
                .style(Style::default().add_modifier(Modifier::BOLD));
            let rows: Vec<Row> = page
                .data
                .iter()
                .map(|order: &FreightOrder| {
                    Row::new(vec![
                        order.numero.clone(),
                        order.data_emissao.format("%d/%m/%Y").to_string(),
                        order.pagador_nome.clone(),
                        order.rota(),
                        format::currency(order.valor_frete),
                        order.status.label().to_string(),
                    ])
                })
                .collect();

            let table = Table::new(
                rows,
                [
                    Constraint::Percentage(10),
                    Constraint::Percentage(12),
                    Constraint::Percentage(24),
                    Constraint::Percentage(28),
                    Constraint::Percentage(14),
                    Constraint::Percentage(12),
                ],
            )
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(title),
            )
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
            .highlight_symbol("> ");

            frame.render_stateful_widget(table, area, &mut app.orders_table);
        }
    }
}

fn page_title<T>(name: &str, page: &Paginated<T>) -> String {
    format!(
        "{}— página {}/{} ({} registros) ",
        name,
        page.pagination.page,
        page.pagination.total_pages.max(1),
        format::count(page.pagination.total),
    )
}

// ===== Shared panels =====

fn render_loading_panel(frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title.to_string());
    let loading = Paragraph::new("Carregando...")
        .style(Style::default().fg(Color::Gray))
        .block(block);
    frame.render_widget(loading, area);
}

fn render_empty_panel(frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title.to_string());
    let empty = Paragraph::new("Nenhum registro encontrado")
        .style(Style::default().fg(Color::Gray))
        .block(block);
    frame.render_widget(empty, area);
}

/// Section-level fallback: whatever failed, the rest of the panel keeps
/// working and the user gets a reload control.
fn render_error_panel(frame: &mut Frame, area: Rect, title: &str, error: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(format!(" {title} "));

    let text = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))),
        Line::default(),
        Line::from(Span::styled(
            "pressione r para recarregar",
            Style::default().fg(Color::Gray),
        )),
    ]);

    let panel = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(panel, area);
}

fn render_confirm_modal(app: &App, frame: &mut Frame, area: Rect) {
    let Some(target) = &app.confirm_delete else { return };

    let popup = centered_rect(50, 5, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Confirmar exclusão ");

    let text = Text::from(vec![
        Line::from(format!("Excluir {}?", target.description())),
        Line::default(),
        Line::from(Span::styled("y confirma · n cancela", Style::default().fg(Color::Gray))),
    ]);

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), popup);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fretes_core::config::Config;
    use fretes_core::models::MessageMetadata;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::json;
    use std::time::Duration;

    fn summary_json(total_records: u64, clients: usize, routes: usize) -> serde_json::Value {
        let total_value = if total_records == 0 { 0.0 } else { 1857340.55 };
        let total_weight = if total_records == 0 { 0.0 } else { 482310.0 };
        let top_clients: Vec<serde_json::Value> = (1..=clients)
            .map(|i| {
                json!({
                    "name": format!("Cliente {i}"),
                    "order_count": 10, "total_value": 1000.0, "avg_value": 100.0
                })
            })
            .collect();
        let top_routes: Vec<serde_json::Value> = (1..=routes)
            .map(|i| {
                json!({
                    "route": format!("Rota {i}"),
                    "frequency": 5, "total_value": 500.0, "avg_value": 100.0
                })
            })
            .collect();

        json!({
            "timestamp": "2025-05-30T18:42:00Z",
            "total_records": total_records,
            "metrics": {
                "total_value": total_value,
                "total_weight": total_weight,
                "total_volume": 0.0,
                "avg_value": 0.0,
                "avg_weight": 0.0,
                "avg_volume": 0.0
            },
            "date_range": {"start": "2024-11-01", "end": "2025-05-30", "days": 210},
            "top_clients": top_clients,
            "top_routes": top_routes,
            "payment_methods": [
                {"method": "Boleto", "count": 8, "percentage": 62.6}
            ]
        })
    }

    fn parse_summary(value: serde_json::Value) -> FreightSummary {
        serde_json::from_value(value).unwrap()
    }

    fn test_app() -> App {
        App::new(Config {
            api_base_url: "http://127.0.0.1:1/api/v1".to_string(),
            ..Config::default()
        })
    }

    fn draw(app: &mut App) -> String {
        let backend = TestBackend::new(100, 32);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    async fn settle_summary(app: &mut App) {
        for _ in 0..200 {
            app.poll_tasks();
            if !app.summary.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("summary did not settle");
    }

    async fn app_with_summary(value: serde_json::Value) -> App {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freight_summary.json");
        std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

        let mut app = test_app();
        app.config.summary_path = path;
        app.load_summary();
        settle_summary(&mut app).await;
        drop(dir);
        app
    }

    #[test]
    fn kpi_cards_render_zeroes_for_an_empty_period() {
        let summary = parse_summary(summary_json(0, 0, 0));
        let cards = kpi_cards(&summary);

        assert_eq!(cards[0].value, "0");
        assert_eq!(cards[1].value, "R$ 0,00");
        assert_eq!(cards[2].value, "0 kg");
        assert_eq!(cards[3].value, "210 dias");
    }

    #[test]
    fn clients_and_routes_are_capped() {
        let summary = parse_summary(summary_json(10, 7, 8));
        assert_eq!(visible_clients(&summary.top_clients).len(), 5);
        assert_eq!(visible_routes(&summary.top_routes).len(), 6);
        assert_eq!(visible_routes(&summary.top_routes)[0].route, "Rota 1");
    }

    #[test]
    fn payment_bar_is_proportional() {
        assert_eq!(payment_bar(50.0, 20).chars().filter(|&c| c == '█').count(), 10);
        assert_eq!(payment_bar(0.0, 20), "░".repeat(20));
        assert_eq!(payment_bar(100.0, 10), "█".repeat(10));
        // Out-of-range input never panics the renderer
        assert_eq!(payment_bar(140.0, 10), "█".repeat(10));
    }

    #[test]
    fn transcript_renders_one_row_per_message_with_alignment() {
        let messages = vec![
            ChatMessage { role: ChatRole::User, content: "oi".to_string(), metadata: None },
            ChatMessage {
                role: ChatRole::Assistant,
                content: "olá".to_string(),
                metadata: Some(MessageMetadata { confidence: 0.85 }),
            },
        ];

        let lines = transcript_lines(&messages, None, false, 0);
        let labels: Vec<&Line> = lines
            .iter()
            .filter(|line| {
                let text: String = line.spans.iter().map(|s| s.content.clone()).collect();
                text == "Você" || text == "Assistente"
            })
            .collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].alignment, Some(Alignment::Right));
        assert_eq!(labels[1].alignment, Some(Alignment::Left));

        let text: String = lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .map(|span| span.content.clone())
            .collect();
        assert!(text.contains("Confiança: 85%"));
        assert!(!text.contains("Pensando"));
    }

    #[test]
    fn message_without_metadata_has_no_confidence_line() {
        let messages =
            vec![ChatMessage { role: ChatRole::Assistant, content: "ok".to_string(), metadata: None }];
        let lines = transcript_lines(&messages, None, false, 0);
        let text: String = lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .map(|span| span.content.clone())
            .collect();
        assert!(!text.contains("Confiança"));
    }

    #[test]
    fn pending_indicator_and_failure_rows() {
        let lines = transcript_lines(&[], None, true, 2);
        let text: String = lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .map(|span| span.content.clone())
            .collect();
        assert!(text.contains("Pensando..."));

        let failure =
            ChatFailure { query: "x".to_string(), message: "connection refused".to_string() };
        let lines = transcript_lines(&[], Some(&failure), false, 0);
        let text: String = lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .map(|span| span.content.clone())
            .collect();
        assert!(text.contains("Falha ao enviar"));
        assert!(text.contains("reenviar"));
    }

    #[tokio::test]
    async fn dashboard_hides_the_routes_section_when_empty() {
        let mut app = app_with_summary(summary_json(10, 2, 0)).await;
        let screen = draw(&mut app);
        assert!(!screen.contains("Rotas Principais"));
        assert!(screen.contains("Top Clientes"));
    }

    #[tokio::test]
    async fn dashboard_shows_at_most_six_routes() {
        let mut app = app_with_summary(summary_json(10, 2, 7)).await;
        let screen = draw(&mut app);
        assert!(screen.contains("Rotas Principais"));
        assert!(screen.contains("Rota 1"));
        assert!(!screen.contains("Rota 7"));
    }

    #[tokio::test]
    async fn dashboard_failure_shows_fallback_with_reload_control() {
        let mut app = test_app();
        app.config.summary_path = std::path::PathBuf::from("/nonexistent/freight_summary.json");
        app.load_summary();
        settle_summary(&mut app).await;

        let screen = draw(&mut app);
        assert!(screen.contains("Erro ao carregar dados"));
        assert!(screen.contains("pressione r para recarregar"));
    }

    #[tokio::test]
    async fn chat_screen_renders_every_history_row() {
        let mut app = test_app();
        app.screen = Screen::Chat;
        app.chat_messages = vec![
            ChatMessage { role: ChatRole::User, content: "quantos fretes?".to_string(), metadata: None },
            ChatMessage {
                role: ChatRole::Assistant,
                content: "1.284 fretes no período.".to_string(),
                metadata: Some(MessageMetadata { confidence: 0.92 }),
            },
        ];

        let screen = draw(&mut app);
        assert!(screen.contains("quantos fretes?"));
        assert!(screen.contains("1.284 fretes no período."));
        assert!(screen.contains("Confiança: 92%"));
    }
}
