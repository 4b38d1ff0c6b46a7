use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::app::{App, AppState, Notice};
use super::markdown::{parse_markdown, parse_markdown_with};
use super::page::{Page, Panel};
use crate::constants::CHAT_LOCKED_INFO;
use crate::constants::FOOTER_TEXT;
use crate::session::Role;

const HOME_MARKDOWN: &str = "Welcome to **Document ChatBot**! 🚀

**Built using Open Source Stack (Llama 3.2, BGE Embeddings, and Qdrant running locally within a Docker Container.)**

- **Upload Documents**: Easily upload your PDF documents.
- **Summarize**: Get concise summaries of your documents.
- **Chat**: Interact with your documents through our intelligent chatbot.

Enhance your document management experience with Document Bot! 😊";

/// Fits the sidebar tagline plus the right border
const SIDEBAR_WIDTH: u16 = 38;

const CHATBOT_TITLE: &str = "🤖 Your Favourite Information Extractor (Llama 3.2 RAG 🦙)";

/// Render the whole screen
pub fn render_ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),    // Page
            Constraint::Length(1), // Footer
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let body = if app.show_sidebar {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
            .split(chunks[0]);
        render_sidebar(frame, columns[0], app);
        columns[1]
    } else {
        chunks[0]
    };

    match app.page {
        Page::Home => render_home(frame, body),
        Page::Chatbot => render_chatbot(frame, body, app),
        Page::Contact => render_contact(frame, body, app),
    }

    render_footer(frame, chunks[1]);
    render_status_bar(frame, chunks[2], app);
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let mut items = vec![
        ListItem::new(Line::from(Span::styled(
            "📚 Your Personal Document Assistant",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))),
        ListItem::new(Line::from(Span::styled(
            "─".repeat(area.width.saturating_sub(2) as usize),
            Style::default().fg(Color::DarkGray),
        ))),
        ListItem::new(Line::from(Span::styled(
            "Navigate",
            Style::default().fg(Color::Gray),
        ))),
    ];

    for page in Page::ALL {
        let selected = page == app.page;
        let marker = if selected { "▶ " } else { "  " };
        let style = if selected {
            Style::default().fg(page.color()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        items.push(ListItem::new(Line::from(Span::styled(
            format!("{}{}", marker, page.display_name()),
            style,
        ))));
    }

    items.push(ListItem::new(""));
    items.push(ListItem::new(Line::from(vec![
        Span::styled("LLM: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.llm_model().to_string(), Style::default().fg(Color::Green)),
    ])));
    items.push(ListItem::new(Line::from(vec![
        Span::styled("Embeddings: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.embedding_model().to_string(),
            Style::default().fg(Color::Green),
        ),
    ])));

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::RIGHT)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(list, area);
}

fn title_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn render_home(frame: &mut Frame, area: Rect) {
    let mut lines = vec![title_line("📄 Document ChatBot"), Line::default()];
    lines.extend(parse_markdown(HOME_MARKDOWN));

    let page = Paragraph::new(lines)
        .block(Block::default().borders(Borders::NONE))
        .wrap(Wrap { trim: false });
    frame.render_widget(page, inset(area));
}

fn render_contact(frame: &mut Frame, area: Rect, app: &App) {
    let text = format!(
        "Would love to hear from you! Whether you have a question, feedback, or want to contribute, feel free to reach out.\n\n- **Email:** {} ✉️",
        app.contact_email()
    );
    let mut lines = vec![title_line("📬 Contact Us"), Line::default()];
    lines.extend(parse_markdown(&text));

    let page = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(page, inset(area));
}

fn render_chatbot(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(5)])
        .split(area);

    let header = Paragraph::new(vec![title_line(CHATBOT_TITLE)]).alignment(Alignment::Left);
    frame.render_widget(header, inset(rows[0]));

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[1]);

    render_upload_column(frame, columns[0], app);
    render_embeddings_column(frame, columns[1], app);
    render_chat_column(frame, columns[2], app);
}

fn column_block(app: &App, panel: Panel) -> Block<'static> {
    let focused = app.focus == panel;
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    Block::default()
        .title(format!(" {} ", panel.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn notice_line(notice: &Notice) -> Line<'static> {
    let color = match notice {
        Notice::Success(_) => Color::Green,
        Notice::Info(_) => Color::Blue,
        Notice::Warning(_) => Color::Yellow,
        Notice::Error(_) => Color::Red,
    };
    Line::from(Span::styled(
        notice.text().to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn input_line(label: &str, value: &str, placeholder: &str, active: bool) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{} ", label),
        Style::default().fg(Color::Gray),
    )];
    if value.is_empty() {
        spans.push(Span::styled(
            placeholder.to_string(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    } else {
        spans.push(Span::styled(value.to_string(), Style::default().fg(Color::White)));
    }
    if active {
        spans.push(Span::styled(
            "▋",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK),
        ));
    }
    Line::from(spans)
}

fn is_typing(app: &App, panel: Panel) -> bool {
    app.state == AppState::Insert && app.focus == panel
}

fn render_upload_column(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Upload a PDF",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        input_line(
            "Path:",
            &app.upload_input,
            "press i, type a path, Enter",
            is_typing(app, Panel::Upload),
        ),
        Line::default(),
    ];

    if let Some(notice) = &app.upload_notice {
        lines.push(notice_line(notice));
    }

    if let Some(file) = &app.uploaded {
        lines.push(Line::from(vec![
            Span::styled("Filename: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(file.file_name.clone()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("File Size: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{} bytes", file.size_bytes)),
        ]));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "📖 PDF Preview",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        )));
        if file.preview.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("{} Extracting text...", app.spinner()),
                Style::default().fg(Color::DarkGray),
            )));
        }
        for preview in &file.preview {
            lines.push(Line::from(Span::styled(
                preview.clone(),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(column_block(app, Panel::Upload))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_embeddings_column(frame: &mut Frame, area: Rect, app: &App) {
    let checkbox = if app.embeddings_checked { "[x]" } else { "[ ]" };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", checkbox), Style::default().fg(Color::Yellow)),
            Span::raw("✅ Create Embeddings"),
        ]),
        Line::default(),
    ];

    if app.embeddings_running {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", app.spinner()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("🔄 Embeddings are in process..."),
        ]));
    } else if let Some(notice) = &app.embeddings_notice {
        lines.push(notice_line(notice));
    }

    let paragraph = Paragraph::new(lines)
        .block(column_block(app, Panel::Embeddings))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_chat_column(frame: &mut Frame, area: Rect, app: &App) {
    let block = column_block(app, Panel::Chat);

    if !app.session.has_chatbot() {
        let info = notice_line(&Notice::Info(CHAT_LOCKED_INFO.to_string()));
        let paragraph = Paragraph::new(vec![info])
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let mut lines = Vec::new();
    for turn in &app.session.messages {
        let (label, color) = match turn.role {
            Role::User => ("🧑 user", Color::Blue),
            Role::Assistant => ("🤖 assistant", Color::Green),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.extend(parse_markdown_with(&turn.content, Style::default()));
        lines.push(Line::default());
    }

    if app.is_responding {
        lines.push(Line::from(Span::styled(
            "🤖 assistant",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        if !app.current_response.is_empty() {
            lines.extend(parse_markdown(&app.current_response));
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", app.spinner()), Style::default().fg(Color::Cyan)),
            Span::styled(
                "🤖 Responding...",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    // scroll_offset counts wrapped rows up from the bottom
    let history = Paragraph::new(lines).wrap(Wrap { trim: false });
    let total = u16::try_from(history.line_count(rows[0].width)).unwrap_or(u16::MAX);
    let max_scroll = total.saturating_sub(rows[0].height);
    app.chat_max_scroll.set(max_scroll);
    let top = max_scroll - app.scroll_offset.min(max_scroll);

    frame.render_widget(history.scroll((top, 0)), rows[0]);

    let input = Paragraph::new(input_line(
        ">",
        &app.chat_input,
        "Type your message here...",
        is_typing(app, Panel::Chat),
    ));
    frame.render_widget(input, rows[1]);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        FOOTER_TEXT,
        Style::default().fg(Color::DarkGray),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(footer, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let (state_label, state_color) = match app.state {
        AppState::Normal => ("NORMAL", Color::Green),
        AppState::Insert => ("INSERT", Color::Yellow),
        AppState::Command => ("COMMAND", Color::Magenta),
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", state_label),
            Style::default()
                .bg(state_color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!(" {} ", app.page.short_name()),
            Style::default()
                .bg(app.page.color())
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
    ];

    if app.state == AppState::Command {
        spans.push(Span::styled(
            format!(":{}", app.command_input),
            Style::default().fg(Color::White),
        ));
    } else {
        let status = app.status_message.clone().unwrap_or_else(|| {
            if app.embeddings_running {
                "Creating embeddings...".to_string()
            } else if app.is_responding {
                "Responding...".to_string()
            } else {
                "Ready".to_string()
            }
        });
        spans.push(Span::raw(status));
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            "Shift+Tab: pages  Tab: focus  :help",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let status_bar = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::Black))
        .block(Block::default());
    frame.render_widget(status_bar, area);
}

/// Area with a one-cell margin on the left and right
fn inset(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        width: area.width.saturating_sub(2),
        ..area
    }
}
