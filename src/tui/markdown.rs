use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Parse markdown into styled lines using the default text style
pub fn parse_markdown(input: &str) -> Vec<Line<'static>> {
    parse_markdown_with(input, Style::default())
}

/// Parse markdown into styled lines; `base` styles plain text
pub fn parse_markdown_with(input: &str, base: Style) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let mut writer = LineWriter::new(base);
    for event in Parser::new_ext(input, options) {
        writer.handle(event);
    }
    writer.finish()
}

/// Accumulates spans into lines while walking parser events
struct LineWriter {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    code_block: Option<String>,
    /// One entry per open list; `Some(n)` is the next ordered number
    lists: Vec<Option<u64>>,
}

impl LineWriter {
    fn new(base: Style) -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            styles: vec![base],
            code_block: None,
            lists: Vec::new(),
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn blank_line(&mut self) {
        let last_is_blank = self
            .lines
            .last()
            .map(|line| line.spans.iter().all(|s| s.content.trim().is_empty()))
            .unwrap_or(true);
        if !last_is_blank {
            self.lines.push(Line::default());
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.code_block.as_mut() {
                Some(code) => code.push_str(&text),
                None => {
                    let style = self.style();
                    self.spans.push(Span::styled(text.into_string(), style));
                }
            },
            Event::Code(code) => {
                let style = Style::default().fg(Color::Yellow).bg(Color::Rgb(40, 40, 40));
                self.spans.push(Span::styled(format!(" {} ", code), style));
            }
            Event::SoftBreak => {
                let style = self.style();
                self.spans.push(Span::styled(" ", style));
            }
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "───",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let current = self.style();
        let style = match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let color = match level {
                    HeadingLevel::H1 => Color::Cyan,
                    HeadingLevel::H2 => Color::Blue,
                    HeadingLevel::H3 => Color::Green,
                    _ => Color::Yellow,
                };
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            }
            Tag::Emphasis => current.add_modifier(Modifier::ITALIC),
            Tag::Strong => current.add_modifier(Modifier::BOLD),
            Tag::Strikethrough => current.add_modifier(Modifier::CROSSED_OUT),
            Tag::CodeBlock(kind) => {
                self.flush();
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.lines.push(Line::from(vec![
                    Span::styled("```", Style::default().fg(Color::DarkGray)),
                    Span::styled(lang, Style::default().fg(Color::Magenta)),
                ]));
                self.code_block = Some(String::new());
                Style::default().fg(Color::Gray)
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
                current
            }
            Tag::Item => {
                let depth = self.lists.len().saturating_sub(1);
                self.spans.push(Span::raw("  ".repeat(depth)));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.spans
                    .push(Span::styled(marker, Style::default().fg(Color::Yellow)));
                current
            }
            Tag::Link { .. } => Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            Tag::BlockQuote(_) => {
                self.flush();
                self.spans
                    .push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
                current.add_modifier(Modifier::ITALIC)
            }
            _ => current,
        };
        self.styles.push(style);
    }

    fn end(&mut self, tag: TagEnd) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.blank_line();
            }
            TagEnd::Item | TagEnd::BlockQuote(_) => self.flush(),
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::CodeBlock => {
                let code = self.code_block.take().unwrap_or_default();
                for line in code.lines() {
                    self.lines.push(Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::Gray),
                    )));
                }
                self.lines.push(Line::from(Span::styled(
                    "```",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self
            .lines
            .last()
            .map(|line| line.spans.iter().all(|s| s.content.trim().is_empty()))
            .unwrap_or(false)
        {
            self.lines.pop();
        }
        self.lines
    }
}
