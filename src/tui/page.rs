use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Top-level pages reachable from the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Page {
    #[default]
    Home,
    Chatbot,
    Contact,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Home, Page::Chatbot, Page::Contact];

    /// Cycle to the next page in sidebar order
    pub fn cycle(&self) -> Self {
        match self {
            Self::Home => Self::Chatbot,
            Self::Chatbot => Self::Contact,
            Self::Contact => Self::Home,
        }
    }

    /// Cycle to the previous page
    pub fn cycle_reverse(&self) -> Self {
        match self {
            Self::Home => Self::Contact,
            Self::Contact => Self::Chatbot,
            Self::Chatbot => Self::Home,
        }
    }

    /// Sidebar label with icon
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Home => "🏠 Home",
            Self::Chatbot => "🤖 Chatbot",
            Self::Contact => "📧 Contact",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Home => "HOME",
            Self::Chatbot => "CHAT",
            Self::Contact => "CONTACT",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Home => Color::Cyan,
            Self::Chatbot => Color::Green,
            Self::Contact => Color::Magenta,
        }
    }

    /// Parse a page name as typed in a `:command`
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "home" => Some(Self::Home),
            "chat" | "chatbot" | "bot" => Some(Self::Chatbot),
            "contact" => Some(Self::Contact),
            _ => None,
        }
    }
}

/// Columns of the Chatbot page that can take keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Upload,
    Embeddings,
    Chat,
}

impl Panel {
    pub fn cycle(&self) -> Self {
        match self {
            Self::Upload => Self::Embeddings,
            Self::Embeddings => Self::Chat,
            Self::Chat => Self::Upload,
        }
    }

    /// Column header
    pub fn title(&self) -> &'static str {
        match self {
            Self::Upload => "📂 Upload Document",
            Self::Embeddings => "🧠 Embeddings",
            Self::Chat => "💬 Chat with Document",
        }
    }

    /// Whether Insert mode types into this panel
    pub fn accepts_text(&self) -> bool {
        matches!(self, Self::Upload | Self::Chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_cycling() {
        let mut page = Page::default();
        assert_eq!(page, Page::Home);

        page = page.cycle();
        assert_eq!(page, Page::Chatbot);
        page = page.cycle();
        assert_eq!(page, Page::Contact);
        page = page.cycle();
        assert_eq!(page, Page::Home);
    }

    #[test]
    fn test_page_cycling_reverse() {
        for page in Page::ALL {
            assert_eq!(page.cycle().cycle_reverse(), page);
        }
        assert_eq!(Page::Home.cycle_reverse(), Page::Contact);
    }

    #[test]
    fn test_page_from_str() {
        assert_eq!(Page::from_str("home"), Some(Page::Home));
        assert_eq!(Page::from_str("Chat"), Some(Page::Chatbot));
        assert_eq!(Page::from_str("bot"), Some(Page::Chatbot));
        assert_eq!(Page::from_str("CONTACT"), Some(Page::Contact));
        assert_eq!(Page::from_str("settings"), None);
    }

    #[test]
    fn test_panel_focus_order() {
        let panel = Panel::default();
        assert_eq!(panel.cycle(), Panel::Embeddings);
        assert_eq!(panel.cycle().cycle(), Panel::Chat);
        assert_eq!(panel.cycle().cycle().cycle(), Panel::Upload);
        assert!(!Panel::Embeddings.accepts_text());
    }
}
