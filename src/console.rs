//! Terminal output for the reader front end.
//!
//! Styled status lines with automatic TTY detection and respect for the
//! NO_COLOR environment variable, plus the reader's page and progress
//! rendering.

use crate::session::SessionStatus;
use crate::view::ReaderView;
use std::io::{self, IsTerminal};

/// ANSI style codes for terminal formatting.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
            Style::Gray => "90",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Width of the progress bar in cells.
const PROGRESS_WIDTH: usize = 24;

/// Console output handler with color support detection.
#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Creates a new Console, enabling colors only on a terminal without `NO_COLOR`.
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();

        Self { colors_enabled }
    }

    /// Creates a Console with colors explicitly enabled or disabled.
    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Applies ANSI styles to text if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    /// Creates a colored label like `[INFO]`.
    pub fn label(&self, label: &str, color: Style) -> String {
        let styled = self.style(label, &[color, Style::Bold]);
        format!("[{}]", styled)
    }

    /// Prints an info message with blue `[INFO]` label.
    pub fn info(&self, message: &str) {
        println!("{} {}", self.label("INFO", Style::Blue), message);
    }

    /// Prints a success message with green `[OK]` label.
    pub fn success(&self, message: &str) {
        println!("{} {}", self.label("OK", Style::Green), message);
    }

    /// Prints a warning message with yellow `[WARN]` label.
    pub fn warning(&self, message: &str) {
        println!("{} {}", self.label("WARN", Style::Yellow), message);
    }

    /// Prints an error message with red `[ERROR]` label.
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.label("ERROR", Style::Red), message);
    }

    /// Prints a step message with cyan `[STEP]` label.
    pub fn step(&self, message: &str) {
        println!("{} {}", self.label("STEP", Style::Cyan), message);
    }

    /// Prints a section header in magenta bold.
    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    /// Returns text styled as muted (dim gray).
    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Gray, Style::Dim])
    }

    /// Renders a fixed-width progress bar for a 0..=100 percentage.
    pub fn progress_bar(&self, percent: f64) -> String {
        let filled = ((percent.clamp(0.0, 100.0) / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
        let bar = format!(
            "{}{}",
            "#".repeat(filled),
            "-".repeat(PROGRESS_WIDTH - filled)
        );
        format!("[{}]", self.style(&bar, &[Style::Cyan]))
    }

    /// Formats the reader frame as lines of text.
    pub fn format_view(&self, view: &ReaderView) -> Vec<String> {
        match view.status {
            SessionStatus::Loading => {
                vec![self.muted(&format!("Loading chapter {}...", view.chapter_id))]
            }
            SessionStatus::Empty => vec![format!(
                "{} Chapter {} has no pages available",
                self.label("EMPTY", Style::Yellow),
                view.chapter_id
            )],
            SessionStatus::Failed(kind) => vec![format!(
                "{} Could not load chapter {}: {}",
                self.label("FAIL", Style::Red),
                view.chapter_id,
                kind.describe()
            )],
            SessionStatus::Ready => self.format_page(view),
        }
    }

    fn format_page(&self, view: &ReaderView) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(page) = &view.current_page {
            let busy = if view.is_busy {
                self.muted(" (loading)")
            } else {
                String::new()
            };
            lines.push(format!("{}{}", page.url, busy));
        }

        if view.is_overlay_visible {
            lines.push(format!(
                "{} {}",
                self.progress_bar(view.progress_percent()),
                self.style(
                    &format!("{} / {}", view.page_number, view.total_pages),
                    &[Style::Bold]
                )
            ));

            if view.has_next_chapter_at_end
                && let Some(next) = &view.next_chapter
            {
                let number = next.display_number.as_deref().unwrap_or("?");
                let title = next
                    .title
                    .as_deref()
                    .map(|t| format!(": {}", t))
                    .unwrap_or_default();
                lines.push(format!(
                    "{} Next chapter {}{} (press n)",
                    self.label("NEXT", Style::Green),
                    number,
                    title
                ));
            }
        }

        lines
    }

    /// Prints the reader frame.
    pub fn render(&self, view: &ReaderView) {
        for line in self.format_view(view) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::source::{ChapterReference, PageDescriptor};

    fn ready_view() -> ReaderView {
        ReaderView {
            chapter_id: "c1".to_string(),
            status: SessionStatus::Ready,
            current_page: Some(PageDescriptor {
                index: 1,
                url: "https://img/2.jpg".to_string(),
            }),
            page_number: 2,
            total_pages: 2,
            is_busy: false,
            is_overlay_visible: true,
            can_advance: true,
            has_next_chapter_at_end: true,
            next_chapter: Some(ChapterReference {
                id: "c2".to_string(),
                display_number: Some("5".to_string()),
                title: Some("Dawn".to_string()),
            }),
        }
    }

    #[test]
    fn test_style_disabled() {
        let console = Console::with_colors(false);
        assert_eq!(console.style("hello", &[Style::Red]), "hello");
    }

    #[test]
    fn test_style_enabled() {
        let console = Console::with_colors(true);
        let styled = console.style("hello", &[Style::Bold, Style::Red]);
        assert!(styled.contains("1;31"));
        assert!(styled.contains(RESET));
    }

    #[test]
    fn test_label() {
        let console = Console::with_colors(false);
        assert_eq!(console.label("ERROR", Style::Red), "[ERROR]");

        let console = Console::with_colors(true);
        assert!(console.label("ERROR", Style::Red).contains("31;1"));
    }

    #[test]
    fn test_progress_bar() {
        let console = Console::with_colors(false);
        assert_eq!(console.progress_bar(0.0), format!("[{}]", "-".repeat(24)));
        assert_eq!(console.progress_bar(100.0), format!("[{}]", "#".repeat(24)));
        assert_eq!(console.progress_bar(250.0), format!("[{}]", "#".repeat(24)));
    }

    #[test]
    fn test_format_ready_view() {
        let console = Console::with_colors(false);
        let lines = console.format_view(&ready_view());
        assert_eq!(lines[0], "https://img/2.jpg");
        assert!(lines[1].ends_with("2 / 2"));
        assert!(lines[2].contains("Next chapter 5: Dawn"));
    }

    #[test]
    fn test_format_hidden_overlay() {
        let console = Console::with_colors(false);
        let mut view = ready_view();
        view.is_overlay_visible = false;
        view.is_busy = true;
        let lines = console.format_view(&view);
        assert_eq!(lines, vec!["https://img/2.jpg (loading)".to_string()]);
    }

    #[test]
    fn test_format_empty_and_failed() {
        let console = Console::with_colors(false);
        let mut view = ready_view();
        view.status = SessionStatus::Empty;
        assert!(console.format_view(&view)[0].contains("no pages available"));

        view.status = SessionStatus::Failed(FailureKind::ChapterNotFound);
        assert!(console.format_view(&view)[0].contains("does not exist"));
    }
}
