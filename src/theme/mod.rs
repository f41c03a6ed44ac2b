//! Theme for human-mode output.

use console::{Color, Style};

/// Visual theme for `vt` human-mode output.
///
/// Centralizes colors and styles for consistent rendering. Styles built with
/// `colors = false` render as plain text.
#[derive(Debug, Clone)]
pub struct VtTheme {
    pub accent: Style,
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub muted: Style,

    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub timestamp: Style,
    pub path: Style,
    pub comment: Style,
}

impl VtTheme {
    pub fn new(colors: bool) -> Self {
        let style = |s: Style| s.force_styling(colors);

        Self {
            accent: style(Style::new().fg(Color::Cyan).bold()),
            success: style(Style::new().fg(Color::Green).bold()),
            error: style(Style::new().fg(Color::Red).bold()),
            warning: style(Style::new().fg(Color::Yellow).bold()),
            muted: style(Style::new().dim()),
            header: style(Style::new().bold().underlined()),
            label: style(Style::new().dim()),
            value: style(Style::new().bold()),
            timestamp: style(Style::new().fg(Color::Cyan)),
            path: style(Style::new().fg(Color::Blue)),
            comment: style(Style::new().italic()),
        }
    }
}

impl Default for VtTheme {
    fn default() -> Self {
        Self::new(true)
    }
}
