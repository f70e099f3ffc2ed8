//! Visual theme and styling.

use console::Style;

/// Styles for run status output.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Passed deployments and runs (green).
    pub success: Style,
    /// Non-fatal problems (orange).
    pub warning: Style,
    /// Failed deployments and fatal errors (red bold).
    pub error: Style,
    /// Secondary text such as durations (dim).
    pub dim: Style,
    /// Names worth picking out (bold).
    pub highlight: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
        }
    }

    /// A theme without colors, for non-TTY output or `NO_COLOR`.
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
        }
    }
}

/// Whether stderr output should be colored.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    console::colors_enabled_stderr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_adds_no_escapes() {
        let theme = Theme::plain();
        assert_eq!(theme.error.apply_to("boom").to_string(), "boom");
        assert_eq!(theme.success.apply_to("ok").to_string(), "ok");
    }

    #[test]
    fn forced_styles_wrap_text() {
        let theme = Theme::new();
        let styled = theme.error.clone().force_styling(true).apply_to("boom").to_string();
        assert!(styled.contains("boom"));
        assert_ne!(styled, "boom");
    }
}
