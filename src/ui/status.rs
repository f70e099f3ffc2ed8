//! Status vocabulary for deployment and run results.

use super::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Success,
    Failed,
    Warning,
}

impl StatusKind {
    /// Unicode icon for TTY output.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Failed => "✗",
            Self::Warning => "⚠",
        }
    }

    /// Bracketed text for non-TTY output.
    pub fn bracketed(self) -> &'static str {
        match self {
            Self::Success => "[ok]",
            Self::Failed => "[FAIL]",
            Self::Warning => "[warn]",
        }
    }

    /// Styled icon + message.
    pub fn format(self, theme: &Theme, msg: &str) -> String {
        let style = match self {
            Self::Success => &theme.success,
            Self::Failed => &theme.error,
            Self::Warning => &theme.warning,
        };
        format!("{} {}", style.apply_to(self.icon()), msg)
    }

    /// Bracketed label + message.
    pub fn format_plain(self, msg: &str) -> String {
        format!("{} {}", self.bracketed(), msg)
    }
}

impl From<bool> for StatusKind {
    fn from(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failed
        }
    }
}
