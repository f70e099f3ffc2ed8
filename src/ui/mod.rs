//! Terminal status output.
//!
//! Everything detailed goes through tracing and the attempt logs; this
//! module only prints the few human-facing status lines of a run.

pub mod status;
pub mod theme;

use std::time::Duration;

use console::Term;

pub use status::StatusKind;
pub use theme::{should_use_colors, Theme};

/// Writes status lines to stderr, styled when it is a terminal.
#[derive(Debug, Clone)]
pub struct Console {
    theme: Theme,
    styled: bool,
    term: Term,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        let styled = should_use_colors();
        Self {
            theme: if styled { Theme::new() } else { Theme::plain() },
            styled,
            term: Term::stderr(),
        }
    }

    /// Render a status line without printing it.
    pub fn render(&self, kind: StatusKind, msg: &str) -> String {
        if self.styled {
            kind.format(&self.theme, msg)
        } else {
            kind.format_plain(msg)
        }
    }

    pub fn status(&self, kind: StatusKind, msg: &str) {
        // stderr going away is not worth failing a run over.
        let _ = self.term.write_line(&self.render(kind, msg));
    }

    pub fn success(&self, msg: &str) {
        self.status(StatusKind::Success, msg);
    }

    pub fn warning(&self, msg: &str) {
        self.status(StatusKind::Warning, msg);
    }

    pub fn error(&self, msg: &str) {
        self.status(StatusKind::Failed, msg);
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

/// Human-readable duration: `500ms`, `5.3s`, `2.5m`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
