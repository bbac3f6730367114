//! Styled terminal messages.
//!
//! Everything goes to stderr so composed-page listings never mix with
//! redirected build output; colors drop out automatically when the stream
//! is not a terminal.

use console::{Term, style};

pub(crate) struct Output {
    term: Term,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    /// Plain progress line.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&style(msg).green().to_string());
    }

    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&style(msg).yellow().to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&style(msg).red().bold().to_string());
    }
}
