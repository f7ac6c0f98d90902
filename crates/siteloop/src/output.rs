//! Colored status lines on stderr.
//!
//! Stdout is left to the build tool so its output reads exactly as it would
//! in a terminal.

use console::{Style, Term};

/// Width of the label column in [`Output::status`].
const LABEL_WIDTH: usize = 8;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    dim: Style,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            dim: Style::new().dim(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print a `label value` line with the label in a dimmed column.
    pub(crate) fn status(&self, label: &str, value: &str) {
        let label = format!("{label:>LABEL_WIDTH$}");
        let _ = self
            .term
            .write_line(&format!("{} {value}", self.dim.apply_to(label)));
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print the address the site is served on (cyan bold).
    pub(crate) fn serving(&self, url: &str) {
        let line = format!("Serving on {url}");
        let _ = self
            .term
            .write_line(&self.cyan_bold.apply_to(line).to_string());
    }
}
