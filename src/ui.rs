//! Terminal output for the CLI

use console::{measure_text_width, Term};
use owo_colors::OwoColorize;

use crate::protect::TrialState;

/// Color of a printed line or value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Good,
    Bad,
    Notice,
    Note,
    Muted,
}

pub struct UI {
    term: Term,
    color: bool,
}

impl UI {
    pub fn new() -> Self {
        let term = Term::stdout();
        let color = term.features().colors_supported();
        Self { term, color }
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.color {
            return text.to_string();
        }
        match tone {
            Tone::Good => text.green().to_string(),
            Tone::Bad => text.red().to_string(),
            Tone::Notice => text.yellow().to_string(),
            Tone::Note => text.blue().to_string(),
            Tone::Muted => text.dimmed().to_string(),
        }
    }

    fn line(&self, text: &str, tone: Tone) {
        let painted = self.paint(text, tone);
        if self.color {
            println!("{}", painted.bold());
        } else {
            println!("{}", painted);
        }
    }

    pub fn success(&self, message: &str) {
        self.line(message, Tone::Good);
    }

    pub fn warning(&self, message: &str) {
        self.line(message, Tone::Notice);
    }

    pub fn info(&self, message: &str) {
        self.line(message, Tone::Note);
    }

    pub fn format_trial_state(&self, state: &TrialState) -> String {
        let tone = match state {
            TrialState::Valid { .. } => Tone::Good,
            TrialState::Expired { .. } => Tone::Bad,
            TrialState::Unprotected => Tone::Muted,
            TrialState::Malformed => Tone::Notice,
        };
        self.paint(state.label(), tone)
    }

    pub fn format_check(&self, ok: bool) -> String {
        if ok {
            self.paint("yes", Tone::Good)
        } else {
            self.paint("no", Tone::Bad)
        }
    }

    /// One `label: status` line per artifact in a directory listing
    pub fn status(&self, label: &str, status: &str, is_good: bool) {
        let tone = if is_good { Tone::Good } else { Tone::Bad };
        println!("{}: {}", label, self.paint(status, tone));
    }

    /// Boxed block of `label: value` rows
    pub fn card(&self, title: &str, rows: Vec<(&str, String)>) {
        let inner = usize::from(self.term.size().1)
            .saturating_sub(6)
            .clamp(48, 98);

        println!("╭{}╮", "─".repeat(inner));
        let title_text = if self.color {
            title.cyan().bold().to_string()
        } else {
            title.to_string()
        };
        println!("│ {}{}│", title_text, pad(measure_text_width(title) + 1, inner));
        println!("├{}┤", "─".repeat(inner));

        for (label, value) in rows {
            let used = measure_text_width(label) + measure_text_width(&value) + 3;
            println!(
                "│ {}: {}{}│",
                self.paint(label, Tone::Muted),
                value,
                pad(used, inner)
            );
        }

        println!("╰{}╯", "─".repeat(inner));
        println!();
    }
}

/// Spaces filling a row of `inner` columns after `used` columns, at least one
fn pad(used: usize, inner: usize) -> String {
    " ".repeat(inner.saturating_sub(used).max(1))
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}
