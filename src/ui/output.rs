//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Everything tfi itself prints goes to stderr and respects the quiet flag,
//! so stdout carries only the output of the Terraform process it runs.

use std::fmt::Display;

/// Marker leading every fatal error line.
pub const ERROR_MARKER: &str = "ERROR:";

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet mode - errors only
    Quiet,
    /// Normal mode - progress lines
    #[default]
    Normal,
    /// Debug mode - progress plus detail
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a progress line (respects quiet mode).
pub fn progress(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("{}", message);
    }
}

/// Print a detail line (only in debug mode).
pub fn detail(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("  {}", message);
    }
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a fatal error (always shown).
pub fn error(message: impl Display) {
    eprintln!("{}", format_error(message));
}

/// Format a fatal error line.
pub fn format_error(message: impl Display) -> String {
    format!("{} {}", ERROR_MARKER, message)
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
