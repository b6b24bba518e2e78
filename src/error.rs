//! Error types for wachat.
//!
//! Only archive and transcript I/O failures are errors. Everything that can
//! go wrong inside a single message (bad timestamp, corrupt media) degrades
//! that message's fields instead and never reaches this type.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for wachat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    // =========================================================================
    // Archive Errors
    // =========================================================================
    /// No file at the given path.
    #[error("Archive not found at '{path}'")]
    ArchiveNotFound { path: PathBuf },

    /// The file exists but is not a readable ZIP container.
    #[error("Could not read '{path}' as a ZIP archive: {source}")]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The transcript entry was found but could not be read.
    #[error("Could not read chat transcript '{entry}': {source}")]
    TranscriptUnreadable {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path-specific IO error with context.
    #[error("Failed to {operation} '{path}': {source}")]
    PathError {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration in '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Invalid environment variable {var}: {reason}")]
    EnvVar { var: String, reason: String },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for wachat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

impl ChatError {
    pub fn archive_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ArchiveNotFound { path: path.into() }
    }

    pub fn archive_unreadable(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::ArchiveUnreadable {
            path: path.into(),
            source,
        }
    }

    pub fn transcript_unreadable(entry: impl Into<String>, source: std::io::Error) -> Self {
        Self::TranscriptUnreadable {
            entry: entry.into(),
            source,
        }
    }

    pub fn path_error(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::PathError {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a suggestion for how to fix this error, if applicable.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ArchiveNotFound { .. } => {
                Some("Check the path. Exports are named like 'WhatsApp Chat with <name>.zip'.")
            }
            Self::ArchiveUnreadable { .. } => Some(
                "Re-export the chat from WhatsApp (Export chat > Attach media) and pass the .zip file unchanged.",
            ),
            Self::TranscriptUnreadable { .. } => {
                Some("The archive may be truncated; try exporting the chat again.")
            }
            Self::Config { .. } => {
                Some("Run 'wachat config --show' to see the active configuration.")
            }
            _ => None,
        }
    }
}

// =============================================================================
// CLI Error Formatting Utilities
// =============================================================================

use colored::Colorize;

/// Format a structured CLI error with explanation and suggestions.
#[must_use]
pub fn format_error(title: &str, explanation: &str, suggestions: &[&str]) -> String {
    use std::fmt::Write;

    let mut output = format!("{} {}", "✗".red().bold(), title.bold());

    if !explanation.is_empty() {
        let _ = write!(output, "\n\n   {explanation}");
    }

    if !suggestions.is_empty() {
        output.push_str("\n\n   ");
        if suggestions.len() == 1 {
            let _ = write!(output, "{} {}", "Hint:".cyan(), suggestions[0]);
        } else {
            let _ = write!(output, "{}:", "Try".cyan());
            for suggestion in suggestions {
                let _ = write!(output, "\n     {} {}", "•".dimmed(), suggestion);
            }
        }
    }

    output
}

/// Render a [`ChatError`] for the terminal, including its suggestion.
#[must_use]
pub fn format_chat_error(err: &ChatError) -> String {
    let title = match err {
        ChatError::ArchiveNotFound { .. } => "Archive not found",
        ChatError::ArchiveUnreadable { .. } => "Not a chat export",
        ChatError::TranscriptUnreadable { .. } => "Transcript unreadable",
        ChatError::Config { .. } | ChatError::EnvVar { .. } => "Configuration error",
        _ => "Error",
    };
    let suggestions: Vec<&str> = err.suggestion().into_iter().collect();
    format_error(title, &err.to_string(), &suggestions)
}

/// Levenshtein edit distance, for "did you mean?" hints.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}

/// Closest candidate within `max_distance` (default 2), excluding exact
/// matches.
#[must_use]
pub fn find_closest_match<'a>(
    input: &str,
    candidates: &[&'a str],
    max_distance: Option<usize>,
) -> Option<&'a str> {
    let max_dist = max_distance.unwrap_or(2);
    let input_lower = input.to_lowercase();

    candidates
        .iter()
        .map(|&candidate| {
            let distance = levenshtein_distance(&input_lower, &candidate.to_lowercase());
            (candidate, distance)
        })
        .filter(|(_, distance)| *distance <= max_dist && *distance > 0)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Output formats accepted by `--format` and `output.format`.
pub const VALID_OUTPUT_FORMATS: &[&str] = &["text", "json", "json-pretty", "compact", "csv"];
