use std::fmt;

use crate::{layout::CourseField, result_parser::ParseDiagnostics};

/// Why a result lookup failed. Every variant ends the request; nothing is retried.
#[derive(Debug)]
pub enum FetchError {
    /// The login page no longer carries the token script.
    TokenNotFound,
    /// The portal refused the session or token.
    AuthorizationDenied,
    /// The result page parsed but held no course rows.
    NoResultsFound(ParseDiagnostics),
    /// The course table header no longer lines up with the column layout.
    LayoutMismatch {
        field: CourseField,
        index: usize,
        found: String,
    },
    /// Network, timeout or non-success HTTP status from the portal.
    Transport(reqwest::Error),
    Unclassified(anyhow::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::TokenNotFound => {
                write!(f, "Could not find security token on portal page.")
            }
            FetchError::AuthorizationDenied => write!(
                f,
                "Portal denied authorization (Session expired or blocked)."
            ),
            FetchError::NoResultsFound(diagnostics) => {
                write!(f, "No course results found. Debug: {diagnostics}")
            }
            FetchError::LayoutMismatch {
                field,
                index,
                found,
            } => write!(
                f,
                "Result table layout changed: expected '{field}' header at column {index}, found '{found}'."
            ),
            FetchError::Transport(e) => write!(f, "Failed to fetch from portal: {e}"),
            FetchError::Unclassified(e) => write!(f, "Scraping error: {e}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport(e) => Some(e),
            FetchError::Unclassified(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e)
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(e: anyhow::Error) -> Self {
        FetchError::Unclassified(e)
    }
}
