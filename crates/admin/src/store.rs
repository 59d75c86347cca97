//! Per-request holder for fetched data.
//!
//! Page handlers fetch everything they render up front. A failed fetch is
//! logged and replaced by empty data plus a generic message, so the page
//! still renders with an error banner instead of failing outright.

use std::fmt::Display;

/// Data fetched for one page render, with a generic error flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fetched<T> {
    pub data: T,
    pub error: Option<String>,
}

impl<T: Default> Fetched<T> {
    /// Wrap a fetch result; `what` names the data in the error message.
    pub fn from_result<E: Display>(result: Result<T, E>, what: &str) -> Self {
        match result {
            Ok(data) => Self { data, error: None },
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch {what}");
                Self {
                    data: T::default(),
                    error: Some(format!("Failed to fetch {what}")),
                }
            }
        }
    }

    #[must_use]
    pub const fn failed(&self) -> bool {
        self.error.is_some()
    }
}
