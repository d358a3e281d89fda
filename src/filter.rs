use std::collections::HashSet;

use actix_web::http::Uri;
use regex::Regex;

use crate::error::Result;
use crate::exchange::ExchangeRecord;

/// Decides whether an exchange is logged at all.
pub trait ExchangeFilter: Send + Sync {
    fn accept(&self, record: &ExchangeRecord) -> bool;
}

impl<F> ExchangeFilter for F
where
    F: Fn(&ExchangeRecord) -> bool + Send + Sync,
{
    fn accept(&self, record: &ExchangeRecord) -> bool {
        self(record)
    }
}

/// Filter that drops exchanges by request path.
///
/// # Examples
/// ```rust
/// use actix_web_exchange_logger::{AccessLogger, ExcludePaths};
///
/// let filter = ExcludePaths::new()
///     .exclude("/health")
///     .exclude_regex(r"^/assets/.*")
///     .unwrap();
/// let logger = AccessLogger::with_filter(filter);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExcludePaths {
    exclude: HashSet<String>,
    exclude_regex: Vec<Regex>,
}

impl ExcludePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not log exchanges for exactly this path.
    pub fn exclude<T: Into<String>>(mut self, path: T) -> Self {
        self.exclude.insert(path.into());
        self
    }

    /// Do not log exchanges whose path matches `pattern`.
    pub fn exclude_regex<T: AsRef<str>>(mut self, pattern: T) -> Result<Self> {
        self.exclude_regex.push(Regex::new(pattern.as_ref())?);
        Ok(self)
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude.contains(path) || self.exclude_regex.iter().any(|r| r.is_match(path))
    }
}

impl ExchangeFilter for ExcludePaths {
    fn accept(&self, record: &ExchangeRecord) -> bool {
        let uri = &record.request.uri;
        match uri.parse::<Uri>() {
            Ok(parsed) => !self.is_excluded(parsed.path()),
            Err(_) => !self.is_excluded(uri),
        }
    }
}
