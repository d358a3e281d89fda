//! Access log formatter for finished HTTP exchanges.
//!
//! [`AccessLogger`] turns one [`ExchangeRecord`] (request, response, timing,
//! optional principal) into one log line and, optionally, into structured
//! key-values attached to the same event.
//!
//! # Examples:
//! ## By default the logger writes through the standard `log` crate.
//! ```bash
//! cargo add actix-web-exchange-logger
//! ```
//! Example usage with `structured_logger` as the JSON backend:
//! ```rust
//! use std::time::Duration;
//!
//! use actix_web::http::{Method, StatusCode};
//! use actix_web_exchange_logger::{AccessLogger, ExchangeRecord, ExchangeRepository, Request, Response};
//! use structured_logger::{Builder, json::new_writer};
//! use time::OffsetDateTime;
//!
//! Builder::new()
//!     .with_target_writer("*", new_writer(std::io::stdout()))
//!     .init();
//!
//! let logger = AccessLogger::builder()
//!     .add_structured_fields(true)
//!     .build()
//!     .unwrap();
//!
//! let record = ExchangeRecord::new(
//!     OffsetDateTime::now_utc(),
//!     Request::new(Method::GET, "https://example.com")
//!         .with_remote_address("127.0.0.1")
//!         .with_header("user-agent", "mock"),
//!     Response::new(StatusCode::OK),
//! )
//! .with_time_taken(Duration::from_millis(12));
//!
//! logger.add(&record).unwrap();
//! ```
//! ## Records from actix-web
//! A finished `ServiceResponse` can be turned into a record with
//! [`ExchangeRecord::from_service_response`].
//!
//! # Output
//!
//! Fields are written in a fixed order and skipped when unknown:
//!
//! - `remote` - Client address
//! - `user` - Principal name
//! - `ts` - Exchange timestamp, ISO-8601 in UTC
//! - `method` - HTTP method
//! - `url` - Request URL
//! - `response_code` - Response status code
//! - `referer` - First `Referer` header value
//! - `user_agent` - First `User-Agent` header value
//! - `duration` - Elapsed time in milliseconds
//!
//! ```text
//! remote=127.0.0.1 ts="2024-05-16T00:00:00Z" method=GET url="https://example.com" response_code=200 user_agent="mock" duration=1000
//! ```
//!
//! # Configuration
//!
//! ```rust
//! use actix_web_exchange_logger::{AccessLogger, AccessEvent, ExchangeRecord, ExcludePaths};
//!
//! let logger = AccessLogger::builder()
//!     .filter(ExcludePaths::new().exclude("/health").exclude_regex(r"^/assets/.*").unwrap())
//!     .logger_name("http_access")           // log target, `accesslog` by default
//!     .level(log::Level::Info)              // severity of every event
//!     .add_structured_fields(true)          // also attach fields as key-values
//!     .empty_text_message(true)             // key-values only, no text line
//!     .event_customizer(|event: &mut AccessEvent, record: &ExchangeRecord| {
//!         if let Some(id) = record.request.headers.first("x-request-id") {
//!             event.add_key_value("x-request-id", id);
//!         }
//!     })
//!     .build()
//!     .unwrap();
//! ```
//!
//! `empty_text_message(true)` without `add_structured_fields(true)` is rejected
//! by [`AccessLoggerBuilder::build`].

mod error;
mod event;
mod exchange;
mod filter;
mod logger;
mod wrapper;

pub use crate::error::{Error, Result};
pub use crate::event::{AccessEvent, EventCustomizer, LogCustomizer, Value};
pub use crate::exchange::{ExchangeRecord, Headers, Principal, Request, Response};
pub use crate::filter::{ExchangeFilter, ExcludePaths};
pub use crate::logger::{AccessLogger, AccessLoggerBuilder, ExchangeRepository};
pub use crate::wrapper::{LogSink, MemorySink, Sink};
