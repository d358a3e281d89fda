use std::{borrow::Cow, fmt::Write, sync::Arc};

use crate::error::{Error, Result};
use crate::event::{AccessEvent, EventCustomizer, LogCustomizer, Value};
use crate::exchange::ExchangeRecord;
use crate::filter::ExchangeFilter;
use crate::wrapper::{LogSink, Sink};

const DEFAULT_LOGGER_NAME: &str = "accesslog";

/// Storage interface the web framework hands finished exchanges to.
pub trait ExchangeRepository {
    /// Previously added exchanges.
    fn find_all(&self) -> Vec<ExchangeRecord>;

    fn add(&self, record: &ExchangeRecord) -> Result<()>;
}

/// Access logger writing one line per finished HTTP exchange.
///
/// Each exchange is turned into a message like
/// `remote=127.0.0.1 ts="2024-05-16T00:00:00Z" method=GET url="https://example.com" response_code=200 user_agent="mock" duration=1000`
/// and, when enabled, the same fields as structured key-values.
///
/// The logger keeps no history: [`find_all`](ExchangeRepository::find_all) is
/// always empty. It is cheap to clone and safe to share between workers.
///
/// # Examples
/// ```rust
/// use actix_web_exchange_logger::AccessLogger;
///
/// let logger = AccessLogger::builder()
///     .logger_name("http_access")
///     .level(log::Level::Debug)
///     .add_structured_fields(true)
///     .build()
///     .unwrap();
/// assert_eq!(logger.logger_name(), "http_access");
/// ```
pub struct AccessLogger<S = LogSink>(Arc<Inner<S>>);

impl<S> Clone for AccessLogger<S> {
    fn clone(&self) -> Self {
        AccessLogger(Arc::clone(&self.0))
    }
}

struct Inner<S> {
    filter: Box<dyn ExchangeFilter>,
    log_customizer: Option<Box<dyn LogCustomizer>>,
    event_customizer: Option<Box<dyn EventCustomizer>>,
    logger_name: Cow<'static, str>,
    level: log::Level,
    add_structured_fields: bool,
    empty_text_message: bool,
    sink: S,
}

#[derive(Clone, Copy)]
enum Style {
    Bare,
    Quoted,
}

fn accept_all(_: &ExchangeRecord) -> bool {
    true
}

impl AccessLogger<LogSink> {
    pub fn builder() -> AccessLoggerBuilder<LogSink> {
        AccessLoggerBuilder::new()
    }

    /// Logger with default settings, writing through the `log` crate.
    pub fn new() -> Self {
        AccessLogger(Arc::new(AccessLoggerBuilder::new().into_inner()))
    }

    /// Default logger that only writes exchanges accepted by `filter`.
    pub fn with_filter<F: ExchangeFilter + 'static>(filter: F) -> Self {
        AccessLogger(Arc::new(AccessLoggerBuilder::new().filter(filter).into_inner()))
    }
}

impl Default for AccessLogger<LogSink> {
    fn default() -> Self {
        AccessLogger::new()
    }
}

impl<S: Sink> AccessLogger<S> {
    pub fn logger_name(&self) -> &str {
        &self.0.logger_name
    }

    pub fn level(&self) -> log::Level {
        self.0.level
    }

    pub fn adds_structured_fields(&self) -> bool {
        self.0.add_structured_fields
    }

    pub fn empty_text_message(&self) -> bool {
        self.0.empty_text_message
    }

    pub fn sink(&self) -> &S {
        &self.0.sink
    }
}

impl<S: Sink> ExchangeRepository for AccessLogger<S> {
    fn find_all(&self) -> Vec<ExchangeRecord> {
        Vec::new()
    }

    fn add(&self, record: &ExchangeRecord) -> Result<()> {
        let inner = &*self.0;
        if !inner.sink.enabled(&inner.logger_name, inner.level) {
            return Ok(());
        }
        if !inner.filter.accept(record) {
            log::trace!(
                "exchange filtered out: {} {}",
                record.request.method,
                record.request.uri
            );
            return Ok(());
        }

        let request = &record.request;
        let mut message = String::new();
        let mut event = AccessEvent::new(inner.logger_name.clone(), inner.level);

        if let Some(remote) = &request.remote_address {
            inner.render(&mut message, &mut event, "remote", remote.as_str(), Style::Bare);
        }
        if let Some(principal) = &record.principal {
            inner.render(&mut message, &mut event, "user", principal.name.as_str(), Style::Quoted);
        }
        inner.render(&mut message, &mut event, "ts", record.timestamp, Style::Quoted);
        inner.render(&mut message, &mut event, "method", request.method.as_str(), Style::Bare);
        inner.render(&mut message, &mut event, "url", request.uri.as_str(), Style::Quoted);
        inner.render(
            &mut message,
            &mut event,
            "response_code",
            record.response.status.as_u16(),
            Style::Bare,
        );
        if let Some(referer) = request.headers.first("referer") {
            inner.render(&mut message, &mut event, "referer", referer, Style::Quoted);
        }
        if let Some(user_agent) = request.headers.first("user-agent") {
            inner.render(&mut message, &mut event, "user_agent", user_agent, Style::Quoted);
        }
        if let Some(time_taken) = record.time_taken {
            let millis = u64::try_from(time_taken.as_millis()).unwrap_or(u64::MAX);
            inner.render(&mut message, &mut event, "duration", millis, Style::Bare);
        }

        if let Some(customizer) = &inner.log_customizer {
            customizer.customize(&mut message, record);
        }
        if let Some(customizer) = &inner.event_customizer {
            customizer.customize(&mut event, record);
        }

        event.set_message(message.trim().to_string());
        inner.sink.dispatch(&event)
    }
}

impl<S> Inner<S> {
    fn render(
        &self,
        message: &mut String,
        event: &mut AccessEvent,
        key: &'static str,
        value: impl Into<Value>,
        style: Style,
    ) {
        let value = value.into();
        if !self.empty_text_message {
            // `Value` always renders, so writing into a String cannot fail.
            let _ = match style {
                Style::Bare => write!(message, "{}={} ", key, value),
                Style::Quoted => write!(message, "{}=\"{}\" ", key, value),
            };
        }
        if self.add_structured_fields {
            event.add_key_value(key, value);
        }
    }
}

/// Builder for [`AccessLogger`].
///
/// Defaults: every exchange accepted, no customizers, logger name `accesslog`,
/// level `Info`, text message only, `log` crate sink.
pub struct AccessLoggerBuilder<S = LogSink> {
    filter: Option<Box<dyn ExchangeFilter>>,
    log_customizer: Option<Box<dyn LogCustomizer>>,
    event_customizer: Option<Box<dyn EventCustomizer>>,
    logger_name: Option<Cow<'static, str>>,
    level: Option<log::Level>,
    add_structured_fields: bool,
    empty_text_message: bool,
    sink: S,
}

impl AccessLoggerBuilder<LogSink> {
    pub fn new() -> Self {
        AccessLoggerBuilder {
            filter: None,
            log_customizer: None,
            event_customizer: None,
            logger_name: None,
            level: None,
            add_structured_fields: false,
            empty_text_message: false,
            sink: LogSink,
        }
    }
}

impl Default for AccessLoggerBuilder<LogSink> {
    fn default() -> Self {
        AccessLoggerBuilder::new()
    }
}

impl<S: Sink> AccessLoggerBuilder<S> {
    /// Only log exchanges for which `filter` returns true.
    pub fn filter<F: ExchangeFilter + 'static>(mut self, filter: F) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Append extra text to the message after the built-in fields.
    ///
    /// ```rust
    /// use actix_web_exchange_logger::{AccessLogger, ExchangeRecord};
    ///
    /// let logger = AccessLogger::builder()
    ///     .log_customizer(|message: &mut String, record: &ExchangeRecord| {
    ///         if let Some(id) = record.request.headers.first("x-request-id") {
    ///             message.push_str("x_request_id=");
    ///             message.push_str(id);
    ///         }
    ///     })
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn log_customizer<C: LogCustomizer + 'static>(mut self, customizer: C) -> Self {
        self.log_customizer = Some(Box::new(customizer));
        self
    }

    /// Attach extra structured fields after the built-in ones.
    pub fn event_customizer<C: EventCustomizer + 'static>(mut self, customizer: C) -> Self {
        self.event_customizer = Some(Box::new(customizer));
        self
    }

    /// Sets the log target events are emitted under. Defaults to `accesslog`.
    pub fn logger_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.logger_name = Some(name.into());
        self
    }

    pub fn level(mut self, level: log::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Also attach every field as a structured key-value.
    pub fn add_structured_fields(mut self, enabled: bool) -> Self {
        self.add_structured_fields = enabled;
        self
    }

    /// Leave the text message empty and carry fields as key-values only.
    ///
    /// Requires [`add_structured_fields`](Self::add_structured_fields).
    pub fn empty_text_message(mut self, enabled: bool) -> Self {
        self.empty_text_message = enabled;
        self
    }

    /// Replace the sink events are dispatched to.
    pub fn sink<T: Sink>(self, sink: T) -> AccessLoggerBuilder<T> {
        AccessLoggerBuilder {
            filter: self.filter,
            log_customizer: self.log_customizer,
            event_customizer: self.event_customizer,
            logger_name: self.logger_name,
            level: self.level,
            add_structured_fields: self.add_structured_fields,
            empty_text_message: self.empty_text_message,
            sink,
        }
    }

    pub fn build(self) -> Result<AccessLogger<S>> {
        if self.empty_text_message && !self.add_structured_fields {
            return Err(Error::InvalidConfig(
                "'empty_text_message' can be true only when 'add_structured_fields' is true",
            ));
        }
        Ok(AccessLogger(Arc::new(self.into_inner())))
    }

    fn into_inner(self) -> Inner<S> {
        Inner {
            filter: self.filter.unwrap_or_else(|| Box::new(accept_all)),
            log_customizer: self.log_customizer,
            event_customizer: self.event_customizer,
            logger_name: self
                .logger_name
                .unwrap_or(Cow::Borrowed(DEFAULT_LOGGER_NAME)),
            level: self.level.unwrap_or(log::Level::Info),
            add_structured_fields: self.add_structured_fields,
            empty_text_message: self.empty_text_message,
            sink: self.sink,
        }
    }
}
