use std::borrow::Cow;
use std::fmt;

use time::{OffsetDateTime, UtcOffset};

use crate::exchange::ExchangeRecord;

/// Typed value of a structured field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(u64),
    /// Rendered as ISO-8601 in UTC, e.g. `2024-05-16T00:00:00.500Z`.
    Timestamp(OffsetDateTime),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Timestamp(ts) => write_timestamp(f, *ts),
        }
    }
}

/// Writes `ts` in UTC as `2024-05-16T00:00:00Z`.
///
/// Fractional seconds appear only when non-zero, in groups of 3, 6 or 9 digits
/// (`.500Z`). Years outside `0000..=9999` get an explicit sign, so every
/// representable timestamp has a rendering.
fn write_timestamp<W: fmt::Write>(out: &mut W, ts: OffsetDateTime) -> fmt::Result {
    let ts = ts.to_offset(UtcOffset::UTC);
    let year = ts.year();
    if year.abs() < 1000 {
        if year < 0 {
            write!(out, "-{:04}", -year)?;
        } else {
            write!(out, "{:04}", year)?;
        }
    } else {
        if year > 9999 {
            out.write_char('+')?;
        }
        write!(out, "{}", year)?;
    }
    write!(
        out,
        "-{:02}-{:02}T{:02}:{:02}:{:02}",
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )?;

    match ts.nanosecond() {
        0 => {}
        nanos if nanos % 1_000_000 == 0 => write!(out, ".{:03}", nanos / 1_000_000)?,
        nanos if nanos % 1_000 == 0 => write!(out, ".{:06}", nanos / 1_000)?,
        nanos => write!(out, ".{:09}", nanos)?,
    }
    out.write_char('Z')
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Int(n)
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::Int(n.into())
    }
}

impl From<OffsetDateTime> for Value {
    fn from(ts: OffsetDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

/// One access-log emission: channel, severity, message and key-values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    target: Cow<'static, str>,
    level: log::Level,
    message: String,
    fields: Vec<(Cow<'static, str>, Value)>,
}

impl AccessEvent {
    pub(crate) fn new(target: Cow<'static, str>, level: log::Level) -> Self {
        AccessEvent {
            target,
            level,
            message: String::new(),
            fields: Vec::new(),
        }
    }

    /// Attach a structured field. Fields keep the order they were added in.
    pub fn add_key_value(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub(crate) fn set_message(&mut self, message: String) {
        self.message = message;
    }

    /// Logger name the event is emitted under.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn level(&self) -> log::Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &[(Cow<'static, str>, Value)] {
        &self.fields
    }

    /// First field attached under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Appends extra text to the message of every emitted access log line.
pub trait LogCustomizer: Send + Sync {
    fn customize(&self, message: &mut String, record: &ExchangeRecord);
}

impl<F> LogCustomizer for F
where
    F: Fn(&mut String, &ExchangeRecord) + Send + Sync,
{
    fn customize(&self, message: &mut String, record: &ExchangeRecord) {
        self(message, record)
    }
}

/// Attaches extra structured fields to every emitted access log event.
pub trait EventCustomizer: Send + Sync {
    fn customize(&self, event: &mut AccessEvent, record: &ExchangeRecord);
}

impl<F> EventCustomizer for F
where
    F: Fn(&mut AccessEvent, &ExchangeRecord) + Send + Sync,
{
    fn customize(&self, event: &mut AccessEvent, record: &ExchangeRecord) {
        self(event, record)
    }
}
