use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::event::{AccessEvent, Value};

/// Logging backend that receives finished access events.
///
/// Serialization, buffering and delivery are up to the sink; the formatter only
/// decides content. Errors returned from [`dispatch`](Sink::dispatch) are passed
/// through to the caller of `add` untouched.
pub trait Sink: Send + Sync {
    /// Whether an event for `target` at `level` would be kept.
    fn enabled(&self, target: &str, level: log::Level) -> bool;

    fn dispatch(&self, event: &AccessEvent) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn enabled(&self, target: &str, level: log::Level) -> bool {
        (**self).enabled(target, level)
    }

    fn dispatch(&self, event: &AccessEvent) -> Result<()> {
        (**self).dispatch(event)
    }
}

/// Sink forwarding to the `log` facade.
///
/// The logger name becomes the record target and every structured field is
/// passed as a `log` key-value, keeping strings and integers typed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn enabled(&self, target: &str, level: log::Level) -> bool {
        level <= log::max_level()
            && log::logger().enabled(
                &log::Metadata::builder()
                    .level(level)
                    .target(target)
                    .build(),
            )
    }

    fn dispatch(&self, event: &AccessEvent) -> Result<()> {
        let kvs: Vec<(&str, log::kv::Value)> = event
            .fields()
            .iter()
            .map(|(k, v)| (k.as_ref(), to_kv_value(v)))
            .collect();
        let kvs = kvs.as_slice();

        log::logger().log(
            &log::Record::builder()
                .args(format_args!("{}", event.message()))
                .level(event.level())
                .target(event.target())
                .module_path_static(Some(module_path!()))
                .file_static(Some(file!()))
                .line(Some(line!()))
                .key_values(&kvs)
                .build(),
        );
        Ok(())
    }
}

fn to_kv_value(value: &Value) -> log::kv::Value<'_> {
    match value {
        Value::Str(s) => log::kv::Value::from(s.as_str()),
        Value::Int(n) => log::kv::Value::from(*n),
        Value::Timestamp(_) => log::kv::Value::from_display(value),
    }
}

/// Sink that keeps every dispatched event in memory.
///
/// Meant for tests of the formatter and of customizers.
#[derive(Debug)]
pub struct MemorySink {
    max_level: log::LevelFilter,
    events: Mutex<Vec<AccessEvent>>,
}

impl Default for MemorySink {
    fn default() -> Self {
        MemorySink::new()
    }
}

impl MemorySink {
    /// Capture events of every level.
    pub fn new() -> Self {
        MemorySink::with_max_level(log::LevelFilter::Trace)
    }

    pub fn with_max_level(max_level: log::LevelFilter) -> Self {
        MemorySink {
            max_level,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the captured events, oldest first.
    pub fn events(&self) -> Vec<AccessEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return the captured events.
    pub fn take(&self) -> Vec<AccessEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Sink for MemorySink {
    fn enabled(&self, _target: &str, level: log::Level) -> bool {
        level <= self.max_level
    }

    fn dispatch(&self, event: &AccessEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}
