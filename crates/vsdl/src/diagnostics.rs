//! Routes session diagnostics to the caller's sink, or to `log` when none is set.

use crate::config::LogSink;
use log::Level;
use vsdl_affine::Severity;

const TARGET: &str = "vsdl";

#[derive(Clone, Default)]
pub(crate) struct Diagnostics {
    sink: Option<LogSink>,
}

impl Diagnostics {
    pub(crate) fn new(sink: Option<LogSink>) -> Self {
        Self { sink }
    }

    pub(crate) fn emit(&self, level: Level, message: &str) {
        match &self.sink {
            Some(sink) => sink(level, message),
            None => log::log!(target: TARGET, level, "{}", message),
        }
    }

    pub(crate) fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }

    pub(crate) fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    pub(crate) fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    /// Executor report hook target.
    pub(crate) fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => self.debug(message),
            Severity::Info => self.info(message),
            Severity::Warn => self.warn(message),
            Severity::Fatal => self.emit(Level::Error, &format!("FATAL: {}", message)),
        }
    }
}
