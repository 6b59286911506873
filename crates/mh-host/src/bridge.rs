//! Contract to the host engine's log and abort primitives.

use mh_core::Verbosity;
use tracing::{error, info};

/// What the host engine provides: a text log and a way to stop the run.
///
/// Text arrives fully formatted, one line per call. Implementations decide
/// on truncation; the adapter never writes files or exits the process.
pub trait HostBridge {
    fn append_log(&mut self, text: &str);

    /// Stop the simulation. Called once, after every instance is cleaned up.
    fn abort(&mut self, reason: &str);
}

impl<B: HostBridge + ?Sized> HostBridge for &mut B {
    fn append_log(&mut self, text: &str) {
        (**self).append_log(text);
    }

    fn abort(&mut self, reason: &str) {
        (**self).abort(reason);
    }
}

/// Forwards host output to `tracing`, for running without a host engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingBridge;

impl HostBridge for TracingBridge {
    fn append_log(&mut self, text: &str) {
        info!(target: "host_log", "{text}");
    }

    fn abort(&mut self, reason: &str) {
        error!(target: "host_log", "simulation aborted: {reason}");
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingBridge {
    pub lines: Vec<String>,
    pub aborts: Vec<String>,
}

impl RecordingBridge {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl HostBridge for RecordingBridge {
    fn append_log(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }

    fn abort(&mut self, reason: &str) {
        self.aborts.push(reason.to_owned());
    }
}

/// A bridge paired with the current verbosity.
pub struct HostLog<'a> {
    bridge: &'a mut dyn HostBridge,
    verbosity: Verbosity,
}

impl<'a> HostLog<'a> {
    pub fn new(bridge: &'a mut dyn HostBridge, verbosity: Verbosity) -> Self {
        Self { bridge, verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Append unconditionally.
    pub fn line(&mut self, text: &str) {
        self.bridge.append_log(text);
    }

    /// Append when verbosity is at least `Info`.
    pub fn info(&mut self, text: &str) {
        self.at(Verbosity::Info, text);
    }

    /// Append when verbosity is `Debug`.
    pub fn debug(&mut self, text: &str) {
        self.at(Verbosity::Debug, text);
    }

    fn at(&mut self, required: Verbosity, text: &str) {
        if self.verbosity.shows(required) {
            self.bridge.append_log(text);
        }
    }

    pub fn abort(&mut self, reason: &str) {
        self.bridge.abort(reason);
    }
}
