use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::Error;

/// Structured events for one `Idle -> Refreshing -> Idle` cycle.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    attempt_id: Uuid,
    context: String,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn emit_start(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "refresh.start"
        );
    }

    pub fn emit_success(&self, replayed: usize) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            replayed,
            "refresh.success"
        );
    }

    pub fn emit_failure(&self, error: &Error, rejected: usize) {
        event!(
            Level::ERROR,
            attempt_id = %self.attempt_id,
            context = %self.context,
            error = %error,
            rejected,
            "refresh.failure"
        );
    }
}

/// Logged by a request that found a refresh already in flight.
pub fn emit_queued(path: &str, position: usize) {
    event!(Level::INFO, path = %path, position, "refresh.queued");
}
