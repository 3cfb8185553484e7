//! User feedback (the toast channel) as a broadcast of events.

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::error::OperationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    Success(String),
    Error(OperationError),
}

impl FeedbackEvent {
    pub fn message(&self) -> String {
        match self {
            FeedbackEvent::Success(message) => message.clone(),
            FeedbackEvent::Error(err) => err.user_message(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FeedbackEvent::Error(_))
    }
}

/// Cloneable handle; every controller sharing one `Feedback` reports into the
/// same stream.
#[derive(Debug, Clone)]
pub struct Feedback {
    events: broadcast::Sender<FeedbackEvent>,
}

impl Default for Feedback {
    fn default() -> Self {
        Self::new()
    }
}

impl Feedback {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedbackEvent> {
        self.events.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "operation succeeded");
        let _ = self.events.send(FeedbackEvent::Success(message));
    }

    pub fn error(&self, err: OperationError) {
        warn!(error = %err, "operation failed");
        let _ = self.events.send(FeedbackEvent::Error(err));
    }
}
