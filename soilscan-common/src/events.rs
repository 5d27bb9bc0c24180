//! Event types and broadcast bus for SoilScan
//!
//! Analysis progress is broadcast as [`AnalysisEvent`] values over an
//! [`EventBus`] (a `tokio::sync::broadcast` channel) and surfaced to
//! clients via the SSE endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Progress events for a single analysis run
///
/// Events carrying the same `analysis_id` belong to one run. Serialized
/// with a `type` tag for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnalysisEvent {
    /// Analysis accepted and started
    AnalysisStarted {
        analysis_id: Uuid,
        /// "realService" or "demoMode"
        mode: String,
        timestamp: DateTime<Utc>,
    },

    /// Image copied to the remote archive (archive configured only)
    ImageArchived {
        analysis_id: Uuid,
        image_url: String,
        timestamp: DateTime<Utc>,
    },

    /// Remote inference returned a usable prediction list
    PredictionsReceived {
        analysis_id: Uuid,
        prediction_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Analysis finished with a verdict
    AnalysisCompleted {
        analysis_id: Uuid,
        soil_type: String,
        confidence: f64,
        /// History record id, when the save succeeded
        record_id: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Analysis aborted before producing a verdict
    AnalysisFailed {
        analysis_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl AnalysisEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            AnalysisEvent::AnalysisStarted { .. } => "AnalysisStarted",
            AnalysisEvent::ImageArchived { .. } => "ImageArchived",
            AnalysisEvent::PredictionsReceived { .. } => "PredictionsReceived",
            AnalysisEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            AnalysisEvent::AnalysisFailed { .. } => "AnalysisFailed",
        }
    }
}

/// Broadcast bus for analysis events
///
/// Cloning shares the underlying channel. Emitting with no subscribers is
/// not an error at the call sites (events are advisory progress signals).
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AnalysisEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the subscriber count, or an error when nobody is listening.
    pub fn emit(
        &self,
        event: AnalysisEvent,
    ) -> Result<usize, broadcast::error::SendError<AnalysisEvent>> {
        self.tx.send(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(AnalysisEvent::AnalysisStarted {
            analysis_id: Uuid::new_v4(),
            mode: "demoMode".to_string(),
            timestamp: Utc::now(),
        })
        .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "AnalysisStarted");
    }

    #[test]
    fn emit_without_subscribers_is_an_error() {
        let bus = EventBus::new(16);
        let result = bus.emit(AnalysisEvent::AnalysisFailed {
            analysis_id: Uuid::new_v4(),
            reason: "test".to_string(),
            timestamp: Utc::now(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = AnalysisEvent::AnalysisCompleted {
            analysis_id: Uuid::new_v4(),
            soil_type: "loamy".to_string(),
            confidence: 87.5,
            record_id: None,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AnalysisCompleted");
        assert_eq!(json["soil_type"], "loamy");
    }
}
