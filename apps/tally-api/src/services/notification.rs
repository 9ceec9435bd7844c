//! Notification dispatch.
//!
//! Lifecycle operations announce new storefront orders and quotes after
//! their unit of work has committed. Delivery happens on a spawned task:
//! a slow or failing sink never holds up the response and never undoes
//! the committed document.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use tally_core::{Document, DocumentType, Money};

/// Event emitted after a document has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DocumentEvent {
    NewOrder {
        document_id: i64,
        customer_email: Option<String>,
        total: Money,
    },
    NewQuote {
        document_id: i64,
        customer_email: Option<String>,
        total: Money,
    },
}

impl DocumentEvent {
    /// Event for a freshly created document, if its type announces one.
    pub fn for_created(doc: &Document, customer_email: Option<String>) -> Option<Self> {
        match doc.doc_type {
            DocumentType::Order => Some(DocumentEvent::NewOrder {
                document_id: doc.id,
                customer_email,
                total: doc.total(),
            }),
            DocumentType::Quote => Some(DocumentEvent::NewQuote {
                document_id: doc.id,
                customer_email,
                total: doc.total(),
            }),
            DocumentType::Invoice => None,
        }
    }

    pub fn document_id(&self) -> i64 {
        match self {
            DocumentEvent::NewOrder { document_id, .. }
            | DocumentEvent::NewQuote { document_id, .. } => *document_id,
        }
    }
}

/// Delivery failure reported by a sink.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Receiver of document events (email dispatch lives behind this).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &DocumentEvent) -> Result<(), NotificationError>;
}

/// Sink that only records events in the log.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationSink for TracingNotifier {
    async fn notify(&self, event: &DocumentEvent) -> Result<(), NotificationError> {
        info!(document_id = event.document_id(), event = ?event, "Document notification");
        Ok(())
    }
}

/// Fire-and-forget dispatcher around a sink.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Notifier { sink }
    }

    /// Hands the event to the sink on a background task.
    pub fn dispatch(&self, event: DocumentEvent) {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.notify(&event).await {
                warn!(document_id = event.document_id(), error = %e, "Notification failed");
            }
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Notifier::new(Arc::new(TracingNotifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct ChannelSink(mpsc::UnboundedSender<DocumentEvent>);

    #[async_trait]
    impl NotificationSink for ChannelSink {
        async fn notify(&self, event: &DocumentEvent) -> Result<(), NotificationError> {
            self.0
                .send(event.clone())
                .map_err(|e| NotificationError::Delivery(e.to_string()))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn notify(&self, _event: &DocumentEvent) -> Result<(), NotificationError> {
            Err(NotificationError::Delivery("smtp down".into()))
        }
    }

    fn event() -> DocumentEvent {
        DocumentEvent::NewOrder {
            document_id: 3,
            customer_email: Some("ana@example.com".into()),
            total: Money::from_cents(1150),
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = Notifier::new(Arc::new(ChannelSink(tx)));

        notifier.dispatch(event());

        assert_eq!(rx.recv().await, Some(event()));
    }

    #[tokio::test]
    async fn test_failing_sink_is_swallowed() {
        let notifier = Notifier::new(Arc::new(FailingSink));
        notifier.dispatch(event());
        tokio::task::yield_now().await;
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(event()).unwrap();
        assert_eq!(json["event"], "new_order");
        assert_eq!(json["document_id"], 3);
    }
}
