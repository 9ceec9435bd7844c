//! Service layer.
//!
//! Services own the unit-of-work boundaries; handlers only translate
//! between HTTP bodies and service calls.

pub mod lifecycle;
pub mod notification;
pub mod shift;

pub use lifecycle::{CreateDocument, DocumentDetail, DocumentLifecycle};
pub use notification::{DocumentEvent, NotificationError, NotificationSink, Notifier, TracingNotifier};
pub use shift::{ClosePrevious, ShiftReport, ShiftService, ShiftStart};
