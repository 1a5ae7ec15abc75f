//! Event pipeline: from an object notification to a rendered, tracked image.
//!
//! Every event runs the same sequence:
//!
//! ```text
//! screen -> workspace -> download -> render -> upload -> [mark -> aggregate -> notify] -> cleanup
//! ```
//!
//! Screening rejects or ignores an event before any side effect. Once a
//! workspace exists it is removed on every exit path. Failures are reported in
//! the returned `EventReport`; callers acknowledge the event regardless.

mod error;
mod event;
mod processor;
mod types;

pub use error::{InputError, PipelineError};
pub use event::{ConversionEvent, ObjectDescriptor, PushEnvelope, PushMessage, TriggerSource};
pub use processor::{EventPipeline, ScreenedEvent};
pub use types::{EventOutcome, EventReport, Stage, TrackingOutcome};
