pub mod memory;
pub mod xml;

use std::io;

use glove_core::Gesture;

pub use memory::MemorySink;
pub use xml::{XmlFileSink, XmlStreamSink};

/// Failure to hand one cycle's gesture downstream.
#[derive(Debug, thiserror::Error)]
#[error("unable to write gesture to {target}")]
pub struct OutputWriteError {
    /// Where the gesture was going: a file path or a stream name.
    pub target: String,
    #[source]
    pub source: io::Error,
}

/// Destination for finished gestures, one call per cycle.
pub trait GestureSink {
    fn emit(&mut self, gesture: &Gesture) -> Result<(), OutputWriteError>;
}

impl<S: GestureSink + ?Sized> GestureSink for Box<S> {
    fn emit(&mut self, gesture: &Gesture) -> Result<(), OutputWriteError> {
        (**self).emit(gesture)
    }
}
