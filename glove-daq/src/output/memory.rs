use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use glove_core::Gesture;

use super::{GestureSink, OutputWriteError};

/// Keeps every emitted gesture in memory.
/// Clones share the same buffer, so a handle kept aside sees what the
/// driver emitted.
#[derive(Clone, Default)]
pub struct MemorySink {
    gestures: Arc<Mutex<Vec<Gesture>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gestures(&self) -> Vec<Gesture> {
        self.gestures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl GestureSink for MemorySink {
    fn emit(&mut self, gesture: &Gesture) -> Result<(), OutputWriteError> {
        let mut gestures = self.gestures.lock().map_err(|err| OutputWriteError {
            target: "memory".to_owned(),
            source: io::Error::other(err.to_string()),
        })?;
        gestures.push(gesture.clone());
        Ok(())
    }
}
