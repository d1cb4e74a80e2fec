use std::sync::{Arc, Mutex};

use procker::process::OutputSink;

/// In-memory output sink whose contents can be read back after a run.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink writing into this buffer; hand it to a process.
    pub fn sink(&self) -> OutputSink {
        OutputSink::shared(Arc::clone(&self.bytes))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes.lock().unwrap().clear();
    }
}
