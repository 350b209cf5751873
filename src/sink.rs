//! Display sink boundary.
//!
//! The UI is an external collaborator: the pipeline hands it one finished
//! display string per analyzed frame and nothing else. Implementations are
//! responsible for marshaling onto whatever execution context their toolkit
//! requires; the worker just calls `display` from its own thread.

/// Receives the rendered result line for each analyzed frame.
pub trait DisplaySink: Send {
    fn display(&self, text: String);
}

impl<F: Fn(String) + Send> DisplaySink for F {
    fn display(&self, text: String) {
        self(text)
    }
}

/// Sink that writes results to the log. Used by the binaries.
#[derive(Debug, Default)]
pub struct LogSink;

impl DisplaySink for LogSink {
    fn display(&self, text: String) {
        log::info!("result: {}", text);
    }
}
