//! A reporting seam for the app-load chunk stream, so a CLI can draw a
//! progress bar without the protocol client knowing anything about
//! terminals.

/// Told about the size of the upload up front, then about each chunk as
/// it is sent.
pub trait ProgressReporter {
    fn start(&mut self, total_bytes: usize);
    fn advance(&mut self, bytes: usize);
    fn finish(&mut self);
}

/// A no-op reporter, used by default for headless/daemon use.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start(&mut self, _total_bytes: usize) {}
    fn advance(&mut self, _bytes: usize) {}
    fn finish(&mut self) {}
}
