//! Bounded output capture.

/// Default number of bytes kept per command.
pub const DEFAULT_OUTPUT_LIMIT: usize = 256 * 1024;

/// Accumulates combined command output up to a fixed byte limit.
///
/// Bytes past the limit are counted but not stored; the rendered text ends
/// with a truncation marker naming how many bytes were dropped.
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    limit: usize,
    bytes: Vec<u8>,
    omitted: usize,
}

impl CaptureBuffer {
    /// Create an empty buffer keeping at most `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            bytes: Vec::new(),
            omitted: 0,
        }
    }

    /// Append a chunk, dropping whatever exceeds the limit.
    pub fn push(&mut self, chunk: &[u8]) {
        let remaining = self.limit.saturating_sub(self.bytes.len());
        let keep = chunk.len().min(remaining);
        self.bytes.extend_from_slice(&chunk[..keep]);
        self.omitted += chunk.len() - keep;
    }

    /// Number of bytes dropped so far.
    pub fn omitted(&self) -> usize {
        self.omitted
    }

    /// Whether any output was dropped.
    pub fn is_truncated(&self) -> bool {
        self.omitted > 0
    }

    /// Render the captured output as text, with a marker if truncated.
    pub fn text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.omitted > 0 {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&truncation_marker(self.omitted));
        }
        text
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_LIMIT)
    }
}

/// The line appended to truncated output.
pub fn truncation_marker(omitted: usize) -> String {
    format!("[output truncated: {} bytes omitted]\n", omitted)
}
