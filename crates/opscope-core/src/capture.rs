//! Response capture shim.
//!
//! Mirrors every byte that reaches a response sink into a side buffer while
//! the sink keeps full control over what is accepted and reported.

use std::io::{self, Write};

/// Media type prefix that marks a structured (JSON) payload.
pub const STRUCTURED_CONTENT_TYPE: &str = "application/json";

/// Bytes observed on one response.
///
/// `size` always counts delivered bytes. The buffer only fills when capture
/// was enabled for this response.
#[derive(Debug, Default, Clone)]
pub struct ResponseCapture {
    content_type: Option<String>,
    buffer: Vec<u8>,
    size: usize,
    enabled: bool,
}

impl ResponseCapture {
    pub fn new(content_type: Option<String>, enabled: bool) -> Self {
        Self {
            content_type,
            buffer: Vec::new(),
            size: 0,
            enabled,
        }
    }

    /// Capture only when the caller opted in and the payload is structured.
    pub fn for_response(content_type: Option<String>, capture_body: bool) -> Self {
        let enabled = capture_body && is_structured(content_type.as_deref());
        Self::new(content_type, enabled)
    }

    pub fn record(&mut self, bytes: &[u8]) {
        self.size += bytes.len();
        if self.enabled {
            self.buffer.extend_from_slice(bytes);
        }
    }

    pub fn is_structured_payload(&self) -> bool {
        is_structured(self.content_type.as_deref())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Total bytes delivered to the sink.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

fn is_structured(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with(STRUCTURED_CONTENT_TYPE))
}

/// Writer decorator that copies accepted bytes into a [`ResponseCapture`].
///
/// Bytes go to the real sink first; only the prefix the sink accepted is
/// mirrored, and the sink's result is handed back untouched.
#[derive(Debug)]
pub struct CaptureWriter<W> {
    inner: W,
    capture: ResponseCapture,
}

impl<W: Write> CaptureWriter<W> {
    pub fn new(inner: W, capture: ResponseCapture) -> Self {
        Self { inner, capture }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn capture(&self) -> &ResponseCapture {
        &self.capture
    }

    pub fn into_parts(self) -> (W, ResponseCapture) {
        (self.inner, self.capture)
    }
}

impl<W: Write> Write for CaptureWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.capture.record(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
