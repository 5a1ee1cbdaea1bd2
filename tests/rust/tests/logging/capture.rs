//! Capture shim against sinks with partial writes and failures

use opscope_core::{CaptureWriter, ResponseCapture, STRUCTURED_CONTENT_TYPE};
use pretty_assertions::assert_eq;
use std::io::{self, Write};

/// Accepts at most `chunk` bytes per write and fails after `budget` bytes.
struct Trickle {
    out: Vec<u8>,
    chunk: usize,
    budget: usize,
}

impl Write for Trickle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.out.len() >= self.budget {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "sink full"));
        }
        let n = buf.len().min(self.chunk).min(self.budget - self.out.len());
        self.out.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn json_capture() -> ResponseCapture {
    ResponseCapture::for_response(Some(format!("{}; charset=utf-8", STRUCTURED_CONTENT_TYPE)), true)
}

#[test]
fn test_capture_equals_delivered_bytes() {
    let sink = Trickle {
        out: Vec::new(),
        chunk: 3,
        budget: usize::MAX,
    };
    let mut writer = CaptureWriter::new(sink, json_capture());

    writer.write_all(br#"{"items":[1,2,3]}"#).unwrap();
    writer.flush().unwrap();

    let (sink, capture) = writer.into_parts();
    assert_eq!(capture.bytes(), &sink.out[..]);
    assert_eq!(capture.size(), sink.out.len());
}

#[test]
fn test_sink_error_is_returned_and_nothing_extra_recorded() {
    let sink = Trickle {
        out: Vec::new(),
        chunk: 4,
        budget: 6,
    };
    let mut writer = CaptureWriter::new(sink, json_capture());

    assert_eq!(writer.write(b"abcdef").unwrap(), 4);
    assert_eq!(writer.write(b"ef").unwrap(), 2);
    let err = writer.write(b"gh").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WriteZero);

    let (sink, capture) = writer.into_parts();
    assert_eq!(sink.out, b"abcdef".to_vec());
    assert_eq!(capture.bytes(), b"abcdef");
}

#[test]
fn test_structured_payload_detection() {
    let cases = [
        (Some("application/json"), true),
        (Some("application/json; charset=utf-8"), true),
        (Some("application/problem+json"), false),
        (Some("text/json"), false),
        (None, false),
    ];
    for (content_type, expected) in cases {
        let capture = ResponseCapture::new(content_type.map(String::from), true);
        assert_eq!(capture.is_structured_payload(), expected, "{:?}", content_type);
    }
}
