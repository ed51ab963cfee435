//! The output interceptor: every textual write a native method performs is
//! reframed as a `PRINT_OUT` record on the shared output stream instead of
//! going to a real standard-output primitive.

use std::io::{self, Write};

use crate::runtime::format_java_like;
use crate::wire::{self, ResultTag};

/// Replaces the host runtime's textual standard-output primitive. One method
/// per overload that real callers would reach for, so that no call site ever
/// needs to stringify its argument itself: canonicalization happens here, at
/// the interception boundary.
pub trait PrintSink {
    /// The single primitive operation every overload reduces to: write
    /// already-canonicalized text, optionally newline-terminated.
    fn write(&mut self, text: &str, newline_terminated: bool) -> io::Result<()>;

    fn print_bool(&mut self, v: bool) -> io::Result<()> {
        self.write(&v.to_string(), false)
    }
    fn println_bool(&mut self, v: bool) -> io::Result<()> {
        self.write(&v.to_string(), true)
    }

    fn print_char(&mut self, v: u16) -> io::Result<()> {
        self.write(&char_text(v), false)
    }
    fn println_char(&mut self, v: u16) -> io::Result<()> {
        self.write(&char_text(v), true)
    }

    fn print_int(&mut self, v: i64) -> io::Result<()> {
        self.write(&v.to_string(), false)
    }
    fn println_int(&mut self, v: i64) -> io::Result<()> {
        self.write(&v.to_string(), true)
    }

    fn print_float(&mut self, v: f64) -> io::Result<()> {
        self.write(&format_java_like(v), false)
    }
    fn println_float(&mut self, v: f64) -> io::Result<()> {
        self.write(&format_java_like(v), true)
    }

    fn print_str(&mut self, v: &str) -> io::Result<()> {
        self.write(v, false)
    }
    fn println_str(&mut self, v: &str) -> io::Result<()> {
        self.write(v, true)
    }

    /// `println()` with no argument: a bare newline.
    fn println(&mut self) -> io::Result<()> {
        self.write("", true)
    }
}

fn char_text(code_unit: u16) -> String {
    char::from_u32(code_unit as u32).unwrap_or('\u{FFFD}').to_string()
}

/// Adapts the raw output stream: frames each write as a `PRINT_OUT` record
/// and flushes immediately after any write that is not newline-terminated,
/// so partial-line prompts reach the driver without delay.
pub struct OutputInterceptor<'w, W: Write> {
    raw: &'w mut W,
}

impl<'w, W: Write> OutputInterceptor<'w, W> {
    /// `raw` is the very same stream the codec writes result frames to; the
    /// interceptor never owns a separate stream, it only ever frames onto
    /// this one, so tag bytes and `PRINT_OUT` payloads can never interleave
    /// mid-write.
    pub fn new(raw: &'w mut W) -> Self {
        Self { raw }
    }
}

impl<'w, W: Write> PrintSink for OutputInterceptor<'w, W> {
    fn write(&mut self, text: &str, newline_terminated: bool) -> io::Result<()> {
        let mut payload = String::with_capacity(text.len() + 1);
        payload.push_str(text);
        if newline_terminated {
            payload.push('\n');
        }

        // Build the whole frame before touching the stream so no other code
        // path can interleave a partial tag/length/payload write.
        let mut frame = Vec::with_capacity(1 + wire::FIXED_INT_WIDTH + payload.len());
        ResultTag::PrintOut.write(&mut frame)?;
        wire::write_text(&mut frame, &payload)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.raw.write_all(&frame)?;
        if !newline_terminated {
            self.raw.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_line_flushes_without_newline() {
        let mut buf = Vec::new();
        {
            let mut sink = OutputInterceptor::new(&mut buf);
            sink.print_str("hi").unwrap();
        }
        // tag '1' + length "00000002" + "hi"
        assert_eq!(&buf, b"100000002hi");
    }

    #[test]
    fn newline_variant_appends_platform_newline() {
        let mut buf = Vec::new();
        {
            let mut sink = OutputInterceptor::new(&mut buf);
            sink.println_str("there").unwrap();
        }
        assert_eq!(&buf, b"100000006there\n");
    }

    #[test]
    fn sequential_prints_do_not_interleave() {
        let mut buf = Vec::new();
        {
            let mut sink = OutputInterceptor::new(&mut buf);
            sink.print_str("hi").unwrap();
            sink.println_str("there").unwrap();
        }
        let mut expected = Vec::new();
        expected.extend_from_slice(b"100000002hi");
        expected.extend_from_slice(b"100000006there\n");
        assert_eq!(buf, expected);
    }

    #[test]
    fn every_primitive_overload_emits_one_frame() {
        let mut buf = Vec::new();
        {
            let mut sink = OutputInterceptor::new(&mut buf);
            sink.print_bool(true).unwrap();
            sink.print_char('A' as u16).unwrap();
            sink.print_int(42).unwrap();
            sink.print_float(1.5).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches('1').count() >= 1, true);
        assert!(text.contains("true"));
        assert!(text.contains('A'));
        assert!(text.contains("42"));
        assert!(text.contains("1.5"));
    }

    #[test]
    fn integral_float_prints_with_trailing_fraction() {
        let mut buf = Vec::new();
        {
            let mut sink = OutputInterceptor::new(&mut buf);
            sink.print_float(2.0).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("2.0"), "must match canonical_text, not bare to_string");
    }
}
