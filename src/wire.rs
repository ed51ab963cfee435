//! The wire codec: tag bytes, fixed-width integers, and length-prefixed text
//! blobs, plus the command/result tag enumerations built on top of them.
//!
//! All integers on the wire are non-negative 32-bit values rendered as eight
//! zero-padded ASCII hex digits; tag bytes are a single base-36 digit.

use std::io::{self, Read, Write};

use crate::error::WireError;

/// Width, in bytes, of a fixed-width integer on the wire.
pub const FIXED_INT_WIDTH: usize = 8;

/// Read one tag byte and map it through `f`, treating EOF or any byte outside
/// the base-36 alphabet as `None` (the caller maps that to `SHUTDOWN`).
fn read_tag_byte<R: Read>(r: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match r.read(&mut buf)? {
        0 => Ok(None),
        _ => match (buf[0] as char).to_digit(36) {
            Some(ordinal) => Ok(Some(ordinal as u8)),
            None => Ok(None),
        },
    }
}

/// Write a single ordinal as a base-36 tag byte.
fn write_tag_byte<W: Write>(w: &mut W, ordinal: u8) -> io::Result<()> {
    let c = std::char::from_digit(ordinal as u32, 36).expect("ordinal fits base-36");
    w.write_all(&[c as u8])
}

/// Read a fixed-width, zero-padded 8-hex-digit non-negative integer.
pub fn read_fixed_int<R: Read>(r: &mut R) -> Result<u32, WireError> {
    let mut buf = [0u8; FIXED_INT_WIDTH];
    r.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => WireError::Truncated {
            expected: FIXED_INT_WIDTH,
            actual: 0,
        },
        _ => WireError::Io(e),
    })?;
    let text = std::str::from_utf8(&buf).map_err(|_| WireError::MalformedInt(lossy(&buf)))?;
    u32::from_str_radix(text, 16).map_err(|_| WireError::MalformedInt(text.to_owned()))
}

/// Write a non-negative integer as eight zero-padded hex digits.
pub fn write_fixed_int<W: Write>(w: &mut W, value: u32) -> Result<(), WireError> {
    write!(w, "{value:0width$x}", width = FIXED_INT_WIDTH).map_err(WireError::from)
}

/// Read a length-prefixed, 8-bit-transparent text blob.
pub fn read_text<R: Read>(r: &mut R) -> Result<String, WireError> {
    let len = read_fixed_int(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => WireError::Truncated {
            expected: len,
            actual: 0,
        },
        _ => WireError::Io(e),
    })?;
    // The wire is 8-bit transparent Latin-1; every byte maps to exactly one
    // code point, so this never fails the way UTF-8 decoding could.
    Ok(buf.into_iter().map(|b| b as char).collect())
}

/// Write a text blob, checking that every code point is 8-bit transparent.
pub fn write_text<W: Write>(w: &mut W, text: &str) -> Result<(), WireError> {
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        if code > 0xFF {
            return Err(WireError::NonByteCodePoint(code));
        }
        bytes.push(code as u8);
    }
    write_fixed_int(w, bytes.len() as u32)?;
    w.write_all(&bytes).map_err(WireError::from)
}

fn lossy(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).into_owned()
}

macro_rules! tag_enum {
    ($name:ident { $($variant:ident = $ordinal:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const fn ordinal(self) -> u8 {
                match self {
                    $(Self::$variant => $ordinal),+
                }
            }

            pub fn from_ordinal(ordinal: u8) -> Option<Self> {
                match ordinal {
                    $($ordinal => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

tag_enum!(Command {
    Shutdown = 0,
    GetClass = 1,
    FreeObject = 2,
    GetMethod = 3,
    ToString = 4,
    CreateString = 5,
    InvokeStaticMethod = 6,
});

tag_enum!(ResultTag {
    Shutdown = 0,
    PrintOut = 1,
    IntResult = 2,
    ErrorResult = 3,
    VoidResult = 4,
    StringResult = 5,
});

impl Command {
    /// Read the next command tag, treating EOF or an unrecognized byte as
    /// `Shutdown` per §4.1.
    pub fn read<R: Read>(r: &mut R) -> io::Result<Command> {
        match read_tag_byte(r)? {
            Some(ordinal) => Ok(Command::from_ordinal(ordinal).unwrap_or(Command::Shutdown)),
            None => Ok(Command::Shutdown),
        }
    }

    /// Human-readable name, used only for diagnostic logging (never on the wire).
    pub const fn name(self) -> &'static str {
        match self {
            Command::Shutdown => "SHUTDOWN",
            Command::GetClass => "GET_CLASS",
            Command::FreeObject => "FREE_OBJECT",
            Command::GetMethod => "GET_METHOD",
            Command::ToString => "TO_STRING",
            Command::CreateString => "CREATE_STRING",
            Command::InvokeStaticMethod => "INVOKE_STATIC_METHOD",
        }
    }
}

impl ResultTag {
    pub fn write<W: Write>(self, w: &mut W) -> io::Result<()> {
        write_tag_byte(w, self.ordinal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn fixed_int_round_trips_any_u32(value: u32) -> bool {
        let mut buf = Vec::new();
        write_fixed_int(&mut buf, value).unwrap();
        let mut cursor = io::Cursor::new(buf);
        read_fixed_int(&mut cursor).unwrap() == value
    }

    #[quickcheck]
    fn text_round_trips_any_latin1_string(bytes: Vec<u8>) -> bool {
        let text: String = bytes.iter().map(|b| *b as char).collect();
        let mut buf = Vec::new();
        write_text(&mut buf, &text).unwrap();
        let mut cursor = io::Cursor::new(buf);
        read_text(&mut cursor).unwrap() == text
    }

    #[test]
    fn fixed_int_round_trips() {
        let mut buf = Vec::new();
        write_fixed_int(&mut buf, 0xDEAD_BEEF).unwrap();
        assert_eq!(buf, b"deadbeef");
        let mut cursor = io::Cursor::new(buf);
        assert_eq!(read_fixed_int(&mut cursor).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn zero_pads_small_values() {
        let mut buf = Vec::new();
        write_fixed_int(&mut buf, 0).unwrap();
        assert_eq!(buf, b"00000000");
    }

    #[test]
    fn text_round_trips() {
        let mut buf = Vec::new();
        write_text(&mut buf, "class java.lang.Math").unwrap();
        let mut cursor = io::Cursor::new(buf);
        assert_eq!(read_text(&mut cursor).unwrap(), "class java.lang.Math");
    }

    #[test]
    fn empty_text_round_trips() {
        let mut buf = Vec::new();
        write_text(&mut buf, "").unwrap();
        assert_eq!(buf, b"00000000");
    }

    #[test]
    fn rejects_non_byte_code_points() {
        let mut buf = Vec::new();
        let err = write_text(&mut buf, "caf\u{e9}\u{1f600}").unwrap_err();
        assert!(matches!(err, WireError::NonByteCodePoint(_)));
    }

    #[test]
    fn command_tag_round_trips() {
        for ordinal in 0..=6u8 {
            let c = std::char::from_digit(ordinal as u32, 36).unwrap();
            let mut cursor = io::Cursor::new(vec![c as u8]);
            let cmd = Command::read(&mut cursor).unwrap();
            assert_eq!(cmd.ordinal(), ordinal);
        }
    }

    #[test]
    fn unrecognized_tag_is_shutdown() {
        let mut cursor = io::Cursor::new(Vec::<u8>::new());
        assert_eq!(Command::read(&mut cursor).unwrap(), Command::Shutdown);

        let mut cursor = io::Cursor::new(b"!".to_vec());
        assert_eq!(Command::read(&mut cursor).unwrap(), Command::Shutdown);
    }

    #[test]
    fn truncated_fixed_int_is_an_error() {
        let mut cursor = io::Cursor::new(b"abc".to_vec());
        let err = read_fixed_int(&mut cursor).unwrap_err();
        assert!(matches!(err, WireError::Truncated { .. }));
    }

    #[test]
    fn malformed_hex_is_an_error() {
        let mut cursor = io::Cursor::new(b"zzzzzzzz".to_vec());
        let err = read_fixed_int(&mut cursor).unwrap_err();
        assert!(matches!(err, WireError::MalformedInt(_)));
    }
}
