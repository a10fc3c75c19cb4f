use std::fmt;

use crate::error::{Result, SaveError, SaveErrorCode};
use crate::reader::ByteCursor;

/// How a string was length-prefixed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringEncoding {
    /// Zero length prefix, no payload and no terminator.
    Null,
    /// Positive prefix: byte count including a trailing 0x00.
    Utf8,
    /// Negative prefix: UTF-16LE unit count including a trailing 0x0000.
    Utf16,
}

/// A length-prefixed save string. `bytes` never includes the terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SaveString {
    bytes: Vec<u8>,
    encoding: StringEncoding,
}

impl SaveString {
    pub fn null() -> Self {
        Self {
            bytes: Vec::new(),
            encoding: StringEncoding::Null,
        }
    }

    pub fn utf8(s: &str) -> Self {
        Self {
            bytes: s.as_bytes().to_vec(),
            encoding: StringEncoding::Utf8,
        }
    }

    pub fn utf16(s: &str) -> Self {
        Self {
            bytes: s.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            encoding: StringEncoding::Utf16,
        }
    }

    /// ASCII text is stored narrow, anything else wide.
    pub fn from_text(s: &str) -> Self {
        if s.is_ascii() {
            Self::utf8(s)
        } else {
            Self::utf16(s)
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoding(&self) -> StringEncoding {
        self.encoding
    }

    pub fn is(&self, text: &str) -> bool {
        match self.encoding {
            StringEncoding::Null => text.is_empty(),
            StringEncoding::Utf8 => self.bytes == text.as_bytes(),
            StringEncoding::Utf16 => self.to_string_lossy() == text,
        }
    }

    pub fn to_string_lossy(&self) -> String {
        match self.encoding {
            StringEncoding::Null => String::new(),
            StringEncoding::Utf8 => String::from_utf8_lossy(&self.bytes).into_owned(),
            StringEncoding::Utf16 => {
                let units = self
                    .bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
                char::decode_utf16(units)
                    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect()
            }
        }
    }

    /// Bytes this string occupies on disk, prefix included.
    pub fn encoded_len(&self) -> usize {
        match self.encoding {
            StringEncoding::Null => 4,
            StringEncoding::Utf8 => 4 + self.bytes.len() + 1,
            StringEncoding::Utf16 => 4 + self.bytes.len() + 2,
        }
    }
}

impl fmt::Display for SaveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

pub fn read_save_string(cur: &mut ByteCursor<'_>) -> Result<SaveString> {
    let start = cur.position();
    let (payload_len, encoding) = payload_len(cur)?;
    if payload_len > cur.remaining() {
        return Err(SaveError::new(
            SaveErrorCode::InvalidStringLength,
            format!(
                "string at pos={start} needs {payload_len} bytes, {} remain",
                cur.remaining()
            ),
        ));
    }

    let payload = cur.read_bytes(payload_len)?;
    let bytes = match encoding {
        StringEncoding::Null => Vec::new(),
        StringEncoding::Utf8 => payload[..payload_len - 1].to_vec(),
        StringEncoding::Utf16 => payload[..payload_len - 2].to_vec(),
    };
    Ok(SaveString { bytes, encoding })
}

pub fn skip_save_string(cur: &mut ByteCursor<'_>) -> Result<()> {
    let start = cur.position();
    let (payload_len, _) = payload_len(cur)?;
    if payload_len > cur.remaining() {
        return Err(SaveError::new(
            SaveErrorCode::InvalidStringLength,
            format!("string at pos={start} runs past the end of the buffer"),
        ));
    }
    cur.skip(payload_len)
}

pub fn write_save_string(out: &mut Vec<u8>, s: &SaveString) {
    match s.encoding {
        StringEncoding::Null => out.extend_from_slice(&0i32.to_le_bytes()),
        StringEncoding::Utf8 => {
            out.extend_from_slice(&((s.bytes.len() + 1) as i32).to_le_bytes());
            out.extend_from_slice(&s.bytes);
            out.push(0);
        }
        StringEncoding::Utf16 => {
            let units = (s.bytes.len() / 2 + 1) as i32;
            out.extend_from_slice(&(-units).to_le_bytes());
            out.extend_from_slice(&s.bytes);
            out.extend_from_slice(&[0, 0]);
        }
    }
}

fn payload_len(cur: &mut ByteCursor<'_>) -> Result<(usize, StringEncoding)> {
    let start = cur.position();
    let length = cur.read_i32()?;
    match length {
        0 => Ok((0, StringEncoding::Null)),
        n if n > 0 => Ok((n as usize, StringEncoding::Utf8)),
        _ => {
            let units = length.checked_neg().ok_or_else(|| {
                SaveError::new(
                    SaveErrorCode::InvalidStringLength,
                    format!("string length {length} at pos={start} cannot be negated"),
                )
            })?;
            Ok((units as usize * 2, StringEncoding::Utf16))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SaveString, StringEncoding, read_save_string, skip_save_string, write_save_string};
    use crate::error::SaveErrorCode;
    use crate::reader::ByteCursor;

    fn encode(s: &SaveString) -> Vec<u8> {
        let mut out = Vec::new();
        write_save_string(&mut out, s);
        out
    }

    #[test]
    fn ascii_uses_positive_length_with_terminator() {
        let s = SaveString::from_text("Station");
        let bytes = encode(&s);
        assert_eq!(&bytes[..4], &8i32.to_le_bytes());
        assert_eq!(bytes.len(), 4 + 8);
        assert_eq!(*bytes.last().expect("terminator"), 0);
        assert_eq!(bytes.len(), s.encoded_len());

        let mut cur = ByteCursor::new(&bytes);
        let decoded = read_save_string(&mut cur).expect("decode");
        assert_eq!(decoded, s);
        assert_eq!(decoded.encoding(), StringEncoding::Utf8);
        assert!(cur.is_exhausted());
    }

    #[test]
    fn non_ascii_uses_negative_length_utf16() {
        let s = SaveString::from_text("Gare Saint-Lazare é");
        assert_eq!(s.encoding(), StringEncoding::Utf16);
        let bytes = encode(&s);
        let units = "Gare Saint-Lazare é".encode_utf16().count() as i32 + 1;
        assert_eq!(&bytes[..4], &(-units).to_le_bytes());
        assert_eq!(bytes.len(), 4 + units as usize * 2);
        assert_eq!(&bytes[bytes.len() - 2..], &[0, 0]);

        let mut cur = ByteCursor::new(&bytes);
        let decoded = read_save_string(&mut cur).expect("decode");
        assert_eq!(decoded.to_string_lossy(), "Gare Saint-Lazare é");
        assert!(decoded.is("Gare Saint-Lazare é"));
    }

    #[test]
    fn zero_length_and_lone_terminator_stay_distinct() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(0);

        let mut cur = ByteCursor::new(&bytes);
        let null = read_save_string(&mut cur).expect("null");
        let empty = read_save_string(&mut cur).expect("empty");
        assert_eq!(null.encoding(), StringEncoding::Null);
        assert_eq!(empty.encoding(), StringEncoding::Utf8);
        assert!(null.is("") && empty.is(""));

        let mut out = encode(&null);
        write_save_string(&mut out, &empty);
        assert_eq!(out, bytes);
    }

    #[test]
    fn impossible_lengths_are_rejected() {
        let bytes = 1000i32.to_le_bytes();
        let err = read_save_string(&mut ByteCursor::new(&bytes)).expect_err("too long");
        assert_eq!(err.code, SaveErrorCode::InvalidStringLength);

        let bytes = i32::MIN.to_le_bytes();
        let err = read_save_string(&mut ByteCursor::new(&bytes)).expect_err("min");
        assert_eq!(err.code, SaveErrorCode::InvalidStringLength);

        let bytes = (-3i32).to_le_bytes();
        let err = skip_save_string(&mut ByteCursor::new(&bytes)).expect_err("skip");
        assert_eq!(err.code, SaveErrorCode::InvalidStringLength);
    }

    #[test]
    fn skip_lands_after_payload() {
        let mut bytes = encode(&SaveString::utf16("wide"));
        bytes.extend_from_slice(&encode(&SaveString::utf8("narrow")));
        let mut cur = ByteCursor::new(&bytes);
        skip_save_string(&mut cur).expect("skip");
        assert!(read_save_string(&mut cur).expect("second").is("narrow"));
    }
}
