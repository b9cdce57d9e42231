//! Character encodings for `read_string` / `write_string`.

use std::fmt;
use std::str::FromStr;

/// A character encoding used to turn handle content into text and back.
///
/// UTF-8 is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Charset {
    /// UTF-8.
    #[default]
    Utf8,
    /// UTF-16, little endian, no byte order mark.
    Utf16Le,
    /// UTF-16, big endian, no byte order mark.
    Utf16Be,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// 7-bit US-ASCII.
    Ascii,
}

impl Charset {
    /// Decode `bytes` into a string.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string()),
            Charset::Utf16Le | Charset::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(format!("odd byte count {} for {self}", bytes.len()));
                }
                let units = bytes.chunks_exact(2).map(|pair| match self {
                    Charset::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
                    _ => u16::from_be_bytes([pair[0], pair[1]]),
                });
                char::decode_utf16(units)
                    .collect::<Result<String, _>>()
                    .map_err(|e| e.to_string())
            }
            Charset::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Charset::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(format!("non-ASCII byte 0x{:02x} at offset {pos}", bytes[pos])),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
        }
    }

    /// Encode `text` into bytes.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, String> {
        match self {
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
            Charset::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            Charset::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Charset::Latin1 | Charset::Ascii => {
                let limit = if *self == Charset::Latin1 { 0xFF } else { 0x7F };
                text.chars()
                    .map(|c| {
                        u8::try_from(u32::from(c))
                            .ok()
                            .filter(|&b| u32::from(b) <= limit)
                            .ok_or_else(|| format!("character {c:?} cannot be encoded as {self}"))
                    })
                    .collect()
            }
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Charset::Utf8 => "UTF-8",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "US-ASCII",
        })
    }
}

impl FromStr for Charset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase().replace('_', "-");
        match label.as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "utf-16le" | "utf16le" => Ok(Charset::Utf16Le),
            "utf-16be" | "utf16be" => Ok(Charset::Utf16Be),
            "iso-8859-1" | "latin1" | "latin-1" => Ok(Charset::Latin1),
            "us-ascii" | "ascii" => Ok(Charset::Ascii),
            _ => Err(format!("unknown charset: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_utf8() {
        assert_eq!(Charset::default(), Charset::Utf8);
    }

    #[test]
    fn utf16_both_endians() {
        let le = Charset::Utf16Le.encode("hé").unwrap();
        assert_eq!(le, vec![b'h', 0, 0xE9, 0]);
        assert_eq!(Charset::Utf16Le.decode(&le).unwrap(), "hé");

        let be = Charset::Utf16Be.encode("hé").unwrap();
        assert_eq!(be, vec![0, b'h', 0, 0xE9]);
        assert_eq!(Charset::Utf16Be.decode(&be).unwrap(), "hé");
    }

    #[test]
    fn utf16_rejects_odd_length() {
        assert!(Charset::Utf16Le.decode(&[0x41]).is_err());
    }

    #[test]
    fn latin1_maps_bytes_directly() {
        assert_eq!(Charset::Latin1.decode(&[0x63, 0x61, 0x66, 0xE9]).unwrap(), "café");
        assert_eq!(Charset::Latin1.encode("café").unwrap(), vec![0x63, 0x61, 0x66, 0xE9]);
        assert!(Charset::Latin1.encode("€").is_err());
    }

    #[test]
    fn ascii_is_strict() {
        assert!(Charset::Ascii.decode(&[0x41, 0x80]).is_err());
        assert!(Charset::Ascii.encode("é").is_err());
        assert_eq!(Charset::Ascii.encode("ok").unwrap(), b"ok".to_vec());
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        assert!(Charset::Utf8.decode(&[0xFF, 0xFE]).is_err());
    }

    #[test]
    fn parses_common_labels() {
        assert_eq!("UTF-8".parse::<Charset>().unwrap(), Charset::Utf8);
        assert_eq!("latin1".parse::<Charset>().unwrap(), Charset::Latin1);
        assert_eq!("utf_16le".parse::<Charset>().unwrap(), Charset::Utf16Le);
        assert_eq!("US-ASCII".parse::<Charset>().unwrap(), Charset::Ascii);
        assert!("ebcdic".parse::<Charset>().is_err());
    }
}
