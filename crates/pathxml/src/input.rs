//! Input abstraction and encoding detection

use crate::error::{Error, ErrorKind, Pos, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];
const UTF32_BE_BOM: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// Raw document bytes as handed to the reader
#[derive(Clone, Copy, Debug)]
pub struct Input<'a> {
    source: &'a [u8],
}

impl<'a> Input<'a> {
    pub const fn from_bytes(source: &'a [u8]) -> Self {
        Self { source }
    }

    /// Source bytes with the byte-order mark removed.
    ///
    /// Only UTF-8 documents are accepted; a UTF-16 or UTF-32 byte-order mark
    /// is rejected up front instead of surfacing later as garbled markup.
    pub fn decoded(&self) -> Result<&'a [u8]> {
        if let Some(rest) = self.source.strip_prefix(UTF8_BOM) {
            return Ok(rest);
        }
        let encoding = if self.source.starts_with(UTF32_BE_BOM) {
            Some("UTF-32")
        } else if self.source.starts_with(UTF16_LE_BOM) || self.source.starts_with(UTF16_BE_BOM) {
            Some("UTF-16")
        } else {
            None
        };
        match encoding {
            Some(encoding) => Err(Error::at(
                ErrorKind::UnsupportedEncoding {
                    encoding: encoding.to_string(),
                },
                Pos::new(0, 1, 1),
            )),
            None => Ok(self.source),
        }
    }
}

/// Whether an XML declaration's `encoding` label is one we can read as-is
pub(crate) fn is_supported_encoding(label: &str) -> bool {
    matches!(
        label.to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "us-ascii" | "ascii"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_bom_is_stripped() -> Result<()> {
        let bytes = b"\xEF\xBB\xBF<a/>";
        let input = Input::from_bytes(bytes);
        assert_eq!(input.decoded()?, b"<a/>");
        Ok(())
    }

    #[test]
    fn test_utf16_bom_is_rejected() {
        let input = Input::from_bytes(b"\xFF\xFE<\x00a\x00");
        let err = input.decoded().err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::UnsupportedEncoding {
                encoding: "UTF-16".to_string()
            })
        );
    }

    #[test]
    fn test_plain_input_is_untouched() -> Result<()> {
        let input = Input::from_bytes(b"<a/>");
        assert_eq!(input.decoded()?, b"<a/>");
        Ok(())
    }

    #[test]
    fn test_supported_encoding_labels() {
        assert!(is_supported_encoding("UTF-8"));
        assert!(is_supported_encoding("us-ascii"));
        assert!(!is_supported_encoding("ISO-8859-1"));
    }
}
