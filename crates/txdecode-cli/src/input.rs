//! Reading transaction bytes from a file or stdin.

use base64::Engine;
use clap::ValueEnum;
use std::io::{self, Read};
use thiserror::Error;

/// How the input bytes are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Hex text; surrounding whitespace is ignored.
    Hex,
    /// Standard base64 text; surrounding whitespace is ignored.
    Base64,
    /// Raw binary.
    Raw,
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {source_name}: {error}")]
    Read { source_name: String, error: io::Error },
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("input is not valid UTF-8 text")]
    NotText,
}

/// Reads and decodes the input named by `path`, or stdin when absent.
pub fn read_tx(path: Option<&str>, format: InputFormat) -> Result<Vec<u8>, InputError> {
    let raw = match path {
        Some(path) => std::fs::read(path).map_err(|error| InputError::Read {
            source_name: path.to_string(),
            error,
        })?,
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .map_err(|error| InputError::Read {
                    source_name: "stdin".to_string(),
                    error,
                })?;
            buffer
        }
    };
    decode_input(raw, format)
}

fn decode_input(raw: Vec<u8>, format: InputFormat) -> Result<Vec<u8>, InputError> {
    match format {
        InputFormat::Raw => Ok(raw),
        InputFormat::Hex => Ok(hex::decode(text(&raw)?)?),
        InputFormat::Base64 => Ok(base64::engine::general_purpose::STANDARD.decode(text(&raw)?)?),
    }
}

fn text(raw: &[u8]) -> Result<&str, InputError> {
    std::str::from_utf8(raw)
        .map(str::trim)
        .map_err(|_| InputError::NotText)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_input_ignores_trailing_newline() {
        let bytes = decode_input(b"0a01ff\n".to_vec(), InputFormat::Hex).unwrap();
        assert_eq!(bytes, vec![0x0a, 0x01, 0xff]);
    }

    #[test]
    fn base64_input_decodes() {
        let bytes = decode_input(b"CgH/".to_vec(), InputFormat::Base64).unwrap();
        assert_eq!(bytes, vec![0x0a, 0x01, 0xff]);
    }

    #[test]
    fn raw_input_passes_through() {
        let bytes = decode_input(vec![0, 159, 146], InputFormat::Raw).unwrap();
        assert_eq!(bytes, vec![0, 159, 146]);
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert!(matches!(
            decode_input(b"0a0".to_vec(), InputFormat::Hex),
            Err(InputError::Hex(_))
        ));
        assert!(matches!(
            decode_input(vec![0xff, 0xfe], InputFormat::Base64),
            Err(InputError::NotText)
        ));
    }
}
