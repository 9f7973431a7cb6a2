//! Code buffers from hex words and binary files.

use std::path::Path;

use armlift_isa::{InstrSet, is_t32_prefix};

use crate::error::{Error, Result};

/// Encode instructions written as hex into little-endian code bytes.
///
/// A32 takes 8-digit words. Thumb takes 4-digit halfwords, or 8-digit
/// 32-bit instructions with the first halfword in the upper digits. A
/// `0x` prefix and `_` separators are accepted.
pub fn parse_hex_code<S: AsRef<str>>(words: &[S], iset: InstrSet) -> Result<Vec<u8>> {
    let mut code = Vec::new();
    for word in words {
        let word = word.as_ref();
        let digits: String = word
            .trim()
            .trim_start_matches("0x")
            .chars()
            .filter(|&c| c != '_')
            .collect();
        let value = u32::from_str_radix(&digits, 16).map_err(|_| Error::InvalidHex(word.to_string()))?;
        match (iset, digits.len()) {
            (InstrSet::A32, 8) => code.extend_from_slice(&value.to_le_bytes()),
            (InstrSet::Thumb, 4) => code.extend_from_slice(&(value as u16).to_le_bytes()),
            (InstrSet::Thumb, 8) if is_t32_prefix(value >> 16) => {
                code.extend_from_slice(&((value >> 16) as u16).to_le_bytes());
                code.extend_from_slice(&(value as u16).to_le_bytes());
            }
            _ => return Err(Error::InvalidHex(word.to_string())),
        }
    }
    check_code(&code, iset)?;
    Ok(code)
}

/// Read a raw little-endian code image.
pub fn read_code_file(path: &Path, iset: InstrSet) -> Result<Vec<u8>> {
    let code = std::fs::read(path)?;
    check_code(&code, iset)?;
    Ok(code)
}

fn check_code(code: &[u8], iset: InstrSet) -> Result<()> {
    let unit = match iset {
        InstrSet::A32 => 4,
        InstrSet::Thumb => 2,
    };
    if code.is_empty() {
        return Err(Error::EmptyCode);
    }
    if code.len() % unit != 0 {
        return Err(Error::OddLength {
            len: code.len(),
            unit,
        });
    }
    Ok(())
}
