//! Register script transcoder
//!
//! Converts a text file of I2C register writes into the binary command blob
//! consumed by the camera configuration container.
//!
//! Each non-empty line is a comma separated list of byte values. `//` starts
//! a comment. The first byte of a line selects the record kind:
//!
//! - `0x00` - ignored
//! - `0x01..=0x7F` - normal record: the first byte is dropped and the rest is
//!   a row. Adjacent rows of equal length are grouped as
//!   `[u32 count][u8 len][rows...]`.
//! - `0x80..=0xFF` - special record:
//!   `[FF FF FF FF 04][u32 first - 0x80][remaining bytes]`.

use std::path::Path;

use crate::error::TranscodeError;

/// Marker that opens every special record
pub const SPECIAL_MARKER: [u8; 5] = [0xFF, 0xFF, 0xFF, 0xFF, 0x04];

/// First byte value from which a record is special
pub const SPECIAL_THRESHOLD: u8 = 0x80;

/// One classified line of a register script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Register row with its leading byte removed
    Row(Vec<u8>),
    /// Special command with its selector and raw trailing bytes
    Special { selector: u32, payload: Vec<u8> },
}

/// Record tagged with its 1-based source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    pub line: usize,
    pub record: Record,
}

/// Parsed register script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterScript {
    records: Vec<ScriptRecord>,
}

/// Parse one field into a byte.
///
/// `0x`-prefixed fields and fields made only of hex digits are hex, anything
/// else is decimal with an optional sign. Values wrap modulo 256. Note that a
/// token such as `30` is all hex digits and therefore reads as `0x30`.
pub fn parse_byte(token: &str) -> Option<u8> {
    let t = token.trim();
    if t.is_empty() {
        return None;
    }

    if t.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("0x")) {
        return fold_digits(&t[2..], 16);
    }

    if t.chars().all(|c| c.is_ascii_hexdigit()) {
        return fold_digits(t, 16);
    }

    let (negative, digits) = match t.as_bytes()[0] {
        b'-' => (true, &t[1..]),
        b'+' => (false, &t[1..]),
        _ => (false, t),
    };
    let value = fold_digits(digits, 10)?;
    Some(if negative { value.wrapping_neg() } else { value })
}

/// Accumulate digits in `radix`, keeping only the low byte
#[allow(clippy::cast_possible_truncation)]
fn fold_digits(digits: &str, radix: u32) -> Option<u8> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0u8, |acc, c| {
        let d = c.to_digit(radix)?;
        Some(acc.wrapping_mul(radix as u8).wrapping_add(d as u8))
    })
}

/// Strip the trailing comment and trailing commas of a line
fn clean_line(line: &str) -> &str {
    let line = line.trim();
    let line = line.split_once("//").map_or(line, |(head, _)| head);
    line.trim_end_matches(',').trim()
}

/// Parse the bytes of one line, `None` when nothing parses
pub fn parse_line(line: &str) -> Option<Vec<u8>> {
    let line = clean_line(line);
    if line.is_empty() {
        return None;
    }

    let bytes: Vec<u8> = line.split(',').filter_map(parse_byte).collect();
    if bytes.is_empty() {
        None
    } else {
        Some(bytes)
    }
}

/// Decode text, dropping byte sequences that are not valid UTF-8
fn decode_ignoring_invalid(data: &[u8]) -> String {
    let mut text = String::with_capacity(data.len());
    for chunk in data.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

impl RegisterScript {
    /// Parse script text
    pub fn parse(text: &str) -> Self {
        let mut records = Vec::new();

        // A lone '\r' also ends a line
        let lines = text
            .lines()
            .enumerate()
            .flat_map(|(index, line)| line.split('\r').map(move |part| (index + 1, part)));

        for (line, raw) in lines {
            let Some(bytes) = parse_line(raw) else {
                continue;
            };

            let first = bytes[0];
            let record = if first == 0x00 {
                continue;
            } else if first >= SPECIAL_THRESHOLD {
                Record::Special {
                    selector: u32::from(first - SPECIAL_THRESHOLD),
                    payload: bytes[1..].to_vec(),
                }
            } else {
                Record::Row(bytes[1..].to_vec())
            };

            records.push(ScriptRecord { line, record });
        }

        Self { records }
    }

    /// Read and parse a script file
    pub fn from_file(path: &Path) -> Result<Self, TranscodeError> {
        let data = std::fs::read(path).map_err(|source| TranscodeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&decode_ignoring_invalid(&data)))
    }

    /// Classified records in file order
    pub fn records(&self) -> &[ScriptRecord] {
        &self.records
    }

    /// Encode the script into its binary command blob
    pub fn encode(&self) -> Result<Vec<u8>, TranscodeError> {
        let mut out = Vec::new();
        let mut run: Vec<&ScriptRecord> = Vec::new();

        for record in &self.records {
            match &record.record {
                Record::Row(row) => {
                    if let Some(Record::Row(prev)) = run.first().map(|r| &r.record) {
                        if prev.len() != row.len() {
                            flush_rows(&mut out, &mut run)?;
                        }
                    }
                    run.push(record);
                }
                Record::Special { selector, payload } => {
                    flush_rows(&mut out, &mut run)?;
                    out.extend_from_slice(&SPECIAL_MARKER);
                    out.extend_from_slice(&selector.to_le_bytes());
                    out.extend_from_slice(payload);
                    tracing::debug!(
                        "line {}: special record selector {:#x}, {} bytes",
                        record.line,
                        selector,
                        payload.len()
                    );
                }
            }
        }
        flush_rows(&mut out, &mut run)?;

        Ok(out)
    }
}

/// Emit the buffered run of rows as one group and clear it
#[allow(clippy::cast_possible_truncation)]
fn flush_rows(out: &mut Vec<u8>, run: &mut Vec<&ScriptRecord>) -> Result<(), TranscodeError> {
    let Some(first) = run.first() else {
        return Ok(());
    };
    let Record::Row(first_row) = &first.record else {
        return Ok(());
    };

    let row_len = first_row.len();
    let Ok(len_byte) = u8::try_from(row_len) else {
        return Err(TranscodeError::RowTooLong {
            line: first.line,
            len: row_len,
        });
    };
    let count = run.len() as u32;

    tracing::debug!(
        "line {}: group of {} rows x {} bytes",
        first.line,
        count,
        row_len
    );

    out.extend_from_slice(&count.to_le_bytes());
    out.push(len_byte);
    for record in run.iter() {
        if let Record::Row(row) = &record.record {
            let mut row = row.clone();
            row.resize(row_len, 0);
            out.extend_from_slice(&row);
        }
    }

    run.clear();
    Ok(())
}

/// Transcode script text in one call
pub fn transcode(text: &str) -> Result<Vec<u8>, TranscodeError> {
    RegisterScript::parse(text).encode()
}

/// Transcode a script file in one call
pub fn transcode_file(path: &Path) -> Result<Vec<u8>, TranscodeError> {
    RegisterScript::from_file(path)?.encode()
}
