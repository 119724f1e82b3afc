//! Parser for the ASCII metadata/index header at the start of every EDM file.
//!
//! The header is a sequence of CR-LF terminated records of the form
//! `$X,field,field*HH` where `HH` is the XOR checksum of everything between
//! the `$` and the `*`. The `$L` record ends the header; the byte after its
//! line terminator is the start of the binary flight data.

use chrono::{NaiveDate, NaiveDateTime};
use core::fmt;
use log::debug;

use crate::checksum::header_checksum;

/// One `$D` record: a flight number and its data length in 16-bit words.
///
/// `data_words` is the ceiling of the actual byte length over two, so the
/// flight occupies either `data_bytes()` or `data_bytes() - 1` bytes on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightIndexEntry {
    pub flight_number: u16,
    pub data_words: u16,
}

impl FlightIndexEntry {
    pub fn data_bytes(&self) -> usize {
        self.data_words as usize * 2
    }
}

/// Alarm thresholds from the `$A` record. Volt limits are in tenths of a volt
/// as stored by the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmLimits {
    pub volts_high: i32,
    pub volts_low: i32,
    pub egt_spread: i32,
    pub cht: i32,
    pub cld: i32,
    pub tit: i32,
    pub oil_high: i32,
    pub oil_low: i32,
}

/// Fuel computer configuration from the `$F` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FuelConfig {
    pub units: i32,
    pub full_capacity: i32,
    pub warning_level: i32,
    pub k_factor_1: i32,
    pub k_factor_2: i32,
}

/// Instrument configuration from the `$C` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// EDM model number, e.g. 830.
    pub model: i32,
    /// 32-bit feature flags word, assembled low word first.
    pub flags: u32,
    /// Up to six trailing configuration values, meaning firmware-dependent.
    pub extra: Vec<i32>,
}

/// Everything learned from the ASCII header. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileHeader {
    pub tail_number: Option<String>,
    pub config: Option<Config>,
    pub alarms: Option<AlarmLimits>,
    pub fuel: Option<FuelConfig>,
    pub download_time: Option<NaiveDateTime>,
    /// `$D` entries in encounter order.
    pub flight_index: Vec<FlightIndexEntry>,
    /// Offset of the first binary byte, directly after the `$L` record.
    pub binary_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// The file does not begin with `$U`.
    NotJpiFile,
    /// The header ended without a `$L` record.
    NoEndRecord,
    /// A header line could not be tokenized (1-based line number).
    MalformedRecord(usize),
    /// A header line failed checksum verification.
    Checksum { expected: u8, actual: u8 },
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::NotJpiFile => write!(f, "Not a valid JPI file"),
            HeaderError::NoEndRecord => write!(f, "No $L record found"),
            HeaderError::MalformedRecord(line) => {
                write!(f, "Malformed header record on line {line}")
            }
            HeaderError::Checksum { expected, actual } => write!(
                f,
                "Header checksum mismatch: expected {expected:02X}, actual {actual:02X}"
            ),
        }
    }
}

/// Parse the ASCII header of `data`, leaving `binary_offset` pointing at the
/// first byte of flight data.
pub fn parse_header(data: &[u8]) -> Result<FileHeader, HeaderError> {
    if data.len() < 2 || &data[0..2] != b"$U" {
        return Err(HeaderError::NotJpiFile);
    }

    let mut header = FileHeader::default();
    let mut offset = 0;
    let mut line_no = 0;

    loop {
        if offset >= data.len() || data[offset] != b'$' {
            return Err(HeaderError::NoEndRecord);
        }
        let rest = &data[offset..];
        let Some(line_len) = rest.windows(2).position(|w| w == b"\r\n") else {
            return Err(HeaderError::NoEndRecord);
        };
        line_no += 1;
        let fields = tokenize(&rest[..line_len], line_no)?;
        offset += line_len + 2;

        debug!("header record ${}: {} fields", fields[0], fields.len() - 1);
        match fields[0].as_str() {
            // The tail number is a single field but may itself contain commas.
            "U" => header.tail_number = Some(fields[1..].join(",").trim().to_owned()),
            "A" => {
                header.alarms = Some(AlarmLimits {
                    volts_high: int_field(&fields, 1),
                    volts_low: int_field(&fields, 2),
                    egt_spread: int_field(&fields, 3),
                    cht: int_field(&fields, 4),
                    cld: int_field(&fields, 5),
                    tit: int_field(&fields, 6),
                    oil_high: int_field(&fields, 7),
                    oil_low: int_field(&fields, 8),
                })
            }
            "C" => {
                let flags_low = int_field(&fields, 2) as u32 & 0xFFFF;
                let flags_high = int_field(&fields, 3) as u32 & 0xFFFF;
                header.config = Some(Config {
                    model: int_field(&fields, 1),
                    flags: (flags_high << 16) | flags_low,
                    extra: fields
                        .get(4..)
                        .unwrap_or(&[])
                        .iter()
                        .take(6)
                        .map(|f| f.trim().parse().unwrap_or(0))
                        .collect(),
                });
            }
            "D" => header.flight_index.push(FlightIndexEntry {
                flight_number: int_field(&fields, 1) as u16,
                data_words: int_field(&fields, 2) as u16,
            }),
            "F" => {
                header.fuel = Some(FuelConfig {
                    units: int_field(&fields, 1),
                    full_capacity: int_field(&fields, 2),
                    warning_level: int_field(&fields, 3),
                    k_factor_1: int_field(&fields, 4),
                    k_factor_2: int_field(&fields, 5),
                })
            }
            "T" => header.download_time = parse_download_time(&fields),
            // Recognized records whose body we have no use for.
            "P" | "H" => (),
            "L" => {
                header.binary_offset = offset;
                return Ok(header);
            }
            _ => (),
        }
    }
}

/// Verify a line's checksum, strip the `*HH` suffix and split on commas.
/// Field 0 is the record letter after the `$`.
fn tokenize(line: &[u8], line_no: usize) -> Result<Vec<String>, HeaderError> {
    // Minimum viable line is "$X*HH".
    if line.len() < 5 || line[line.len() - 3] != b'*' {
        return Err(HeaderError::MalformedRecord(line_no));
    }
    let star = line.len() - 3;
    let payload = &line[1..star];

    let suffix = core::str::from_utf8(&line[star + 1..])
        .ok()
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .ok_or(HeaderError::MalformedRecord(line_no))?;
    let computed = header_checksum(payload);
    if computed != suffix {
        return Err(HeaderError::Checksum {
            expected: computed,
            actual: suffix,
        });
    }

    let payload =
        core::str::from_utf8(payload).map_err(|_| HeaderError::MalformedRecord(line_no))?;
    Ok(payload.split(',').map(|f| f.trim().to_owned()).collect())
}

/// Integer fields default to 0 when missing or unparseable; observed files
/// pad short records with blanks.
fn int_field(fields: &[String], idx: usize) -> i32 {
    fields
        .get(idx)
        .and_then(|f| f.trim().parse().ok())
        .unwrap_or(0)
}

fn parse_download_time(fields: &[String]) -> Option<NaiveDateTime> {
    let month = int_field(fields, 1) as u32;
    let day = int_field(fields, 2) as u32;
    let year = match int_field(fields, 3) {
        y @ 0..=49 => 2000 + y,
        y @ 50..=99 => 1900 + y,
        y => y,
    };
    let hour = int_field(fields, 4) as u32;
    let minute = int_field(fields, 5) as u32;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}
