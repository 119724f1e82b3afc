//! Decoder for the 28-byte preamble at the start of each flight's binary data.

use chrono::{NaiveDate, NaiveDateTime};

/// Byte length of the per-flight preamble: 14 big-endian 16-bit words.
pub const FLIGHT_HEADER_LEN: usize = 28;

/// Recording interval used when the header carries an invalid value.
pub const DEFAULT_INTERVAL_SECS: u16 = 6;

/// GPS coordinates are stored as 32-bit counts of 1/6000 degree.
pub const GPS_COUNTS_PER_DEGREE: f64 = 6000.0;

/// The decoded per-flight preamble.
///
/// Word 0 is the flight number, words 1-2 the 32-bit flags (low word first),
/// words 6-7 and 8-9 the initial latitude and longitude, word 11 the sampling
/// interval and words 12-13 the packed start date and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightHeader {
    pub flight_number: u16,
    pub flags: u32,
    /// Initial latitude in 1/6000 degree; 0 together with `initial_long` 0
    /// means the instrument had no GPS source.
    pub initial_lat: i32,
    pub initial_long: i32,
    /// Raw interval word; may be 0 in corrupt headers.
    pub interval_word: u16,
    date_word: u16,
    time_word: u16,
}

impl FlightHeader {
    /// Decode a preamble. Returns `None` if fewer than 28 bytes are given.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < FLIGHT_HEADER_LEN {
            return None;
        }
        let word = |i: usize| u16::from_be_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
        Some(FlightHeader {
            flight_number: word(0),
            flags: ((word(2) as u32) << 16) | word(1) as u32,
            initial_lat: (((word(7) as u32) << 16) | word(6) as u32) as i32,
            initial_long: (((word(9) as u32) << 16) | word(8) as u32) as i32,
            interval_word: word(11),
            date_word: word(12),
            time_word: word(13),
        })
    }

    /// Source temperatures are Fahrenheit when flags bit 28 is set.
    pub fn fahrenheit(&self) -> bool {
        self.flags >> 28 & 1 == 1
    }

    /// Sampling interval in seconds, falling back to 6 when the header word
    /// is 0.
    pub fn interval_secs(&self) -> u16 {
        if self.interval_word == 0 {
            DEFAULT_INTERVAL_SECS
        } else {
            self.interval_word
        }
    }

    pub fn day(&self) -> u16 {
        self.date_word & 0x1F
    }

    pub fn month(&self) -> u16 {
        self.date_word >> 5 & 0x0F
    }

    pub fn year(&self) -> u16 {
        2000 + (self.date_word >> 9)
    }

    pub fn hour(&self) -> u16 {
        self.time_word >> 11
    }

    pub fn minute(&self) -> u16 {
        self.time_word >> 5 & 0x3F
    }

    pub fn second(&self) -> u16 {
        (self.time_word & 0x1F) * 2
    }

    /// Flight start per the packed date/time words, or `None` when they do
    /// not form a real calendar date.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year() as i32, self.month() as u32, self.day() as u32)?
            .and_hms_opt(self.hour() as u32, self.minute() as u32, self.second() as u32)
    }

    /// Initial position in degrees, or `None` when the flight has no GPS.
    pub fn initial_position(&self) -> Option<(f64, f64)> {
        if self.initial_lat == 0 && self.initial_long == 0 {
            return None;
        }
        Some((
            self.initial_lat as f64 / GPS_COUNTS_PER_DEGREE,
            self.initial_long as f64 / GPS_COUNTS_PER_DEGREE,
        ))
    }

    /// Whether this looks like a real preamble rather than a stray flight
    /// number match inside record data. Used by the flight locator to settle
    /// word-rounded lengths.
    pub fn plausible(&self) -> bool {
        (1..=60).contains(&self.interval_word)
            && (1..=31).contains(&self.day())
            && (1..=12).contains(&self.month())
            && (2000..=2050).contains(&self.year())
            && self.hour() <= 23
            && self.minute() <= 59
            && self.second() <= 59
    }
}
