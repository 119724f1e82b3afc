use chrono::NaiveDateTime;

use edmcore::decode::DecodedFlight;
use edmcore::flight::{FlightHeader, DEFAULT_INTERVAL_SECS};
use edmcore::record::Sample;

use crate::csv;

/// One decoded flight. Immutable after decoding; shared via `Arc` by the
/// file-level cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    number: u16,
    header: Option<FlightHeader>,
    samples: Vec<Sample>,
    warnings: Vec<String>,
}

impl Flight {
    pub(crate) fn new(number: u16, decoded: DecodedFlight) -> Self {
        Flight {
            number,
            header: decoded.header,
            samples: decoded.samples,
            warnings: decoded.warnings,
        }
    }

    /// Flight number as recorded in the file's index.
    pub fn number(&self) -> u16 {
        self.number
    }

    /// Start of the flight, when the header carried a real date.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.header.as_ref().and_then(|h| h.start_time())
    }

    /// Sampling interval in seconds, with the instrument's 6-second default
    /// when the header was absent or carried 0.
    pub fn interval_secs(&self) -> u16 {
        self.header
            .as_ref()
            .map(|h| h.interval_secs())
            .unwrap_or(DEFAULT_INTERVAL_SECS)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// A flight is valid when it has a real start date and at least one
    /// sample. Flights with warnings can still be valid.
    pub fn valid(&self) -> bool {
        self.start_time().is_some() && !self.samples.is_empty()
    }

    /// Whether any sample carries a stabilized GPS position.
    pub fn has_gps(&self) -> bool {
        self.samples.iter().any(|s| s.lat.is_some())
    }

    /// Recoverable faults encountered while decoding, in encounter order.
    pub fn parse_warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Elapsed time between the first and last sample, in hours.
    pub fn duration_hours(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => {
                (last.time - first.time).num_seconds() as f64 / 3600.0
            }
            _ => 0.0,
        }
    }

    /// Render every sample using the fixed CSV schema.
    pub fn to_csv(&self) -> String {
        csv::render(&self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{delta_record, preamble};
    use edmcore::decode::decode_flight;
    use edmcore::header::FlightIndexEntry;
    use edmcore::record::TempUnit;

    fn decode(bytes: &[u8], number: u16) -> Flight {
        let entry = FlightIndexEntry {
            flight_number: number,
            data_words: (bytes.len() as u16).div_ceil(2),
        };
        Flight::new(
            number,
            decode_flight(bytes, &entry, Some(0), TempUnit::Original),
        )
    }

    fn gps_flight() -> Flight {
        let mut bytes = preamble(1209, 0, 201_044, -673_704, 6, (2025, 5, 4), (15, 21, 30)).to_vec();
        for _ in 0..4 {
            bytes.extend(delta_record(0, &[(8, 1, false)]));
        }
        decode(&bytes, 1209)
    }

    #[test]
    fn valid_flight_with_gps() {
        let flight = gps_flight();
        assert!(flight.valid());
        assert!(flight.has_gps());
        assert_eq!(flight.number(), 1209);
        assert_eq!(flight.interval_secs(), 6);
        assert_eq!(
            flight.start_time(),
            chrono::NaiveDate::from_ymd_opt(2025, 5, 4)
                .unwrap()
                .and_hms_opt(15, 21, 30)
        );
        // Three intervals between four samples.
        assert!((flight.duration_hours() - 18.0 / 3600.0).abs() < 1e-9);
    }

    #[test]
    fn flight_without_gps() {
        let mut bytes = preamble(1199, 0, 0, 0, 6, (2025, 5, 4), (8, 0, 0)).to_vec();
        bytes.extend(delta_record(0, &[(8, 1, false)]));
        let flight = decode(&bytes, 1199);
        assert!(flight.valid());
        assert!(!flight.has_gps());
        assert!(flight.samples().iter().all(|s| s.lat.is_none()));
    }

    #[test]
    fn unlocated_flight_is_invalid_and_empty() {
        let entry = FlightIndexEntry {
            flight_number: 1216,
            data_words: 40,
        };
        let flight = Flight::new(
            1216,
            decode_flight(&[0u8; 80], &entry, None, TempUnit::Original),
        );
        assert!(!flight.valid());
        assert!(flight.is_empty());
        assert_eq!(flight.duration_hours(), 0.0);
        assert_eq!(flight.interval_secs(), 6);
        assert_eq!(flight.parse_warnings().len(), 1);
    }

    #[test]
    fn csv_round_trip_shape() {
        let flight = gps_flight();
        let csv = flight.to_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 1 + flight.samples().len());
        assert!(lines[1].starts_with("2025-05-04 15:21:30,"));
        // Stabilized samples carry coordinates; the first does not.
        assert!(lines[1].ends_with(",,"));
        assert!(lines[2].contains(",33.507"));
        assert!(csv.ends_with('\n'));
    }
}
