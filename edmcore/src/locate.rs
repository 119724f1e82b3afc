//! Finds where each flight's preamble begins in the binary region.
//!
//! Flight lengths in the index are word counts rounded up from the true byte
//! length, so after an odd-length flight the next preamble sits one byte
//! before the running cursor. The locator probes the cursor and the byte
//! before it, accepting a position only when the flight number matches and
//! the preamble there looks real; failing both it falls back to a forward
//! scan for the flight-number bytes, which also recovers flights whose
//! headers carry out-of-range values.

use log::debug;

use crate::flight::{FlightHeader, FLIGHT_HEADER_LEN};
use crate::header::FlightIndexEntry;

/// A flight-index entry resolved to a byte position, when one could be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedFlight {
    pub entry: FlightIndexEntry,
    pub start: Option<usize>,
}

/// Resolve every index entry to its preamble position, in index order.
pub fn locate_flights(
    data: &[u8],
    binary_offset: usize,
    index: &[FlightIndexEntry],
) -> Vec<LocatedFlight> {
    let mut located = Vec::with_capacity(index.len());
    let mut cursor = binary_offset;

    for entry in index {
        let start = probe(data, cursor, binary_offset, entry)
            .or_else(|| scan(data, cursor, entry.flight_number));
        debug!(
            "flight {}: cursor {cursor}, start {start:?}",
            entry.flight_number
        );
        located.push(LocatedFlight {
            entry: *entry,
            start,
        });
        cursor = start.unwrap_or(cursor) + entry.data_bytes();
    }

    located
}

/// Check the cursor and the byte before it for a plausible preamble carrying
/// the expected flight number.
fn probe(
    data: &[u8],
    cursor: usize,
    binary_offset: usize,
    entry: &FlightIndexEntry,
) -> Option<usize> {
    let needle = entry.flight_number.to_be_bytes();
    for candidate in [Some(cursor), cursor.checked_sub(1)].into_iter().flatten() {
        if candidate < binary_offset || candidate + FLIGHT_HEADER_LEN > data.len() {
            continue;
        }
        if data[candidate..candidate + 2] != needle {
            continue;
        }
        if let Some(header) = FlightHeader::decode(&data[candidate..]) {
            if header.plausible() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Forward search for the flight number encoded as two big-endian bytes.
fn scan(data: &[u8], from: usize, flight_number: u16) -> Option<usize> {
    let needle = flight_number.to_be_bytes();
    if from >= data.len() {
        return None;
    }
    data[from..]
        .windows(2)
        .position(|w| w == needle)
        .map(|pos| from + pos)
}
