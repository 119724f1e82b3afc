//! Stabilization filter turning accumulated GPS deltas into trustworthy
//! coordinates.
//!
//! Receivers produce garbage while acquiring satellites, and a common
//! firmware revision reports a fixed placeholder position near (39.05,
//! -94.88) until lock. The filter holds output until two consecutive reads
//! agree, allows one large "teleport" away from the placeholder, and after
//! stabilizing rejects any jump a real aircraft could not make in one
//! sampling interval.

use log::debug;

use crate::flight::GPS_COUNTS_PER_DEGREE;

/// Largest credible per-sample movement, in degrees (about 1.3 miles).
pub const MAX_JUMP_DEGREES: f64 = 0.02;

/// The placeholder position certain receivers report before satellite lock.
pub const KANSAS_LAT: f64 = 39.05;
pub const KANSAS_LONG: f64 = -94.88;

/// How close the preamble position must be to the placeholder to latch
/// Kansas handling for the flight.
const KANSAS_DETECT_RADIUS: f64 = 0.1;

/// Number of accepted non-placeholder outputs before large jumps are locked
/// out again.
const KANSAS_ESCAPE_SAMPLES: u32 = 50;

/// Consecutive close reads required before anything is emitted.
const STABILITY_WINDOW: u32 = 2;

/// Both accumulators are seeded with the shared slot default.
const ACCUMULATOR_SEED: i32 = 240;

/// Raw GPS delta bytes captured from one record, before sign application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GpsDeltas {
    pub lat_lo: Option<u8>,
    pub lat_hi: Option<u8>,
    pub long_lo: Option<u8>,
    pub long_hi: Option<u8>,
    /// Sign flag of the low latitude slot; applies to the composed delta.
    pub lat_neg: bool,
    pub long_neg: bool,
}

#[derive(Debug)]
pub(crate) struct GpsFilter {
    /// Preamble position in degrees; `None` disables the filter entirely.
    initial: Option<(f64, f64)>,
    /// Latched at construction: this flight started on the placeholder.
    kansas: bool,
    lat_acc: i32,
    long_acc: i32,
    stable_count: u32,
    candidate: Option<(f64, f64)>,
    last_good: Option<(f64, f64)>,
    output_count: u32,
    non_kansas_count: u32,
}

impl GpsFilter {
    pub(crate) fn new(initial: Option<(f64, f64)>) -> Self {
        let kansas = initial.is_some_and(|(lat, long)| {
            (lat - KANSAS_LAT).abs() < KANSAS_DETECT_RADIUS
                && (long - KANSAS_LONG).abs() < KANSAS_DETECT_RADIUS
        });
        GpsFilter {
            initial,
            kansas,
            lat_acc: ACCUMULATOR_SEED,
            long_acc: ACCUMULATOR_SEED,
            stable_count: 0,
            candidate: None,
            last_good: None,
            output_count: 0,
            non_kansas_count: 0,
        }
    }

    /// Fold one record's deltas into the accumulators and produce this
    /// sample's coordinates, or `None` while the fix is unreliable.
    pub(crate) fn push(&mut self, deltas: &GpsDeltas) -> Option<(f64, f64)> {
        accumulate(&mut self.lat_acc, deltas.lat_lo, deltas.lat_hi, deltas.lat_neg);
        accumulate(
            &mut self.long_acc,
            deltas.long_lo,
            deltas.long_hi,
            deltas.long_neg,
        );

        let (init_lat, init_long) = self.initial?;

        // Both accumulators at zero is the receiver telling us it has nothing.
        if self.lat_acc == 0 && self.long_acc == 0 {
            self.stable_count = 0;
            self.candidate = None;
            self.last_good = None;
            return None;
        }

        let lat = init_lat + (self.lat_acc - ACCUMULATOR_SEED) as f64 / GPS_COUNTS_PER_DEGREE;
        let long = init_long + (self.long_acc - ACCUMULATOR_SEED) as f64 / GPS_COUNTS_PER_DEGREE;

        let is_kansas_pos = self.kansas
            && (lat - KANSAS_LAT).abs() < 5.0
            && (long - KANSAS_LONG).abs() < 5.0;
        let allow_large_jump = self.kansas && self.non_kansas_count < KANSAS_ESCAPE_SAMPLES;

        let Some((cand_lat, cand_long)) = self.candidate else {
            self.candidate = Some((lat, long));
            self.stable_count = 1;
            return None;
        };

        let jump = (lat - cand_lat).abs().max((long - cand_long).abs());
        if !allow_large_jump && jump > MAX_JUMP_DEGREES {
            self.candidate = Some((lat, long));
            self.stable_count = 1;
            return None;
        }
        self.stable_count += 1;

        if self.stable_count < STABILITY_WINDOW {
            self.candidate = Some((lat, long));
            return None;
        }

        // Once stabilized, output must also be continuous with what we last
        // emitted, not merely with the previous read.
        if !allow_large_jump && self.non_kansas_count >= KANSAS_ESCAPE_SAMPLES {
            if let Some((good_lat, good_long)) = self.last_good {
                let jump = (lat - good_lat).abs().max((long - good_long).abs());
                if jump > MAX_JUMP_DEGREES {
                    self.candidate = Some((lat, long));
                    self.stable_count = 1;
                    return None;
                }
            }
        }

        self.output_count += 1;
        if !is_kansas_pos {
            self.non_kansas_count += 1;
        }
        if self.output_count == 1 {
            debug!("gps stabilized at ({lat:.6}, {long:.6})");
        }
        self.candidate = Some((lat, long));
        self.last_good = Some((lat, long));
        Some((round6(lat), round6(long)))
    }
}

fn accumulate(acc: &mut i32, lo: Option<u8>, hi: Option<u8>, negative: bool) {
    // No low byte means no update for this axis, even if a high byte came in.
    let Some(lo) = lo else { return };
    let magnitude = match hi {
        Some(hi) => (hi as i32) << 8 | lo as i32,
        None => lo as i32,
    };
    *acc += if negative { -magnitude } else { magnitude };
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
