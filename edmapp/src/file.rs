use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDateTime;
use log::debug;

use edmcore::decode::decode_flight;
use edmcore::header::{parse_header, AlarmLimits, FileHeader, FuelConfig};
use edmcore::locate::{locate_flights, LocatedFlight};
use edmcore::record::TempUnit;

use crate::error::EdmError;
use crate::flight::Flight;

/// A parsed EDM data file.
///
/// The ASCII header is parsed eagerly by [`EdmFile::open`]; flights are
/// decoded on first access and cached. A decoded flight is immutable, so the
/// cache only ever inserts. Hosts wanting a different temperature unit should
/// open a new `EdmFile`.
#[derive(Debug)]
pub struct EdmFile {
    data: Vec<u8>,
    header: FileHeader,
    located: Vec<LocatedFlight>,
    temp_unit: TempUnit,
    cache: RwLock<HashMap<u16, Arc<Flight>>>,
}

impl EdmFile {
    /// Parse the header of a complete EDM file image.
    ///
    /// Fails only on structural faults: a file that does not start with
    /// `$U`, has no `$L` record, or fails a line checksum. Per-flight faults
    /// surface later as warnings on the affected [`Flight`].
    pub fn open(data: Vec<u8>, temp_unit: TempUnit) -> Result<Self, EdmError> {
        let header = parse_header(&data)?;
        let located = locate_flights(&data, header.binary_offset, &header.flight_index);
        debug!(
            "opened EDM file: {} flights, binary data at {}",
            located.len(),
            header.binary_offset
        );
        Ok(EdmFile {
            data,
            header,
            located,
            temp_unit,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn tail_number(&self) -> Option<&str> {
        self.header.tail_number.as_deref()
    }

    /// Model designation such as `EDM-830`, or `Unknown` when the header had
    /// no usable `$C` record.
    pub fn model_string(&self) -> String {
        match &self.header.config {
            Some(config) if config.model > 0 => format!("EDM-{}", config.model),
            _ => "Unknown".to_owned(),
        }
    }

    /// The 32-bit feature flags word from the `$C` record.
    pub fn feature_flags(&self) -> u32 {
        self.header.config.as_ref().map(|c| c.flags).unwrap_or(0)
    }

    /// When the file was downloaded from the instrument.
    pub fn download_time(&self) -> Option<NaiveDateTime> {
        self.header.download_time
    }

    pub fn alarm_limits(&self) -> Option<&AlarmLimits> {
        self.header.alarms.as_ref()
    }

    pub fn fuel_config(&self) -> Option<&FuelConfig> {
        self.header.fuel.as_ref()
    }

    pub fn flight_count(&self) -> usize {
        self.located.len()
    }

    /// Flight numbers in index order.
    pub fn flight_numbers(&self) -> Vec<u16> {
        self.located.iter().map(|l| l.entry.flight_number).collect()
    }

    /// Decode the given flight, or return the cached result. `None` when the
    /// number is not in the file's index.
    pub fn flight(&self, number: u16) -> Option<Arc<Flight>> {
        if let Some(flight) = self.cache.read().unwrap().get(&number) {
            return Some(flight.clone());
        }
        let located = self.located.iter().find(|l| l.entry.flight_number == number)?;
        let decoded = decode_flight(&self.data, &located.entry, located.start, self.temp_unit);
        let flight = Arc::new(Flight::new(number, decoded));
        let mut cache = self.cache.write().unwrap();
        Some(cache.entry(number).or_insert(flight).clone())
    }

    /// Decode every flight, in index order.
    pub fn flights(&self) -> Vec<Arc<Flight>> {
        self.flight_numbers()
            .into_iter()
            .filter_map(|n| self.flight(n))
            .collect()
    }
}
