//! The logical field schema of the delta-compressed record stream.
//!
//! A record addresses up to 128 single-byte slots. A logical field is either a
//! single slot or a (low, high) slot pair whose value is `low + (high << 8)`,
//! with both halves accumulated independently. The tables here are shared by
//! the decoder, the CSV emitter and the tests so the three cannot drift.

/// Number of addressable delta slots per record.
pub const NUM_SLOTS: usize = 128;

/// Slot(s) backing one logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slots {
    Single(usize),
    Pair { low: usize, high: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub slots: Slots,
}

const fn single(name: &'static str, slot: usize) -> FieldDef {
    FieldDef {
        name,
        slots: Slots::Single(slot),
    }
}

const fn pair(name: &'static str, low: usize, high: usize) -> FieldDef {
    FieldDef {
        name,
        slots: Slots::Pair { low, high },
    }
}

/// Every logical field in wire-schema order. The CSV column order is this
/// list, followed by latitude and longitude.
pub const FIELDS: &[FieldDef] = &[
    pair("egt1", 0, 48),
    pair("egt2", 1, 49),
    pair("egt3", 2, 50),
    pair("egt4", 3, 51),
    pair("egt5", 4, 52),
    pair("egt6", 5, 53),
    single("cht1", 8),
    single("cht2", 9),
    single("cht3", 10),
    single("cht4", 11),
    single("cht5", 12),
    single("cht6", 13),
    single("cld", 14),
    single("oil_t", 15),
    single("mark", 16),
    single("oil_p", 17),
    single("crb", 18),
    single("volt", 20),
    single("oat", 21),
    single("usd", 22),
    single("ff", 23),
    single("hp", 30),
    single("map", 40),
    pair("rpm", 41, 42),
    pair("hours", 78, 79),
    single("alt", 83),
    single("gspd", 85),
];

pub const NUM_FIELDS: usize = FIELDS.len();

// Field indices into a sample's value array, fixed by the order of FIELDS.
pub const IDX_CLD: usize = 12;
pub const IDX_OIL_T: usize = 13;
pub const IDX_CRB: usize = 16;
pub const IDX_VOLT: usize = 17;
pub const IDX_OAT: usize = 18;
pub const IDX_FF: usize = 20;
pub const IDX_GSPD: usize = 26;

/// Fields subject to temperature unit conversion: EGT1-6, CHT1-6, CLD, OIL_T,
/// CRB and OAT.
pub const TEMP_FIELD_INDICES: [usize; 16] =
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, IDX_CLD, IDX_OIL_T, IDX_CRB, IDX_OAT];

/// Pairs whose high byte takes its delta sign from the low byte's sign flag.
///
/// The GPS slot pairs are absent: their sign is applied to the composed
/// 16-bit delta by the GPS accumulator instead.
pub const SIGN_PAIRS: [(usize, usize); 8] = [
    (0, 48),
    (1, 49),
    (2, 50),
    (3, 51),
    (4, 52),
    (5, 53),
    (41, 42),
    (78, 79),
];

// GPS delta slots, accumulated outside the regular slot array.
pub const SLOT_LONG_HI: usize = 81;
pub const SLOT_LAT_HI: usize = 82;
pub const SLOT_LONG_LO: usize = 86;
pub const SLOT_LAT_LO: usize = 87;

const SLOT_HP: usize = 30;

/// Value a slot starts from when its first non-zero delta arrives.
///
/// Most slots seed at 0xF0. Horsepower and the high byte of every slot pair
/// accumulate from zero.
pub fn slot_default(slot: usize) -> i32 {
    match slot {
        SLOT_HP => 0,
        48..=53 => 0,
        42 | 79 => 0,
        SLOT_LONG_HI | SLOT_LAT_HI => 0,
        _ => 0xF0,
    }
}

/// Index of a field by schema name, for hosts that address fields by key.
pub fn field_index(name: &str) -> Option<usize> {
    FIELDS.iter().position(|f| f.name == name)
}
