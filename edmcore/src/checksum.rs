//! XOR checksum used on the ASCII header records.
//!
//! Every header line carries a two-hex-digit suffix after a `*`. The checksum
//! covers the bytes strictly between the leading `$` and that `*`.

pub(crate) fn header_checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, b| acc ^ b)
}
