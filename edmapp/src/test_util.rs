//! Builders for synthetic EDM files used across the crate's tests.

/// XOR-checksummed `$...*HH` header line with CR-LF terminator.
pub(crate) fn header_line(body: &str) -> Vec<u8> {
    let checksum = body.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("${body}*{checksum:02X}\r\n").into_bytes()
}

/// Pack a 28-byte flight preamble.
pub(crate) fn preamble(
    flight_number: u16,
    flags: u32,
    lat: i32,
    long: i32,
    interval: u16,
    ymd: (u16, u16, u16),
    hms: (u16, u16, u16),
) -> [u8; 28] {
    let mut words = [0u16; 14];
    words[0] = flight_number;
    words[1] = flags as u16;
    words[2] = (flags >> 16) as u16;
    words[6] = lat as u32 as u16;
    words[7] = (lat as u32 >> 16) as u16;
    words[8] = long as u32 as u16;
    words[9] = (long as u32 >> 16) as u16;
    words[11] = interval;
    words[12] = (ymd.0 - 2000) << 9 | ymd.1 << 5 | ymd.2;
    words[13] = hms.0 << 11 | hms.1 << 5 | hms.2 / 2;
    let mut out = [0u8; 28];
    for (i, w) in words.iter().enumerate() {
        out[i * 2..i * 2 + 2].copy_from_slice(&w.to_be_bytes());
    }
    out
}

/// Pack one delta record; `deltas` is (slot, magnitude, negative).
pub(crate) fn delta_record(repeat: u8, deltas: &[(usize, u8, bool)]) -> Vec<u8> {
    let mut field_flags = [0u8; 16];
    let mut sign_flags = [0u8; 16];
    for &(slot, _, neg) in deltas {
        field_flags[slot / 8] |= 1 << (slot % 8);
        if neg {
            sign_flags[slot / 8] |= 1 << (slot % 8);
        }
    }
    let decode_flags = (0..16).fold(0u16, |acc, i| {
        if field_flags[i] != 0 {
            acc | 1 << i
        } else {
            acc
        }
    });

    let mut out = vec![0x00];
    out.extend_from_slice(&decode_flags.to_be_bytes());
    out.extend_from_slice(&decode_flags.to_be_bytes());
    out.push(repeat);
    for i in 0..16 {
        if decode_flags >> i & 1 == 1 {
            out.push(field_flags[i]);
        }
    }
    for i in 0..16 {
        if decode_flags >> i & 1 == 1 && i != 6 && i != 7 {
            out.push(sign_flags[i]);
        }
    }
    let mut ordered: Vec<_> = deltas.to_vec();
    ordered.sort_by_key(|d| d.0);
    for (_, magnitude, _) in ordered {
        out.push(magnitude);
    }
    out
}

/// Assembles a whole file: checksummed header records, a `$D` index entry
/// per flight, then the concatenated binary flight data.
pub(crate) struct FileBuilder {
    tail: String,
    model: i32,
    flights: Vec<(u16, Vec<u8>)>,
}

impl FileBuilder {
    pub(crate) fn new(tail: &str, model: i32) -> Self {
        FileBuilder {
            tail: tail.to_owned(),
            model,
            flights: Vec::new(),
        }
    }

    pub(crate) fn flight(mut self, number: u16, bytes: Vec<u8>) -> Self {
        self.flights.push((number, bytes));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend(header_line(&format!("U,{}  ", self.tail)));
        data.extend(header_line("A,305,230,500,415,60,1650,230,90"));
        if self.model > 0 {
            data.extend(header_line(&format!("C,{},2191,4096,1552,5,0", self.model)));
        }
        data.extend(header_line("F,0,74,25,5648,5648"));
        data.extend(header_line("T, 5,13,25,15,42,2222"));
        for (number, bytes) in &self.flights {
            let words = (bytes.len() as u16).div_ceil(2);
            data.extend(header_line(&format!("D,{number},{words}")));
        }
        data.extend(header_line("L,00000000"));
        for (_, bytes) in self.flights {
            data.extend(bytes);
        }
        data
    }
}
