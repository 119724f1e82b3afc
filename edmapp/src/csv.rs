//! CSV rendering of a decoded flight's samples.
//!
//! The column set is fixed: DATE, every schema field in wire order
//! (uppercased), then LAT and LONG. Unavailable GPS values render as empty
//! cells. No field can contain a comma, so no quoting is performed.

use std::fmt::Write;

use edmcore::record::Sample;
use edmcore::schema::FIELDS;

pub(crate) fn header_row() -> String {
    let mut columns = vec!["DATE".to_owned()];
    columns.extend(FIELDS.iter().map(|f| f.name.to_uppercase()));
    columns.push("LAT".to_owned());
    columns.push("LONG".to_owned());
    columns.join(",")
}

pub(crate) fn render(samples: &[Sample]) -> String {
    let mut out = header_row();
    out.push('\n');
    for sample in samples {
        let _ = write!(out, "{}", sample.time.format("%Y-%m-%d %H:%M:%S"));
        for value in sample.values {
            out.push(',');
            push_value(&mut out, value);
        }
        out.push(',');
        if let Some(lat) = sample.lat {
            let _ = write!(out, "{lat:.6}");
        }
        out.push(',');
        if let Some(long) = sample.long {
            let _ = write!(out, "{long:.6}");
        }
        out.push('\n');
    }
    out
}

/// Integral values print without a decimal point; converted temperatures and
/// scaled values keep their fraction.
fn push_value(out: &mut String, value: f64) {
    if value == value.trunc() {
        let _ = write!(out, "{}", value as i64);
    } else {
        let _ = write!(out, "{value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edmcore::schema::NUM_FIELDS;

    #[test]
    fn header_row_matches_schema() {
        let header = header_row();
        assert!(header.starts_with("DATE,EGT1,EGT2,"));
        assert!(header.ends_with(",ALT,GSPD,LAT,LONG"));
        assert_eq!(header.split(',').count(), NUM_FIELDS + 3);
    }

    #[test]
    fn renders_rows_with_and_without_gps() {
        let time = chrono::NaiveDate::from_ymd_opt(2025, 5, 4)
            .unwrap()
            .and_hms_opt(15, 21, 30)
            .unwrap();
        let mut values = [0.0; NUM_FIELDS];
        values[0] = 1325.0;
        values[17] = 24.6;
        let with_gps = Sample {
            time,
            values,
            lat: Some(33.524),
            long: Some(-112.301),
        };
        let without_gps = Sample {
            time: time + chrono::Duration::seconds(6),
            values,
            lat: None,
            long: None,
        };
        let csv = render(&[with_gps, without_gps]);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2025-05-04 15:21:30,1325,0,"));
        assert!(lines[1].ends_with(",33.524000,-112.301000"));
        assert!(lines[2].starts_with("2025-05-04 15:21:36,"));
        assert!(lines[2].ends_with(",,"));
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn fractional_values_keep_their_decimals() {
        let mut out = String::new();
        push_value(&mut out, 121.1);
        out.push(' ');
        push_value(&mut out, 356.0);
        assert_eq!(out, "121.1 356");
    }
}
