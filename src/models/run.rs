use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize, Serializer};

/// One completed wheel revolution, ready to hand to the collector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    #[serde(serialize_with = "serialize_timestamp")]
    pub from: DateTime<FixedOffset>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub to: DateTime<FixedOffset>,
    /// Elapsed time between `from` and `to`. Always > 0.
    pub seconds: f64,
    /// km/h
    pub speed: f64,
}

/// Converts a revolution of `circumference_m` metres taking `seconds` into km/h.
pub fn speed_kmh(circumference_m: f64, seconds: f64) -> f64 {
    circumference_m / seconds * 3.6
}

fn serialize_timestamp<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payload_uses_offset_timestamps() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let from = jst.with_ymd_and_hms(2024, 12, 1, 21, 30, 0).unwrap();
        let to = from + chrono::Duration::milliseconds(500);
        let record = RunRecord {
            from,
            to,
            seconds: 0.5,
            speed: speed_kmh(0.425, 0.5),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["from"], "2024-12-01T21:30:00.000000+09:00");
        assert_eq!(json["to"], "2024-12-01T21:30:00.500000+09:00");
        assert_eq!(json["seconds"], 0.5);
        assert!((json["speed"].as_f64().unwrap() - 3.06).abs() < 1e-9);
    }

    #[test]
    fn speed_is_circumference_over_seconds_in_kmh() {
        let speed = speed_kmh(0.425, 0.5);
        assert!(((speed - 3.06) / 3.06).abs() < 1e-9);

        let speed = speed_kmh(1.0, 1.0);
        assert!((speed - 3.6).abs() < 1e-12);
    }
}
