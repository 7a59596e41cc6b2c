use chrono::{DateTime, SubsecRound, Utc};

/// ISO-8601 UTC timestamp with second precision and a literal `Z`.
pub fn to_iso_z(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn utc_now_iso_z() -> String {
    to_iso_z(Utc::now())
}

/// Current instant truncated to whole seconds, so it serializes as
/// `YYYY-MM-DDTHH:MM:SSZ`.
pub fn utc_now_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_without_fraction_or_offset() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 17, 12, 0, 5).unwrap()
            + chrono::Duration::milliseconds(734);
        assert_eq!(to_iso_z(instant), "2024-01-17T12:00:05Z");
    }

    #[test]
    fn now_ends_with_z() {
        let now = utc_now_iso_z();
        assert_eq!(now.len(), 20);
        assert!(now.ends_with('Z'));
        assert!(!now.contains('+'));
        assert!(DateTime::parse_from_rfc3339(&now).is_ok());
    }

    #[test]
    fn whole_second_instant_serializes_with_z() {
        let value = serde_json::to_value(utc_now_seconds()).unwrap();
        let text = value.as_str().unwrap();
        assert_eq!(text.len(), 20);
        assert!(text.ends_with('Z'));
    }
}
