//! Lenient date input: RFC 3339 timestamps or bare `YYYY-MM-DD` dates
//! (read as midnight UTC). Blank strings and `null` are absent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer};

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", value))),
    }
}

fn parse(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Deserialize)]
    struct Dated {
        #[serde(default, deserialize_with = "super::deserialize")]
        at: Option<DateTime<Utc>>,
    }

    fn read_at(json: &str) -> Result<Option<DateTime<Utc>>, serde_json::Error> {
        serde_json::from_str::<Dated>(json).map(|p| p.at)
    }

    #[test]
    fn accepts_timestamps_and_plain_dates() {
        let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(read_at(r#"{"at":"2024-05-01"}"#).unwrap(), Some(midnight));
        assert_eq!(read_at(r#"{"at":"2024-05-01T00:00:00Z"}"#).unwrap(), Some(midnight));
        assert_eq!(
            read_at(r#"{"at":"2024-05-01T02:00:00+02:00"}"#).unwrap(),
            Some(midnight)
        );
    }

    #[test]
    fn blank_null_and_missing_are_absent() {
        assert_eq!(read_at(r#"{"at":""}"#).unwrap(), None);
        assert_eq!(read_at(r#"{"at":null}"#).unwrap(), None);
        assert_eq!(read_at("{}").unwrap(), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(read_at(r#"{"at":"next tuesday"}"#).is_err());
    }
}
