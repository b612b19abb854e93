use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ── Timestamp ───────────────────────────────────────────────────────

/// A UTC instant as exchanged with the backend.
///
/// Always written as RFC 3339 with millisecond precision. Reading is
/// lenient: the backend has been seen to answer with RFC 3339, naive
/// `YYYY-MM-DDTHH:MM:SS`, SQL-style `YYYY-MM-DD HH:MM:SS`, and bare dates.
/// Naive values are taken as UTC; bare dates as midnight UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Self(Utc.from_utc_datetime(&naive)));
            }
        }
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
        let naive = date.and_hms_opt(0, 0, 0)?;
        Some(Self(Utc.from_utc_datetime(&naive)))
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Calendar date part, `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid timestamp: {s:?}"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ── serde helpers ───────────────────────────────────────────────────

/// Optional timestamp where `null`, a missing key and `""` all mean "unset".
pub mod opt_timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => ts.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Timestamp>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Float(f) => f.to_string(),
        }
    }
}

/// Identifier that the backend sends as either a JSON string or number.
pub mod id_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        RawId::deserialize(deserializer).map(String::from)
    }
}

/// Optional variant of [`id_string`].
pub mod opt_id_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Option::<RawId>::deserialize(deserializer).map(|o| o.map(String::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        #[serde(with = "id_string")]
        id: String,
        #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
        at: Option<Timestamp>,
    }

    #[test]
    fn test_new_id() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }

    #[test]
    fn now_is_utc_rfc3339() {
        let ts = Timestamp::now().to_rfc3339();
        assert!(ts.contains('T'));
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn parses_every_backend_shape() {
        let expected = Timestamp::parse("2024-01-05T00:00:00Z").unwrap();
        assert_eq!(Timestamp::parse("2024-01-05"), Some(expected));
        assert_eq!(Timestamp::parse("2024-01-05T00:00:00"), Some(expected));
        assert_eq!(Timestamp::parse("2024-01-05 00:00:00"), Some(expected));
        assert_eq!(Timestamp::parse("2024-01-05T02:00:00+02:00"), Some(expected));
        assert_eq!(Timestamp::parse("2024-01-05T00:00:00.000Z"), Some(expected));
        assert_eq!(Timestamp::parse("yesterday"), None);
        assert_eq!(Timestamp::parse(""), None);
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::parse("2024-01-01").unwrap();
        let b = Timestamp::parse("2024-01-05").unwrap();
        assert!(a < b);
        assert_eq!(b.date_string(), "2024-01-05");
        assert_eq!(b.to_rfc3339(), "2024-01-05T00:00:00.000Z");
    }

    #[test]
    fn numeric_ids_and_blank_dates() {
        let row: Row = serde_json::from_str(r#"{"id": 42, "at": ""}"#).unwrap();
        assert_eq!(row, Row { id: "42".into(), at: None });

        let row: Row = serde_json::from_str(r#"{"id": "u-1", "at": "2024-03-01"}"#).unwrap();
        assert_eq!(row.id, "u-1");
        assert_eq!(row.at.unwrap().date_string(), "2024-03-01");

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["at"], "2024-03-01T00:00:00.000Z");
    }
}
