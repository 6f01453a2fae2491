//! Serde helpers for the shapes our server actually sends.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Parse a timestamp the way the server (and the people who seed its
/// database) write them: RFC 3339, `YYYY-MM-DD HH:MM:SS` with or without a
/// `T` and fractional seconds (UTC assumed), or a bare `YYYY-MM-DD` (midnight
/// UTC).
pub fn parse_timestamp(val: &str) -> Option<DateTime<Utc>> {
    let val = val.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(val) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(val, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(val, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// How we write timestamps back out (matches JS `toISOString()`)
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::Serializer;

    pub fn serialize<S>(val: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error>
        where S: Serializer
    {
        ser.serialize_str(&super::format_timestamp(val))
    }

    pub fn deserialize<'de, D>(des: D) -> Result<DateTime<Utc>, D::Error>
        where D: Deserializer<'de>
    {
        let raw = String::deserialize(des)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("bad timestamp: {}", raw)))
    }
}

pub mod timestamp_opt {
    use chrono::{DateTime, Utc};
    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::Serializer;

    pub fn serialize<S>(val: &Option<DateTime<Utc>>, ser: S) -> Result<S::Ok, S::Error>
        where S: Serializer
    {
        match *val {
            Some(ref dt) => ser.serialize_str(&super::format_timestamp(dt)),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(des: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where D: Deserializer<'de>
    {
        match Option::<String>::deserialize(des)? {
            Some(raw) => {
                super::parse_timestamp(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("bad timestamp: {}", raw)))
            }
            None => Ok(None),
        }
    }
}

/// Ids come through as numbers, except when they come through as strings.
pub mod id_converter {
    use serde::de::{self, Deserializer, Visitor};
    use serde::ser::Serializer;

    pub fn serialize<S>(val: &i64, ser: S) -> Result<S::Ok, S::Error>
        where S: Serializer
    {
        ser.serialize_i64(*val)
    }

    pub fn deserialize<'de, D>(des: D) -> Result<i64, D::Error>
        where D: Deserializer<'de>
    {
        struct I64OrString;

        impl<'de> Visitor<'de> for I64OrString {
            type Value = i64;

            fn expecting(&self, formatter: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                formatter.write_str("integer id or numeric string")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
                where E: de::Error
            {
                Ok(value)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
                where E: de::Error
            {
                if value > i64::max_value() as u64 {
                    return Err(E::custom(format!("id out of range: {}", value)));
                }
                Ok(value as i64)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
                where E: de::Error
            {
                value.trim().parse::<i64>()
                    .map_err(|_| E::custom(format!("bad id: {}", value)))
            }
        }

        des.deserialize_any(I64OrString)
    }
}
