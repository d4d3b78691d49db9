//! `DD/MM/YYYY` representation of calendar dates at the API boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};

pub const FORMAT: &str = "%d/%m/%Y";

pub const FORMAT_ERROR: &str = "Date has wrong format. Use DD/MM/YYYY.";

pub fn parse(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), FORMAT).ok()
}

pub fn format(date: &NaiveDate) -> String {
    date.format(FORMAT).to_string()
}

pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(date))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(FORMAT_ERROR))
}
