use crate::prelude::Category;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single geolocated data point as served by the traffic API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    #[serde(
        rename = "ip",
        alias = "ip address",
        alias = "identifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub identifier: Option<String>,
    #[serde(rename = "lat", alias = "Latitude", alias = "latitude")]
    pub latitude: f64,
    #[serde(rename = "lon", alias = "Longitude", alias = "longitude")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub suspicious: bool,
    #[serde(alias = "Timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl GeoRecord {
    pub fn new(identifier: impl Into<String>, latitude: f64, longitude: f64, suspicious: bool) -> Self {
        Self {
            identifier: Some(identifier.into()),
            latitude,
            longitude,
            suspicious,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn category(&self) -> Category {
        Category::from_flag(self.suspicious)
    }

    /// Identifier, treating an empty string as missing.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref().filter(|id| !id.is_empty())
    }

    /// Timestamp, treating an empty string as missing.
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref().filter(|ts| !ts.is_empty())
    }

    pub fn has_finite_coordinates(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

// The feed has emitted the flag as a bool, a 0/1 integer and a string.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl<'de> de::Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean, an integer or a boolean-like string")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<bool, E> {
            Ok(value != 0)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<bool, E> {
            Ok(value != 0)
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<bool, E> {
            Ok(value != 0.0 && !value.is_nan())
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
            match value.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "no" | "" => Ok(false),
                _ => Ok(true),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_none<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_some<D2: Deserializer<'de>>(self, deserializer: D2) -> Result<bool, D2::Error> {
            deserializer.deserialize_any(FlagVisitor)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}
