use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A device position forwarded with each request so answers can be local.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in metres.
    #[serde(default)]
    pub accuracy: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ChatError::ConfigError(format!(
                "latitude out of range: {}",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ChatError::ConfigError(format!(
                "longitude out of range: {}",
                longitude
            )));
        }
        if !(accuracy >= 0.0) {
            return Err(ChatError::ConfigError(format!(
                "accuracy must be non-negative: {}",
                accuracy
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            accuracy,
        })
    }
}

impl FromStr for Location {
    type Err = ChatError;

    /// Parses `lat,lon` or `lat,lon,accuracy`.
    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        if fields.len() < 2 || fields.len() > 3 {
            return Err(ChatError::ConfigError(format!(
                "expected lat,lon[,accuracy], got '{}'",
                s
            )));
        }

        let parse = |name: &str, value: &str| {
            value
                .parse::<f64>()
                .map_err(|_| ChatError::ConfigError(format!("invalid {}: '{}'", name, value)))
        };

        let latitude = parse("latitude", fields[0])?;
        let longitude = parse("longitude", fields[1])?;
        let accuracy = match fields.get(2) {
            Some(value) => parse("accuracy", value)?,
            None => 0.0,
        };
        Location::new(latitude, longitude, accuracy)
    }
}
