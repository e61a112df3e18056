//! Carbon update payload.
//!
//! `{"region": "eu", "carbon": 50, "timestamp": "2024-01-01T00:00:00Z"}`
//!
//! `timestamp` is informational only; cache freshness is stamped on
//! receipt.

use serde_json::Value;
use thiserror::Error;

use carbonseer_core::DEFAULT_REGION;

#[derive(Debug, Error, PartialEq)]
pub enum UpdateError {
    #[error("body is not valid JSON: {0}")]
    Json(String),

    #[error("body must be a JSON object")]
    NotObject,

    #[error("region must be a string")]
    Region,

    #[error("missing carbon")]
    MissingCarbon,

    #[error("carbon must be a finite number, got {0}")]
    InvalidCarbon(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarbonUpdate {
    pub region: String,
    /// gCO2eq/kWh.
    pub carbon: f64,
    pub timestamp: Option<String>,
}

impl CarbonUpdate {
    /// Parse and validate a request body.
    ///
    /// `region` defaults to `"local"`; `carbon` may be a number or a
    /// numeric string.
    pub fn parse(body: &[u8]) -> Result<Self, UpdateError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| UpdateError::Json(e.to_string()))?;
        let object = value.as_object().ok_or(UpdateError::NotObject)?;

        let region = match object.get("region") {
            None | Some(Value::Null) => DEFAULT_REGION.to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(_) => return Err(UpdateError::Region),
        };

        let carbon = match object.get("carbon") {
            None | Some(Value::Null) => return Err(UpdateError::MissingCarbon),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        let carbon = match carbon {
            Some(c) if c.is_finite() => c,
            _ => return Err(UpdateError::InvalidCarbon(object["carbon"].to_string())),
        };

        let timestamp = match object.get("timestamp") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            region,
            carbon,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_payload() {
        let update =
            CarbonUpdate::parse(br#"{"region":"eu","carbon":50,"timestamp":"2024-05-01T12:00:00Z"}"#)
                .unwrap();
        assert_eq!(update.region, "eu");
        assert_eq!(update.carbon, 50.0);
        assert_eq!(update.timestamp.as_deref(), Some("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn region_defaults_to_local() {
        let update = CarbonUpdate::parse(br#"{"carbon": 123.5}"#).unwrap();
        assert_eq!(update.region, "local");
        assert_eq!(update.timestamp, None);
    }

    #[test]
    fn numeric_string_carbon_is_accepted() {
        let update = CarbonUpdate::parse(br#"{"region":"us","carbon":"410.2"}"#).unwrap();
        assert_eq!(update.carbon, 410.2);
    }

    #[test]
    fn missing_carbon_is_rejected() {
        assert_eq!(
            CarbonUpdate::parse(br#"{"region":"eu"}"#),
            Err(UpdateError::MissingCarbon)
        );
        assert_eq!(
            CarbonUpdate::parse(br#"{"region":"eu","carbon":null}"#),
            Err(UpdateError::MissingCarbon)
        );
    }

    #[test]
    fn non_numeric_carbon_is_rejected() {
        for body in [
            &br#"{"carbon":"dirty"}"#[..],
            br#"{"carbon":true}"#,
            br#"{"carbon":[1]}"#,
            br#"{"carbon":"NaN"}"#,
            br#"{"carbon":"inf"}"#,
        ] {
            assert!(
                matches!(CarbonUpdate::parse(body), Err(UpdateError::InvalidCarbon(_))),
                "{}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        assert!(matches!(CarbonUpdate::parse(b""), Err(UpdateError::Json(_))));
        assert!(matches!(CarbonUpdate::parse(b"{carbon:1"), Err(UpdateError::Json(_))));
        assert_eq!(CarbonUpdate::parse(b"[1,2]"), Err(UpdateError::NotObject));
        assert_eq!(
            CarbonUpdate::parse(br#"{"region":7,"carbon":1}"#),
            Err(UpdateError::Region)
        );
    }
}
