// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! BaseStation/SBS-1 line framing and field extraction.
//!
//! Field positions match dump1090's port 30003 output:
//! ```text
//! MSG,<type>,<session>,<aircraft>,<icao>,<flight>,<date>,<time>,<date>,<time>,
//!     <callsign>,<altitude>,<speed>,<track>,<lat>,<lon>,<vrate>,<squawk>,
//!     <alert>,<emergency>,<spi>,<on_ground>
//! ```

use super::{AircraftUpdate, Bogon, DecodeError, FieldError, Position};

/// Literal in field 0 of every message line.
pub const MSG_MARKER: &str = "MSG";

/// Length of the aircraft address in field 4.
pub const ADDRESS_LEN: usize = 6;

// A complete line has 22 fields; MSG,5 altitude is only trusted on one.
const FULL_FIELD_COUNT: usize = 22;

const MSG_TYPE: usize = 1;
const ADDRESS: usize = 4;
const CALLSIGN: usize = 10;
const ALTITUDE: usize = 11;
const GROUND_SPEED: usize = 12;
const TRACK: usize = 13;
const LATITUDE: usize = 14;
const LONGITUDE: usize = 15;
const VERTICAL_RATE: usize = 16;
const SQUAWK: usize = 17;

/// A line that passed framing: `MSG` marker and a 6-character address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'a> {
    fields: Vec<&'a str>,
}

impl<'a> Frame<'a> {
    /// Split a line and check its framing.
    pub fn parse(line: &'a str) -> Result<Self, DecodeError> {
        let fields: Vec<&str> = line.split(',').collect();

        if fields[0] != MSG_MARKER {
            return Err(DecodeError::NotMsg(fields[0].to_string()));
        }

        if fields.len() <= ADDRESS {
            return Err(DecodeError::Truncated(fields.len()));
        }

        let address = fields[ADDRESS];
        if address.chars().count() != ADDRESS_LEN {
            return Err(DecodeError::AddressLength(address.to_string()));
        }

        Ok(Self { fields })
    }

    /// Message subtype, e.g. `"3"`.
    #[must_use]
    pub fn msg_type(&self) -> &'a str {
        self.fields[MSG_TYPE]
    }

    /// The 6-character aircraft address.
    #[must_use]
    pub fn address(&self) -> &'a str {
        self.fields[ADDRESS]
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Non-empty, non-`0` fields from index `from` onward.
    #[must_use]
    pub fn reported_fields(&self, from: usize) -> Vec<(usize, &'a str)> {
        self.fields
            .iter()
            .enumerate()
            .skip(from)
            .filter(|(_, field)| !field.is_empty() && **field != "0")
            .map(|(index, field)| (index, *field))
            .collect()
    }

    /// Extract the update this line carries for its message type.
    pub fn update(&self) -> Result<AircraftUpdate, DecodeError> {
        self.extract()
            .map_err(|cause| DecodeError::Bogon(Box::new(self.bogon(cause))))
    }

    /// Build the diagnostic report for a field-level failure on this line.
    #[must_use]
    pub fn bogon(&self, cause: FieldError) -> Bogon {
        Bogon {
            msg_type: self.msg_type().to_string(),
            field_count: self.field_count(),
            fields: self
                .reported_fields(ADDRESS + 1)
                .into_iter()
                .map(|(index, field)| (index, field.to_string()))
                .collect(),
            cause,
        }
    }

    fn extract(&self) -> Result<AircraftUpdate, FieldError> {
        let update = match self.msg_type() {
            "1" => AircraftUpdate::Identification {
                callsign: self.text(CALLSIGN, "callsign")?,
            },
            "3" => AircraftUpdate::AirbornePosition(self.position(true)?),
            "4" => AircraftUpdate::Velocity {
                track: self.reported(TRACK, "track")?,
                speed: self.reported(GROUND_SPEED, "ground speed")?,
                vertical_rate: self.reported(VERTICAL_RATE, "vertical rate")?,
            },
            "5" => {
                if self.field_count() == FULL_FIELD_COUNT {
                    AircraftUpdate::Altitude(self.reported(ALTITUDE, "altitude")?)
                } else {
                    AircraftUpdate::Altitude(None)
                }
            }
            "6" => AircraftUpdate::Squawk(self.text(SQUAWK, "squawk")?),
            "8" => AircraftUpdate::AllCallReply(self.position(false)?),
            _ => AircraftUpdate::Other,
        };
        Ok(update)
    }

    /// Latitude gates the whole position: absent or zero means no position.
    fn position(&self, with_altitude: bool) -> Result<Option<Position>, FieldError> {
        let Some(latitude) = self.reported(LATITUDE, "latitude")? else {
            return Ok(None);
        };
        let longitude = self.number(LONGITUDE, "longitude")?;
        let altitude = if with_altitude {
            self.reported(ALTITUDE, "altitude")?
        } else {
            None
        };

        Ok(Some(Position {
            latitude,
            longitude,
            altitude,
        }))
    }

    fn field(&self, index: usize, name: &'static str) -> Result<&'a str, FieldError> {
        self.fields
            .get(index)
            .copied()
            .map(str::trim)
            .ok_or(FieldError::Missing { name, index })
    }

    fn text(&self, index: usize, name: &'static str) -> Result<Option<String>, FieldError> {
        let raw = self.field(index, name)?;
        Ok((!raw.is_empty()).then(|| raw.to_string()))
    }

    /// A numeric field that must be present.
    fn number(&self, index: usize, name: &'static str) -> Result<f64, FieldError> {
        let raw = self.field(index, name)?;
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| FieldError::InvalidNumber {
                name,
                value: raw.to_string(),
            })
    }

    /// A numeric field where empty or zero means "not reported".
    fn reported(&self, index: usize, name: &'static str) -> Result<Option<f64>, FieldError> {
        if self.field(index, name)?.is_empty() {
            return Ok(None);
        }
        let value = self.number(index, name)?;
        Ok((value != 0.0).then_some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(line: &str) -> Result<AircraftUpdate, DecodeError> {
        Frame::parse(line)?.update()
    }

    #[test]
    fn test_parse_identification() {
        let line = "MSG,1,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,UAL123  ,,,,,,,,,,,0";
        assert_eq!(
            update(line).unwrap(),
            AircraftUpdate::Identification {
                callsign: Some("UAL123".to_string())
            }
        );
    }

    #[test]
    fn test_empty_callsign_is_not_reported() {
        let line = "MSG,1,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,,,,,,,,,,,0";
        assert_eq!(
            update(line).unwrap(),
            AircraftUpdate::Identification { callsign: None }
        );
    }

    #[test]
    fn test_parse_position() {
        let line = "MSG,3,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,35000,,,33.9425,-118.4081,,,0,0,0,0";
        let Ok(AircraftUpdate::AirbornePosition(Some(position))) = update(line) else {
            panic!("expected an airborne position");
        };
        assert!((position.latitude - 33.9425).abs() < 1e-9);
        assert!((position.longitude - (-118.4081)).abs() < 1e-9);
        assert_eq!(position.altitude, Some(35000.0));
    }

    #[test]
    fn test_zero_latitude_means_no_position() {
        let line = "MSG,3,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,35000,,,0,-118.4081,,,0,0,0,0";
        assert_eq!(update(line).unwrap(), AircraftUpdate::AirbornePosition(None));

        let line = "MSG,3,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,35000,,,,,,,0,0,0,0";
        assert_eq!(update(line).unwrap(), AircraftUpdate::AirbornePosition(None));
    }

    #[test]
    fn test_parse_velocity_each_field_independent() {
        let line = "MSG,4,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,,450,270,,,0,,0,0,0,0";
        assert_eq!(
            update(line).unwrap(),
            AircraftUpdate::Velocity {
                track: Some(270.0),
                speed: Some(450.0),
                vertical_rate: None,
            }
        );
    }

    #[test]
    fn test_parse_altitude_needs_full_line() {
        let full = "MSG,5,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,30000,,,,,,,0,0,0,0";
        assert_eq!(update(full).unwrap(), AircraftUpdate::Altitude(Some(30000.0)));

        let short = "MSG,5,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,30000";
        assert_eq!(update(short).unwrap(), AircraftUpdate::Altitude(None));
    }

    #[test]
    fn test_parse_squawk() {
        let line = "MSG,6,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,,,,,,,7700,1,1,0,0";
        assert_eq!(
            update(line).unwrap(),
            AircraftUpdate::Squawk(Some("7700".to_string()))
        );
    }

    #[test]
    fn test_parse_all_call_position() {
        let line = "MSG,8,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,9000,,,51.47,-0.45,,,,,,0";
        assert_eq!(
            update(line).unwrap(),
            AircraftUpdate::AllCallReply(Some(Position {
                latitude: 51.47,
                longitude: -0.45,
                altitude: None,
            }))
        );
    }

    #[test]
    fn test_unhandled_type_is_other() {
        let line = "MSG,7,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,12000,,,,,,,,,,0";
        assert_eq!(update(line).unwrap(), AircraftUpdate::Other);
    }

    #[test]
    fn test_parse_non_msg_type() {
        let err = Frame::parse("STA,,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,RM").unwrap_err();
        assert_eq!(err, DecodeError::NotMsg("STA".to_string()));
        assert!(err.is_mismatch());
    }

    #[test]
    fn test_parse_empty_line() {
        assert!(Frame::parse("").unwrap_err().is_mismatch());
    }

    #[test]
    fn test_truncated_line() {
        assert_eq!(Frame::parse("MSG,3,1").unwrap_err(), DecodeError::Truncated(3));
    }

    #[test]
    fn test_address_length() {
        let err = Frame::parse("MSG,3,1,1,A1B2C,1").unwrap_err();
        assert_eq!(err, DecodeError::AddressLength("A1B2C".to_string()));

        let err = Frame::parse("MSG,3,1,1,A1B2C3D,1").unwrap_err();
        assert!(err.is_mismatch());
    }

    #[test]
    fn test_invalid_number_is_bogon() {
        let line = "MSG,3,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,35000,,,north,-118.4081,,,0,0,0,0";
        let Err(DecodeError::Bogon(bogon)) = update(line) else {
            panic!("expected a bogon");
        };
        assert_eq!(bogon.msg_type, "3");
        assert_eq!(bogon.field_count, 22);
        assert_eq!(
            bogon.cause,
            FieldError::InvalidNumber {
                name: "latitude",
                value: "north".to_string()
            }
        );
        assert_eq!(bogon.fields[0], (5, "1".to_string()));
        assert!(bogon.fields.contains(&(11, "35000".to_string())));
        assert!(bogon.fields.contains(&(14, "north".to_string())));
        assert!(bogon.fields.iter().all(|(index, field)| *index > 4 && field != "0"));
    }

    #[test]
    fn test_missing_field_is_bogon() {
        let line = "MSG,6,1,1,A1B2C3,1,2024/01/01,12:00:00.000";
        let err = update(line).unwrap_err();
        assert!(!err.is_mismatch());
        let DecodeError::Bogon(bogon) = err else {
            unreachable!();
        };
        assert_eq!(
            bogon.cause,
            FieldError::Missing {
                name: "squawk",
                index: 17
            }
        );
        assert!(bogon.to_string().starts_with("BOGON: MSG/6 (8):"));
    }

    #[test]
    fn test_reported_fields_skip_empty_and_zero() {
        let frame = Frame::parse("MSG,4,1,1,A1B2C3,,,,,,,,0,270,,,0,,0,0,0,0").unwrap();
        assert_eq!(frame.reported_fields(5), vec![(13, "270")]);
    }
}
