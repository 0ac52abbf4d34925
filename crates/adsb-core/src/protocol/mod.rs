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

//! Protocol layer for SBS/BaseStation message decoding.
//!
//! Decoding happens in two stages so the tracker can mark an aircraft as seen
//! between them:
//!
//! 1. [`Frame::parse`] checks the `MSG` marker and the 6-character address.
//!    Failures here are [`DecodeError::is_mismatch`] and the line is dropped
//!    silently.
//! 2. [`Frame::update`] extracts the type-specific fields. A field that is
//!    present but unusable produces a [`Bogon`] report instead.
//!
//! The wire format uses an empty field or a zero to mean "not reported" for
//! latitude, altitude, track, speed and vertical rate. A genuine zero reading
//! is indistinguishable from an absent one, so both are treated as absent.

mod basestation;

use std::fmt;

pub use basestation::{Frame, ADDRESS_LEN, MSG_MARKER};

use thiserror::Error;

/// A field-level failure inside an otherwise well-framed line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing field {index} ({name})")]
    Missing { name: &'static str, index: usize },

    #[error("invalid value for field '{name}': {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Errors that can occur while decoding one line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("expected field 0 to be MSG, got {0:?}")]
    NotMsg(String),

    #[error("line has {0} fields, need at least 5")]
    Truncated(usize),

    #[error("address {0:?} is not 6 characters")]
    AddressLength(String),

    #[error("{0}")]
    Bogon(Box<Bogon>),
}

impl DecodeError {
    /// True for the framing failures that are expected on a live feed and
    /// dropped without a diagnostic.
    #[must_use]
    pub fn is_mismatch(&self) -> bool {
        !matches!(self, Self::Bogon(_))
    }
}

/// Diagnostic for a line that passed framing but failed a type-specific
/// expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct Bogon {
    /// Message subtype (field 1).
    pub msg_type: String,
    /// Number of comma-separated fields on the line.
    pub field_count: usize,
    /// Every non-empty, non-`0` field beyond the address, with its index.
    pub fields: Vec<(usize, String)>,
    /// What went wrong.
    pub cause: FieldError,
}

impl fmt::Display for Bogon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BOGON: {}/{} ({}): {:?}: {}",
            MSG_MARKER, self.msg_type, self.field_count, self.fields, self.cause
        )
    }
}

/// A reported position. Altitude is `None` when the line left it out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// The attributes one line carries, keyed by message type.
///
/// `None` inside a variant means the line was dispatched but had nothing to
/// apply for that attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AircraftUpdate {
    /// MSG,1: callsign.
    Identification { callsign: Option<String> },
    /// MSG,3: airborne position with altitude.
    AirbornePosition(Option<Position>),
    /// MSG,4: track (degrees), ground speed (knots), vertical rate (ft/min).
    Velocity {
        track: Option<f64>,
        speed: Option<f64>,
        vertical_rate: Option<f64>,
    },
    /// MSG,5: altitude in feet.
    Altitude(Option<f64>),
    /// MSG,6: squawk. Applied even when empty.
    Squawk(Option<String>),
    /// MSG,8: position without altitude.
    AllCallReply(Option<Position>),
    /// Any other subtype. Nothing is applied.
    Other,
}
