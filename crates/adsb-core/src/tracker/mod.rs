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

//! Aircraft tracking and state management.
//!
//! The tracker keeps one [`Aircraft`] per address, applies decoded lines to
//! it in place and hands the result to an [`AircraftObserver`]. Records are
//! only ever removed by [`AircraftTracker::expire`].

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

use crate::protocol::{AircraftUpdate, DecodeError, Frame, Position};

/// Minimum time between default summaries for the same aircraft.
const REPORT_INTERVAL_SECONDS: i64 = 3;

/// Tracked state for one aircraft address.
///
/// Numeric attributes default to zero, which doubles as "never reported"
/// the same way it does on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Aircraft {
    address: String,
    /// Callsign, last non-empty value wins.
    pub flight: Option<String>,
    /// Transponder squawk code.
    pub squawk: Option<String>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in feet.
    pub altitude: f64,
    /// Track angle in degrees.
    pub track: f64,
    /// Ground speed in knots.
    pub speed: f64,
    /// Vertical rate in feet per minute.
    pub vertical_rate: f64,
    /// Last time a position or altitude was applied.
    pub position_timestamp: Option<DateTime<Utc>>,
    /// Last time a track, speed or vertical rate was applied.
    pub vector_timestamp: Option<DateTime<Utc>>,
    /// Last time any line for this address was processed.
    pub last_seen: DateTime<Utc>,
    last_reported: Option<DateTime<Utc>>,
}

impl Aircraft {
    fn new(address: &str, now: DateTime<Utc>) -> Self {
        Self {
            address: address.to_string(),
            flight: None,
            squawk: None,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            track: 0.0,
            speed: 0.0,
            vertical_rate: 0.0,
            position_timestamp: None,
            vector_timestamp: None,
            last_seen: now,
            last_reported: None,
        }
    }

    /// The 6-character address this record is keyed by.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// True once a non-zero latitude has been applied.
    #[must_use]
    pub fn has_position(&self) -> bool {
        self.latitude != 0.0
    }

    /// Callsign if known, otherwise `##` followed by the address.
    #[must_use]
    pub fn label(&self) -> String {
        self.flight
            .clone()
            .unwrap_or_else(|| format!("##{}", self.address))
    }

    fn apply(&mut self, update: AircraftUpdate, now: DateTime<Utc>) {
        match update {
            AircraftUpdate::Identification {
                callsign: Some(callsign),
            } => {
                self.flight = Some(callsign);
            }
            AircraftUpdate::AirbornePosition(Some(position))
            | AircraftUpdate::AllCallReply(Some(position)) => {
                self.apply_position(position, now);
            }
            AircraftUpdate::Velocity {
                track,
                speed,
                vertical_rate,
            } => {
                let mut applied = false;
                for (slot, value) in [
                    (&mut self.track, track),
                    (&mut self.speed, speed),
                    (&mut self.vertical_rate, vertical_rate),
                ] {
                    if let Some(value) = value {
                        *slot = value;
                        applied = true;
                    }
                }
                if applied {
                    self.vector_timestamp = Some(now);
                }
            }
            AircraftUpdate::Altitude(Some(altitude)) => {
                self.altitude = altitude;
                self.position_timestamp = Some(now);
            }
            AircraftUpdate::Squawk(squawk) => {
                self.squawk = squawk;
            }
            AircraftUpdate::Identification { callsign: None }
            | AircraftUpdate::AirbornePosition(None)
            | AircraftUpdate::AllCallReply(None)
            | AircraftUpdate::Altitude(None)
            | AircraftUpdate::Other => {}
        }
    }

    fn apply_position(&mut self, position: Position, now: DateTime<Utc>) {
        self.latitude = position.latitude;
        self.longitude = position.longitude;
        if let Some(altitude) = position.altitude {
            self.altitude = altitude;
        }
        self.position_timestamp = Some(now);
    }

    fn report_due(&self, now: DateTime<Utc>) -> bool {
        self.last_reported
            .is_none_or(|last| now - last > Duration::seconds(REPORT_INTERVAL_SECONDS))
    }
}

impl fmt::Display for Aircraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:>6}) {:>7}: ({:.1}, {:.1})@{:.0}, {:.0} at {:.0} knots, vr={:.0}",
            self.address,
            self.flight.as_deref().unwrap_or("None"),
            self.latitude,
            self.longitude,
            self.altitude,
            self.track,
            self.speed,
            self.vertical_rate
        )
    }
}

/// Receives every successfully dispatched update, in line order.
///
/// Closures taking `&Aircraft` implement this trait directly.
pub trait AircraftObserver: Send {
    fn on_update(&mut self, aircraft: &Aircraft);
}

impl<F> AircraftObserver for F
where
    F: FnMut(&Aircraft) + Send,
{
    fn on_update(&mut self, aircraft: &Aircraft) {
        self(aircraft);
    }
}

/// Aircraft table keyed by address.
///
/// Not synchronised: decode and expire must run on the task that owns the
/// tracker. Other tasks should read through [`AircraftTracker::snapshot`].
#[derive(Default)]
pub struct AircraftTracker {
    aircraft: HashMap<String, Aircraft>,
    observer: Option<Box<dyn AircraftObserver>>,
}

impl fmt::Debug for AircraftTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AircraftTracker")
            .field("aircraft_count", &self.aircraft.len())
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl AircraftTracker {
    /// Create an empty tracker with no observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the observer called after every dispatched line, replacing
    /// any previous one.
    pub fn set_observer(&mut self, observer: impl AircraftObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Remove the observer; updates fall back to throttled summary logging.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Decode one line using the wall clock.
    pub fn decode(&mut self, line: &str) -> Result<&Aircraft, DecodeError> {
        self.decode_at(line, Utc::now())
    }

    /// Decode one line and apply it to the matching record.
    ///
    /// The record is created and marked seen as soon as framing succeeds,
    /// even if the type-specific fields then fail as a bogon. The observer
    /// (or, without one, the summary log) runs only when the line is
    /// dispatched.
    pub fn decode_at(&mut self, line: &str, now: DateTime<Utc>) -> Result<&Aircraft, DecodeError> {
        let frame = Frame::parse(line)?;

        let aircraft = self
            .aircraft
            .entry(frame.address().to_string())
            .or_insert_with(|| Aircraft::new(frame.address(), now));
        aircraft.last_seen = now;

        let update = frame.update()?;
        if update == AircraftUpdate::Other {
            debug!(
                "Unhandled MSG,{} for {}: {:?}",
                frame.msg_type(),
                frame.address(),
                frame.reported_fields(0)
            );
        }
        aircraft.apply(update, now);

        if let Some(observer) = self.observer.as_mut() {
            observer.on_update(aircraft);
        } else if aircraft.report_due(now) {
            info!("{aircraft}");
            aircraft.last_reported = Some(now);
        }

        Ok(aircraft)
    }

    /// Remove every aircraft last seen strictly before `cutoff` and return
    /// their addresses.
    pub fn expire(&mut self, cutoff: DateTime<Utc>) -> Vec<String> {
        let removed: Vec<String> = self
            .aircraft
            .values()
            .filter(|aircraft| aircraft.last_seen < cutoff)
            .map(|aircraft| aircraft.address.clone())
            .collect();

        for address in &removed {
            self.aircraft.remove(address);
        }

        if !removed.is_empty() {
            debug!("Expired {} aircraft: {:?}", removed.len(), removed);
        }
        removed
    }

    /// Remove every aircraft not seen within `max_age` of the wall clock.
    pub fn expire_older_than(&mut self, max_age: Duration) -> Vec<String> {
        self.expire(Utc::now() - max_age)
    }

    /// Get a specific aircraft by address.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&Aircraft> {
        self.aircraft.get(address)
    }

    /// Iterate over all tracked aircraft, in no particular order.
    pub fn aircraft(&self) -> impl Iterator<Item = &Aircraft> {
        self.aircraft.values()
    }

    /// Clone every record, for readers on another task.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Aircraft> {
        self.aircraft.values().cloned().collect()
    }

    /// Get the number of tracked aircraft.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    /// Check if there are no tracked aircraft.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }
}
