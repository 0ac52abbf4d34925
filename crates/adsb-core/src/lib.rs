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

//! SBS/BaseStation feed tracking and aircraft alt/az pointing.
//!
//! Two loosely coupled layers:
//!
//! - **Tracker**: a [`Listener`] owns one TCP feed (dump1090 port 30003 or
//!   similar), decodes every complete line into per-aircraft state and hands
//!   each update to an [`AircraftObserver`]. Stale aircraft are removed with
//!   [`Listener::expire`].
//! - **Coordinate engine**: [`compute_bearing`] turns a reported
//!   latitude/longitude/altitude into elevation, azimuth and range from a
//!   fixed [`EarthPoint`], via ECI coordinates and sidereal time.
//!
//! # Quick Start
//!
//! ```no_run
//! use adsb_core::{compute_bearing, eci::unix_seconds, EarthPoint, Listener};
//! use chrono::{Duration, Utc};
//!
//! let observer = EarthPoint::from_degrees(37.62, -122.38, 4.0);
//! let mut listener = Listener::connect("localhost", 30003)?;
//!
//! listener.set_observer(move |aircraft: &adsb_core::Aircraft| {
//!     if !aircraft.has_position() {
//!         return;
//!     }
//!     let t = unix_seconds(Utc::now());
//!     if let Ok(bearing) = compute_bearing(
//!         &observer,
//!         aircraft.latitude,
//!         aircraft.longitude,
//!         aircraft.altitude,
//!         t,
//!     ) {
//!         println!(
//!             "{} alt={:.2} az={:.2} d={:.1}",
//!             aircraft.label(),
//!             bearing.elevation_deg(),
//!             bearing.azimuth_deg(),
//!             bearing.range_km
//!         );
//!     }
//! });
//!
//! loop {
//!     listener.poll()?;
//!     listener.expire(Utc::now() - Duration::seconds(60));
//! }
//! # Ok::<(), adsb_core::FeedError>(())
//! ```
//!
//! # Using Individual Layers
//!
//! The tracker decodes lines from any source:
//!
//! ```
//! use adsb_core::AircraftTracker;
//!
//! let mut tracker = AircraftTracker::new();
//! let line = "MSG,3,1,1,A1B2C3,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,35000,,,33.9425,-118.4081,,,0,0,0,0";
//! let aircraft = tracker.decode(line).unwrap();
//! assert_eq!(aircraft.altitude, 35000.0);
//! assert!(tracker.decode("STA,,1,1,A1B2C3,1").is_err());
//! assert_eq!(tracker.len(), 1);
//! ```

pub mod eci;
pub mod protocol;
pub mod tcp;
pub mod tracker;

use std::io::Read;
use std::net::TcpStream;

use chrono::{DateTime, Utc};
use log::warn;

pub use eci::{compute_bearing, Bearing, BearingError, EarthPoint, EciPoint};
pub use protocol::{AircraftUpdate, Bogon, DecodeError, FieldError, Frame};
pub use tcp::{Feed, FeedConfig, FeedError, LineBuffer};
pub use tracker::{Aircraft, AircraftObserver, AircraftTracker};

/// Line counts from one [`Listener::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Complete lines taken from the buffer.
    pub lines: usize,
    /// Lines applied to a record.
    pub dispatched: usize,
    /// Framing mismatches, dropped silently.
    pub dropped: usize,
    /// Lines reported as bogons.
    pub bogons: usize,
}

/// A feed connection plus the aircraft table it drives.
///
/// Single-owner: `poll` and `expire` both mutate the table and must not
/// run concurrently.
#[derive(Debug)]
pub struct Listener<R = TcpStream> {
    feed: Feed<R>,
    tracker: AircraftTracker,
}

impl Listener<TcpStream> {
    /// Connect with the default [`FeedConfig`] (no read deadline).
    pub fn connect(host: &str, port: u16) -> Result<Self, FeedError> {
        Self::connect_with(host, port, &FeedConfig::default())
    }

    pub fn connect_with(host: &str, port: u16, config: &FeedConfig) -> Result<Self, FeedError> {
        Ok(Self::from_feed(Feed::connect(host, port, config)?))
    }
}

impl<R: Read> Listener<R> {
    #[must_use]
    pub fn from_feed(feed: Feed<R>) -> Self {
        Self::with_tracker(feed, AircraftTracker::new())
    }

    /// Resume an existing table on a new feed, e.g. after a reconnect.
    #[must_use]
    pub fn with_tracker(feed: Feed<R>, tracker: AircraftTracker) -> Self {
        Self { feed, tracker }
    }

    /// Drop the connection, keeping the table and its observer.
    #[must_use]
    pub fn into_tracker(self) -> AircraftTracker {
        self.tracker
    }

    /// Register the per-update observer.
    pub fn set_observer(&mut self, observer: impl AircraftObserver + 'static) {
        self.tracker.set_observer(observer);
    }

    /// Read once from the feed and decode every line it completed.
    ///
    /// Blocks until data arrives or the read deadline passes. Only
    /// connection faults are returned; a bad line never ends the loop.
    pub fn poll(&mut self) -> Result<PollStats, FeedError> {
        let lines = self.feed.read_lines()?;
        let mut stats = PollStats {
            lines: lines.len(),
            ..PollStats::default()
        };

        for line in &lines {
            match self.tracker.decode(line) {
                Ok(_) => stats.dispatched += 1,
                Err(DecodeError::Bogon(bogon)) => {
                    warn!("{bogon}");
                    stats.bogons += 1;
                }
                Err(_) => stats.dropped += 1,
            }
        }

        Ok(stats)
    }

    /// Remove aircraft last seen before `cutoff`; see [`AircraftTracker::expire`].
    pub fn expire(&mut self, cutoff: DateTime<Utc>) -> Vec<String> {
        self.tracker.expire(cutoff)
    }

    #[must_use]
    pub fn tracker(&self) -> &AircraftTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut AircraftTracker {
        &mut self.tracker
    }

    #[must_use]
    pub fn feed(&self) -> &Feed<R> {
        &self.feed
    }
}
