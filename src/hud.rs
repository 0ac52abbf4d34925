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

//! Pointing output: one alt/az/range line per aircraft whenever its state
//! moved on and the report interval has passed.

use std::collections::HashMap;
use std::time::Duration;

use adsb_core::eci::unix_seconds;
use adsb_core::{compute_bearing, Aircraft, AircraftObserver, EarthPoint};
use chrono::{DateTime, Utc};
use log::debug;

/// Observer that prints bearings from a fixed point.
#[derive(Debug)]
pub struct BearingReporter {
    observer: EarthPoint,
    interval: chrono::Duration,
    forget_after: chrono::Duration,
    last_printed: HashMap<String, DateTime<Utc>>,
    last_pruned: Option<DateTime<Utc>>,
}

impl BearingReporter {
    /// `forget_after` should match the tracker's expiry timeout so the
    /// per-aircraft throttle state does not outlive the aircraft.
    pub fn new(observer: EarthPoint, interval: Duration, forget_after: Duration) -> Self {
        Self {
            observer,
            interval: to_chrono(interval),
            forget_after: to_chrono(forget_after),
            last_printed: HashMap::new(),
            last_pruned: None,
        }
    }

    /// Format the line for `aircraft` if one is due at `now`, and record it
    /// as printed.
    pub fn report_at(&mut self, aircraft: &Aircraft, now: DateTime<Utc>) -> Option<String> {
        self.prune(now);

        if !aircraft.has_position() {
            return None;
        }

        let last = self.last_printed.get(aircraft.address()).copied();
        if let Some(last) = last {
            let changed = aircraft.position_timestamp.is_some_and(|t| t > last)
                || aircraft.vector_timestamp.is_some_and(|t| t > last);
            if now - last <= self.interval || !changed {
                return None;
            }
        }

        let bearing = match compute_bearing(
            &self.observer,
            aircraft.latitude,
            aircraft.longitude,
            aircraft.altitude,
            unix_seconds(now),
        ) {
            Ok(bearing) => bearing,
            Err(e) => {
                debug!("No bearing to {}: {}", aircraft.address(), e);
                return None;
            }
        };

        self.last_printed.insert(aircraft.address().to_string(), now);

        Some(format!(
            "[{:>8}] alt={:5.2} az={:6.2} d={:5.1} el={:5.0} ({:6.3},{:7.3}) / ({:6.3}, {:6.3})",
            aircraft.label(),
            bearing.elevation_deg(),
            bearing.azimuth_deg(),
            bearing.range_km,
            aircraft.altitude,
            aircraft.latitude,
            aircraft.longitude,
            aircraft.latitude - self.observer.latitude().to_degrees(),
            aircraft.longitude - self.observer.longitude().to_degrees(),
        ))
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        if self
            .last_pruned
            .is_some_and(|last| now - last < self.forget_after)
        {
            return;
        }
        let cutoff = now - self.forget_after;
        self.last_printed.retain(|_, printed| *printed >= cutoff);
        self.last_pruned = Some(now);
    }
}

impl AircraftObserver for BearingReporter {
    fn on_update(&mut self, aircraft: &Aircraft) {
        if let Some(line) = self.report_at(aircraft, Utc::now()) {
            println!("{line}");
        }
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use adsb_core::AircraftTracker;
    use chrono::TimeZone;

    use super::*;

    const POSITION: &str = "MSG,3,1,1,ABCDEF,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,1234,,,37.5,-122.3,,,0,0,0,0";
    const SQUAWK: &str = "MSG,6,1,1,ABCDEF,1,2024/01/01,12:00:00.000,2024/01/01,12:00:00.000,,,,,,,,1200,0,0,0,0";

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn reporter() -> BearingReporter {
        BearingReporter::new(
            EarthPoint::from_degrees(37.4, -122.3, 10.0),
            Duration::from_secs(3),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_line_format() {
        let mut tracker = AircraftTracker::new();
        let aircraft = tracker.decode_at(POSITION, at(0)).unwrap().clone();

        let line = reporter().report_at(&aircraft, at(0)).unwrap();
        assert!(line.starts_with("[##ABCDEF] alt="), "{line}");
        assert!(line.contains(" d= 11."), "{line}");
        assert!(line.contains(" el= 1234 "), "{line}");
        assert!(line.contains("(37.500,-122.300) / ( 0.100,"), "{line}");
    }

    #[test]
    fn test_no_line_without_position() {
        let mut tracker = AircraftTracker::new();
        let aircraft = tracker.decode_at(SQUAWK, at(0)).unwrap().clone();
        assert_eq!(reporter().report_at(&aircraft, at(0)), None);
    }

    #[test]
    fn test_throttled_until_interval_and_change() {
        let mut tracker = AircraftTracker::new();
        let mut reporter = reporter();

        let aircraft = tracker.decode_at(POSITION, at(0)).unwrap().clone();
        assert!(reporter.report_at(&aircraft, at(0)).is_some());

        // Moved, but inside the interval.
        let aircraft = tracker.decode_at(POSITION, at(1)).unwrap().clone();
        assert!(reporter.report_at(&aircraft, at(1)).is_none());

        // The move at 1s is still unreported once the interval passes.
        let aircraft = tracker.decode_at(SQUAWK, at(5)).unwrap().clone();
        assert!(reporter.report_at(&aircraft, at(5)).is_some());

        // Nothing new since.
        assert!(reporter.report_at(&aircraft, at(10)).is_none());

        let aircraft = tracker.decode_at(POSITION, at(11)).unwrap().clone();
        assert!(reporter.report_at(&aircraft, at(11)).is_some());
    }

    #[test]
    fn test_interval_must_be_exceeded() {
        let mut tracker = AircraftTracker::new();
        let mut reporter = reporter();

        let aircraft = tracker.decode_at(POSITION, at(0)).unwrap().clone();
        assert!(reporter.report_at(&aircraft, at(0)).is_some());

        let aircraft = tracker.decode_at(POSITION, at(2)).unwrap().clone();
        assert!(reporter.report_at(&aircraft, at(3)).is_none());
        assert!(reporter.report_at(&aircraft, at(4)).is_some());
    }

    #[test]
    fn test_forgotten_aircraft_report_again() {
        let mut tracker = AircraftTracker::new();
        let mut reporter = reporter();
        let aircraft = tracker.decode_at(POSITION, at(0)).unwrap().clone();
        assert!(reporter.report_at(&aircraft, at(0)).is_some());

        assert!(reporter.report_at(&aircraft, at(30)).is_none());
        assert!(reporter.report_at(&aircraft, at(61)).is_some());
        assert_eq!(reporter.last_printed.len(), 1);
    }
}
