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

//! Greenwich mean sidereal time from unix time.
//!
//! Linear model anchored at 2000-01-01T12:00Z, good to roughly 0.1 s per
//! century. UTC is used in place of UT1.

use std::f64::consts::TAU;

use chrono::{DateTime, Utc};

/// Unix time of 2000-01-01T12:00:00Z.
pub const J2000_UNIX: f64 = 946_728_000.0;

/// GMST in hours at [`J2000_UNIX`].
pub const GMST_AT_J2000_HOURS: f64 = 18.697_374_558;

/// Sidereal hours elapsed per solar day.
pub const SIDEREAL_HOURS_PER_DAY: f64 = 24.065_709_824_419_08;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// GMST in radians, in `[0, 2π)`, for unix time `t` in seconds.
#[must_use]
pub fn gmst(t: f64) -> f64 {
    let days = (t - J2000_UNIX) / SECONDS_PER_DAY;
    let hours = (GMST_AT_J2000_HOURS + SIDEREAL_HOURS_PER_DAY * days).rem_euclid(24.0);
    hours / 24.0 * TAU
}

/// Unix seconds with sub-second precision.
#[must_use]
pub fn unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) * 1e-9
}
