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

//! Earth-centered inertial coordinates and topocentric alt/az.
//!
//! An [`EarthPoint`] is a fixed geographic location. Its [`EciPoint`] at a
//! given unix time comes from the local sidereal angle plus a spheroid
//! correction, and is recomputed on every call. Everything here is pure;
//! share freely between threads.
//!
//! Distances are kilometres, angles radians, times unix seconds.

mod sidereal;

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;

use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

pub use sidereal::{
    gmst, unix_seconds, GMST_AT_J2000_HOURS, J2000_UNIX, SIDEREAL_HOURS_PER_DAY,
};

/// WGS84 figure and rotation constants.
pub mod wgs84 {
    /// Flattening of the spheroid.
    pub const FLATTENING: f64 = 1.0 / 298.257_223_560;
    /// Equatorial radius in kilometres.
    pub const EQUATORIAL_RADIUS_KM: f64 = 6378.137;
    /// Earth rotation rate in radians per second (2π per sidereal day).
    pub const ROTATION_RATE: f64 = 7.292_115e-5;
}

const FEET_TO_KM: f64 = 0.3048 / 1000.0;

// Below this range the look direction is meaningless.
const MIN_RANGE_KM: f64 = 1e-9;

/// Failure of a bearing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BearingError {
    #[error("target coincides with observer; elevation is undefined")]
    Coincident,
}

/// Position (km) and velocity (km/s) in the ECI frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciPoint {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl EciPoint {
    /// Absolute speed in km/s.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Vector from this point to `other`.
    #[must_use]
    pub fn range_to(&self, other: &EciPoint) -> Vector3<f64> {
        other.position - self.position
    }

    /// Velocity of `other` relative to this point.
    #[must_use]
    pub fn range_vel(&self, other: &EciPoint) -> Vector3<f64> {
        other.velocity - self.velocity
    }
}

impl fmt::Display for EciPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.position;
        let v = &self.velocity;
        write!(
            f,
            "({:.3},{:.3},{:.3}) km @ ({:.3},{:.3},{:.3}) km/s",
            p.x, p.y, p.z, v.x, v.y, v.z
        )
    }
}

/// A fixed point on (or above) the Earth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarthPoint {
    latitude: f64,
    longitude: f64,
    altitude_km: f64,
}

impl EarthPoint {
    /// Latitude and longitude in radians, altitude in metres.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_km: altitude_m / 1000.0,
        }
    }

    /// Latitude and longitude in degrees, altitude in metres.
    #[must_use]
    pub fn from_degrees(latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self::new(latitude.to_radians(), longitude.to_radians(), altitude_m)
    }

    /// Latitude and longitude in degrees, altitude in feet, as the feed
    /// reports aircraft.
    #[must_use]
    pub fn from_feet(latitude: f64, longitude: f64, altitude_ft: f64) -> Self {
        Self {
            latitude: latitude.to_radians(),
            longitude: longitude.to_radians(),
            altitude_km: altitude_ft * FEET_TO_KM,
        }
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn altitude_km(&self) -> f64 {
        self.altitude_km
    }

    /// Local mean sidereal time in radians: GMST plus longitude.
    #[must_use]
    pub fn lmst(&self, t: f64) -> f64 {
        gmst(t) + self.longitude
    }

    /// ECI position and velocity at unix time `t`.
    #[must_use]
    pub fn at(&self, t: f64) -> EciPoint {
        use wgs84::{EQUATORIAL_RADIUS_KM as A, FLATTENING as F, ROTATION_RATE as OMEGA};

        let theta = self.lmst(t);
        let (sin_lat, cos_lat) = self.latitude.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();

        // Spheroid correction
        let c = (1.0 + F * (F - 2.0) * sin_lat * sin_lat).sqrt();
        let sq = c * (1.0 - F) * (1.0 - F);

        let equatorial = (A * sq + self.altitude_km) * cos_lat;
        let position = Vector3::new(
            equatorial * cos_theta,
            equatorial * sin_theta,
            (A * c + self.altitude_km) * sin_lat,
        );
        // Pure rotation about the polar axis.
        let velocity = Vector3::new(-OMEGA * position.y, OMEGA * position.x, 0.0);

        EciPoint { position, velocity }
    }

    /// Vector from here to `target` in the south-east-up frame at time `t`.
    #[must_use]
    pub fn topocentric(&self, t: f64, target: &EciPoint) -> Vector3<f64> {
        let range = self.at(t).range_to(target);
        let theta = self.lmst(t);

        let (sin_lat, cos_lat) = self.latitude.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();

        #[rustfmt::skip]
        let to_sez = Matrix3::new(
            sin_lat * cos_theta, sin_lat * sin_theta, -cos_lat,
            -sin_theta,          cos_theta,           0.0,
            cos_lat * cos_theta, cos_lat * sin_theta, sin_lat,
        );

        to_sez * range
    }

    /// Elevation and azimuth of `target` seen from here, in radians.
    ///
    /// Azimuth is `π/2 − atan2(S, E)` wrapped into `[0, 2π)`: east reads
    /// π/2 and west 3π/2, while north and south are mirrored relative to a
    /// compass bearing (due north reads π).
    pub fn alt_az(&self, t: f64, target: &EciPoint) -> Result<(f64, f64), BearingError> {
        let sez = self.topocentric(t, target);
        let distance = sez.norm();
        if distance < MIN_RANGE_KM {
            return Err(BearingError::Coincident);
        }

        let azimuth = wrap_azimuth(FRAC_PI_2 - sez.x.atan2(sez.y));
        let elevation = (sez.z / distance).clamp(-1.0, 1.0).asin();

        Ok((elevation, azimuth))
    }

    /// Elevation, azimuth and range to another fixed point at time `t`.
    pub fn bearing_to(&self, t: f64, target: &EarthPoint) -> Result<Bearing, BearingError> {
        let target = target.at(t);
        let (elevation, azimuth) = self.alt_az(t, &target)?;
        let range_km = self.at(t).range_to(&target).norm();

        Ok(Bearing {
            elevation,
            azimuth,
            range_km,
        })
    }
}

impl fmt::Display for EarthPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.4},{:.4})@{:.1}m",
            self.latitude.to_degrees(),
            self.longitude.to_degrees(),
            self.altitude_km * 1000.0
        )
    }
}

/// Look direction from an observer to a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bearing {
    /// Radians above the horizon.
    pub elevation: f64,
    /// Radians, `[0, 2π)`.
    pub azimuth: f64,
    /// Straight-line distance in kilometres.
    pub range_km: f64,
}

impl Bearing {
    #[must_use]
    pub fn elevation_deg(&self) -> f64 {
        self.elevation.to_degrees()
    }

    #[must_use]
    pub fn azimuth_deg(&self) -> f64 {
        self.azimuth.to_degrees()
    }
}

// rem_euclid can round a tiny negative input up to exactly TAU.
fn wrap_azimuth(raw: f64) -> f64 {
    let azimuth = raw.rem_euclid(TAU);
    if azimuth >= TAU {
        0.0
    } else {
        azimuth
    }
}

/// Bearing from `observer` to a target reported in degrees and feet, at
/// unix time `t`.
pub fn compute_bearing(
    observer: &EarthPoint,
    target_lat: f64,
    target_lon: f64,
    target_alt_ft: f64,
    t: f64,
) -> Result<Bearing, BearingError> {
    observer.bearing_to(t, &EarthPoint::from_feet(target_lat, target_lon, target_alt_ft))
}
