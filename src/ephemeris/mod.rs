//! Ephemeris collaborator.
//!
//! The horoscope service only talks to the [`Ephemeris`] trait, whose shape
//! mirrors the Swiss Ephemeris calling convention: a Julian-day helper, a
//! mutable sidereal-mode setting, and a per-body position calculator driven
//! by bit flags. [`SwissEphemeris`] is the production implementation.

pub mod ayanamsha;
pub mod julian;
pub mod swiss;

use std::fmt;
use std::ops::BitOr;

use thiserror::Error;

pub use ayanamsha::{Ayanamsha, SiderealMode};
pub use julian::{Calendar, julian_day};
pub use swiss::SwissEphemeris;

/// Errors reported by an ephemeris engine for a single calculation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("Invalid Julian day: {0}")]
    InvalidJulianDay(f64),

    #[error("Invalid ephemeris path: {0}")]
    InvalidEphemerisPath(String),

    #[error("Invalid ayanamsha: {ayanamsha}. Valid ayanamshas: {valid:?}")]
    InvalidAyanamsha { ayanamsha: String, valid: Vec<String> },

    #[error("Failed to calculate position for {body}: {message}")]
    CalculationFailed { body: Body, message: String },
}

/// Bodies the engine can compute. Ids follow the Swiss Ephemeris numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    /// Mean ascending lunar node.
    MeanNode,
}

impl Body {
    pub const fn id(self) -> i32 {
        match self {
            Body::Sun => swiss_eph::SE_SUN,
            Body::Moon => swiss_eph::SE_MOON,
            Body::Mercury => swiss_eph::SE_MERCURY,
            Body::Venus => swiss_eph::SE_VENUS,
            Body::Mars => swiss_eph::SE_MARS,
            Body::Jupiter => swiss_eph::SE_JUPITER,
            Body::Saturn => swiss_eph::SE_SATURN,
            Body::Uranus => swiss_eph::SE_URANUS,
            Body::Neptune => swiss_eph::SE_NEPTUNE,
            Body::Pluto => swiss_eph::SE_PLUTO,
            Body::MeanNode => swiss_eph::SE_MEAN_NODE,
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Body::Sun => "sun",
            Body::Moon => "moon",
            Body::Mercury => "mercury",
            Body::Venus => "venus",
            Body::Mars => "mars",
            Body::Jupiter => "jupiter",
            Body::Saturn => "saturn",
            Body::Uranus => "uranus",
            Body::Neptune => "neptune",
            Body::Pluto => "pluto",
            Body::MeanNode => "mean_node",
        };
        f.write_str(name)
    }
}

/// Calculation flags, bit-compatible with Swiss Ephemeris `SEFLG_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalcFlags(u32);

impl CalcFlags {
    pub const SWIEPH: CalcFlags = CalcFlags(swiss_eph::SEFLG_SWIEPH as u32);
    pub const MOSEPH: CalcFlags = CalcFlags(swiss_eph::SEFLG_MOSEPH as u32);
    pub const SPEED: CalcFlags = CalcFlags(swiss_eph::SEFLG_SPEED as u32);
    pub const EQUATORIAL: CalcFlags = CalcFlags(swiss_eph::SEFLG_EQUATORIAL as u32);
    pub const SIDEREAL: CalcFlags = CalcFlags(swiss_eph::SEFLG_SIDEREAL as u32);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: CalcFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CalcFlags {
    type Output = CalcFlags;

    fn bitor(self, rhs: CalcFlags) -> CalcFlags {
        CalcFlags(self.0 | rhs.0)
    }
}

/// Raw result of one position calculation. Angles in degrees, speed in
/// degrees per day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub speed: f64,
    pub right_ascension: f64,
    pub declination: f64,
}

/// Contract of the ephemeris engine used by the horoscope service.
///
/// `set_sidereal_mode` mutates engine state that later `calc_ut` calls with
/// [`CalcFlags::SIDEREAL`] read, so callers sharing one engine must hold
/// exclusive access across the configure-then-calculate sequence.
pub trait Ephemeris: Send {
    fn julian_day(&self, year: i32, month: i32, day: i32, hour: f64, calendar: Calendar) -> f64 {
        julian_day(year, month, day, hour, calendar)
    }

    fn set_sidereal_mode(&mut self, mode: SiderealMode);

    fn calc_ut(&self, jd_ut: f64, body: Body, flags: CalcFlags)
    -> Result<RawPosition, EphemerisError>;

    fn name(&self) -> &str;
}
