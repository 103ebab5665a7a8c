use std::fmt;
use std::str::FromStr;

use super::EphemerisError;

/// Sidereal reference-point conventions, a subset of the Swiss Ephemeris
/// `SE_SIDM_*` modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ayanamsha {
    FaganBradley,
    Lahiri,
    Raman,
    Krishnamurti,
    Yukteshwar,
    /// Offset defined by the caller through `SiderealMode::t0`/`ayan_t0`.
    User,
}

const AYANAMSHAS: &[(&str, Ayanamsha)] = &[
    ("fagan_bradley", Ayanamsha::FaganBradley),
    ("lahiri", Ayanamsha::Lahiri),
    ("chitrapaksha", Ayanamsha::Lahiri),
    ("raman", Ayanamsha::Raman),
    ("krishnamurti", Ayanamsha::Krishnamurti),
    ("yukteshwar", Ayanamsha::Yukteshwar),
    ("user", Ayanamsha::User),
];

impl Ayanamsha {
    /// Swiss Ephemeris `SE_SIDM_*` constant for this mode.
    pub const fn swiss_id(self) -> i32 {
        match self {
            Ayanamsha::FaganBradley => swiss_eph::SE_SIDM_FAGAN_BRADLEY,
            Ayanamsha::Lahiri => swiss_eph::SE_SIDM_LAHIRI,
            Ayanamsha::Raman => swiss_eph::SE_SIDM_RAMAN,
            Ayanamsha::Krishnamurti => swiss_eph::SE_SIDM_KRISHNAMURTI,
            Ayanamsha::Yukteshwar => swiss_eph::SE_SIDM_YUKTESHWAR,
            Ayanamsha::User => swiss_eph::SE_SIDM_USER,
        }
    }
}

impl fmt::Display for Ayanamsha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = AYANAMSHAS
            .iter()
            .find(|(_, mode)| mode == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown");
        f.write_str(name)
    }
}

impl FromStr for Ayanamsha {
    type Err = EphemerisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        AYANAMSHAS
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, mode)| *mode)
            .ok_or_else(|| EphemerisError::InvalidAyanamsha {
                ayanamsha: s.to_string(),
                valid: AYANAMSHAS.iter().map(|(name, _)| name.to_string()).collect(),
            })
    }
}

/// Sidereal mode as passed to `set_sidereal_mode`.
///
/// `t0` and `ayan_t0` only take effect for `Ayanamsha::User`; the predefined
/// modes carry their own reference epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiderealMode {
    pub ayanamsha: Ayanamsha,
    pub t0: f64,
    pub ayan_t0: f64,
}

impl SiderealMode {
    pub const fn new(ayanamsha: Ayanamsha, t0: f64, ayan_t0: f64) -> Self {
        Self {
            ayanamsha,
            t0,
            ayan_t0,
        }
    }

    pub const fn lahiri() -> Self {
        Self::new(Ayanamsha::Lahiri, 0.0, 0.0)
    }
}

impl Default for SiderealMode {
    fn default() -> Self {
        Self::new(Ayanamsha::FaganBradley, 0.0, 0.0)
    }
}
