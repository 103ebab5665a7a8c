//! Swiss Ephemeris engine, backed by the C library compiled by `swiss-eph`.
//!
//! The library keeps the sidereal mode and the ephemeris path in global
//! state, which is thread-local on most targets. The engine therefore stores
//! its own configuration and applies it on the calling thread right before
//! each calculation, under a process-wide lock.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Mutex;

use swiss_eph::{SEFLG_MOSEPH, SEFLG_SWIEPH, swe_calc_ut, swe_set_ephe_path, swe_set_sid_mode};

use super::{Body, CalcFlags, Ephemeris, EphemerisError, RawPosition, SiderealMode};

/// Serialises configure-then-calculate on targets where the library state is
/// shared between threads.
static LIBRARY: Mutex<()> = Mutex::new(());

thread_local! {
    /// Ephemeris path last handed to the library on this thread.
    static APPLIED_PATH: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Error buffer size required by `swe_calc_ut`.
const SERR_LEN: usize = 256;

#[derive(Debug, Clone)]
pub struct SwissEphemeris {
    ephe_path: Option<CString>,
    sidereal_mode: SiderealMode,
}

impl SwissEphemeris {
    /// Engine reading `.se1` files from `ephe_path`. Without a path, or when
    /// the files are missing, the library falls back to its built-in Moshier
    /// ephemeris.
    pub fn new(ephe_path: Option<&Path>) -> Result<Self, EphemerisError> {
        let ephe_path = ephe_path
            .map(|path| {
                path.to_str()
                    .and_then(|s| CString::new(s).ok())
                    .ok_or_else(|| {
                        EphemerisError::InvalidEphemerisPath(path.display().to_string())
                    })
            })
            .transpose()?;

        Ok(Self {
            ephe_path,
            sidereal_mode: SiderealMode::default(),
        })
    }

    pub fn sidereal_mode(&self) -> SiderealMode {
        self.sidereal_mode
    }

    fn apply_configuration(&self) {
        if let Some(path) = &self.ephe_path {
            APPLIED_PATH.with(|applied| {
                let mut applied = applied.borrow_mut();
                if applied.as_ref() != Some(path) {
                    // SAFETY: `path` is a valid NUL-terminated string; the
                    // library copies it.
                    unsafe { swe_set_ephe_path(path.as_ptr()) };
                    *applied = Some(path.clone());
                }
            });
        }

        let mode = self.sidereal_mode;
        // SAFETY: plain value arguments.
        unsafe { swe_set_sid_mode(mode.ayanamsha.swiss_id(), mode.t0, mode.ayan_t0) };
    }

    /// One `swe_calc_ut` call. Returns the six output values.
    fn calc_raw(
        &self,
        jd_ut: f64,
        body: Body,
        flags: CalcFlags,
    ) -> Result<[f64; 6], EphemerisError> {
        let mut xx = [0.0_f64; 6];
        let mut serr: [c_char; SERR_LEN] = [0; SERR_LEN];
        let iflag = flags.bits() as i32;

        // SAFETY: `xx` holds the six doubles and `serr` the 256 bytes the
        // library writes at most.
        let returned =
            unsafe { swe_calc_ut(jd_ut, body.id(), iflag, xx.as_mut_ptr(), serr.as_mut_ptr()) };

        // SAFETY: the library always NUL-terminates `serr`, and it starts zeroed.
        let message = unsafe { CStr::from_ptr(serr.as_ptr()) }.to_string_lossy();

        if returned < 0 {
            return Err(EphemerisError::CalculationFailed {
                body,
                message: message.into_owned(),
            });
        }

        if iflag & SEFLG_SWIEPH != 0 && returned & SEFLG_MOSEPH != 0 {
            tracing::debug!(%body, warning = %message, "Swiss files unavailable, used Moshier");
        }

        Ok(xx)
    }
}

impl Ephemeris for SwissEphemeris {
    fn set_sidereal_mode(&mut self, mode: SiderealMode) {
        self.sidereal_mode = mode;
    }

    fn calc_ut(
        &self,
        jd_ut: f64,
        body: Body,
        flags: CalcFlags,
    ) -> Result<RawPosition, EphemerisError> {
        if !jd_ut.is_finite() {
            return Err(EphemerisError::InvalidJulianDay(jd_ut));
        }

        let _library = LIBRARY.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.apply_configuration();

        let flags = flags | CalcFlags::SPEED;
        let ecliptic = self.calc_raw(jd_ut, body, flags)?;
        let equatorial = self.calc_raw(jd_ut, body, flags | CalcFlags::EQUATORIAL)?;

        Ok(RawPosition {
            longitude: ecliptic[0],
            latitude: ecliptic[1],
            speed: ecliptic[3],
            right_ascension: equatorial[0],
            declination: equatorial[1],
        })
    }

    fn name(&self) -> &str {
        "swiss"
    }
}
