use swiss_eph::{SE_GREG_CAL, SE_JUL_CAL, swe_julday};

/// Calendar convention for interpreting a civil date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Calendar {
    #[default]
    Gregorian,
    Julian,
}

impl Calendar {
    const fn swiss_flag(self) -> i32 {
        match self {
            Calendar::Gregorian => SE_GREG_CAL,
            Calendar::Julian => SE_JUL_CAL,
        }
    }
}

/// Julian day number for a civil date and a fractional hour of day (UT).
///
/// No range validation is performed: out-of-range months or days are folded
/// arithmetically by `swe_julday`.
pub fn julian_day(year: i32, month: i32, day: i32, hour: f64, calendar: Calendar) -> f64 {
    // SAFETY: pure arithmetic on value arguments, no library state involved.
    unsafe { swe_julday(year, month, day, hour, calendar.swiss_flag()) }
}
