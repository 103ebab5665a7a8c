mod format;
mod horoscope;

pub use format::{ParsePolicyError, UNAVAILABLE, ZeroValuePolicy, format_value};
pub use horoscope::HoroscopeService;
