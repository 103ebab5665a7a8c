mod health;
mod horoscope;

pub use health::health_check;
pub use horoscope::compute_horoscope;
