mod horoscope;

pub use horoscope::{HoroscopeInput, HoroscopeRequest, HoroscopeResponse, PositionDto};
