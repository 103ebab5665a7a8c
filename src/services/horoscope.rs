use std::sync::{Arc, Mutex};
use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Span, instrument};

use super::format::{UNAVAILABLE, ZeroValuePolicy, format_value};
use crate::{
    catalog::{CityTable, KETU, RAHU, TRACKED_BODIES},
    ephemeris::{CalcFlags, Calendar, Ephemeris, SiderealMode},
    error::{AppError, AppResult},
    models::{HoroscopeInput, HoroscopeRequest, HoroscopeResponse, PositionDto},
    telemetry::{
        EPHEMERIS_BODY_SKIPPED, EPHEMERIS_COMPUTATION_DURATION, HOROSCOPE_COMPUTED,
        HOROSCOPE_REJECTED,
    },
};

/// Date and UTC time of a request, once every part parsed as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Moment {
    year: i32,
    month: i32,
    day: i32,
    hour: f64,
}

impl Moment {
    /// `YYYY-MM-DD` and `HH:MM`. No range checks; `None` if any of the five
    /// parts is absent or not an integer.
    fn parse(date: &str, time: &str) -> Option<Self> {
        let mut date_parts = date.split('-').map(numeric_part);
        let mut time_parts = time.split(':').map(numeric_part);

        let year = date_parts.next().flatten()?;
        let month = date_parts.next().flatten()?;
        let day = date_parts.next().flatten()?;
        let hour = time_parts.next().flatten()?;
        let minute = time_parts.next().flatten()?;

        Some(Self {
            year,
            month,
            day,
            hour: f64::from(hour) + f64::from(minute) / 60.0,
        })
    }
}

/// Surrounding whitespace is ignored and a blank part counts as zero.
fn numeric_part(part: &str) -> Option<i32> {
    match part.trim() {
        "" => Some(0),
        digits => digits.parse().ok(),
    }
}

#[derive(Clone)]
pub struct HoroscopeService {
    ephemeris: Arc<Mutex<Box<dyn Ephemeris>>>,
    cities: Arc<CityTable>,
    zero_value_policy: ZeroValuePolicy,
}

impl HoroscopeService {
    pub fn new(
        ephemeris: Box<dyn Ephemeris>,
        cities: CityTable,
        zero_value_policy: ZeroValuePolicy,
    ) -> Self {
        Self {
            ephemeris: Arc::new(Mutex::new(ephemeris)),
            cities: Arc::new(cities),
            zero_value_policy,
        }
    }

    #[instrument(
        name = "horoscope.handle",
        skip(self, request),
        fields(location = tracing::field::Empty, julian_day = tracing::field::Empty)
    )]
    pub async fn handle(&self, request: HoroscopeRequest) -> AppResult<HoroscopeResponse> {
        let (date, time, location) = match (request.date, request.time, request.location) {
            (Some(date), Some(time), Some(location))
                if !date.is_empty() && !time.is_empty() && !location.is_empty() =>
            {
                (date, time, location)
            }
            _ => {
                HOROSCOPE_REJECTED.add(1, &[KeyValue::new("reason", "missing_field")]);
                return Err(AppError::MissingField);
            }
        };

        let Some(coordinates) = self.cities.lookup(&location) else {
            HOROSCOPE_REJECTED.add(1, &[KeyValue::new("reason", "unsupported_location")]);
            return Err(AppError::UnsupportedLocation);
        };
        let city = location.to_lowercase();
        Span::current().record("location", city.as_str());

        let moment = Moment::parse(&date, &time);
        if moment.is_none() {
            tracing::warn!(%date, %time, "Date or time is not numeric");
        }

        let (julian_day, sidereal_positions) = self.compute(moment).await?;
        Span::current().record("julian_day", julian_day);

        HOROSCOPE_COMPUTED.add(1, &[KeyValue::new("location", city)]);
        tracing::info!(
            julian_day,
            positions = sidereal_positions.len(),
            "Horoscope computed"
        );

        Ok(HoroscopeResponse {
            input: HoroscopeInput {
                date,
                time,
                location,
            },
            coordinates,
            julian_day,
            sidereal_positions,
        })
    }

    async fn compute(&self, moment: Option<Moment>) -> AppResult<(f64, Vec<PositionDto>)> {
        let ephemeris = Arc::clone(&self.ephemeris);
        let policy = self.zero_value_policy;
        let span = Span::current();

        tokio::task::spawn_blocking(move || {
            span.in_scope(|| compute_positions(&ephemeris, moment, policy))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Ephemeris task failed: {e}")))?
    }
}

/// Configure the engine for Lahiri and compute every tracked body, holding
/// the engine lock for the whole sequence.
fn compute_positions(
    ephemeris: &Mutex<Box<dyn Ephemeris>>,
    moment: Option<Moment>,
    policy: ZeroValuePolicy,
) -> AppResult<(f64, Vec<PositionDto>)> {
    let started = Instant::now();
    let mut engine = ephemeris
        .lock()
        .map_err(|_| AppError::Internal("Ephemeris lock poisoned".to_string()))?;

    let julian_day = match moment {
        Some(m) => engine.julian_day(m.year, m.month, m.day, m.hour, Calendar::Gregorian),
        None => f64::NAN,
    };
    engine.set_sidereal_mode(SiderealMode::lahiri());

    let flags = CalcFlags::SWIEPH | CalcFlags::SIDEREAL;
    let mut positions = Vec::with_capacity(TRACKED_BODIES.len() + 1);

    for descriptor in &TRACKED_BODIES {
        match engine.calc_ut(julian_day, descriptor.body, flags) {
            Ok(raw) => positions.push(PositionDto {
                planet: descriptor.name.to_string(),
                longitude: format_value(raw.longitude, policy),
                speed: format_value(raw.speed, policy),
                retrograde: raw.speed < 0.0,
                right_ascension: format_value(raw.right_ascension, policy),
                declination: format_value(raw.declination, policy),
            }),
            Err(e) => {
                tracing::warn!(
                    body = descriptor.name,
                    engine = engine.name(),
                    error = %e,
                    "Skipping body"
                );
                EPHEMERIS_BODY_SKIPPED.add(1, &[KeyValue::new("body", descriptor.name)]);
            }
        }
    }
    drop(engine);

    if let Some(ketu) = positions.iter().find(|p| p.planet == RAHU).map(ketu_from) {
        positions.push(ketu);
    }

    EPHEMERIS_COMPUTATION_DURATION.record(started.elapsed().as_secs_f64() * 1000.0, &[]);

    Ok((julian_day, positions))
}

/// The south node, opposite Rahu. Built from Rahu's rendered longitude so
/// both entries agree to the printed digit.
fn ketu_from(rahu: &PositionDto) -> PositionDto {
    let longitude = rahu
        .longitude
        .parse::<f64>()
        .map(|lon| format!("{:.6}", (lon + 180.0).rem_euclid(360.0)))
        .unwrap_or_else(|_| UNAVAILABLE.to_string());

    PositionDto {
        planet: KETU.to_string(),
        longitude,
        speed: rahu.speed.clone(),
        retrograde: rahu.retrograde,
        right_ascension: UNAVAILABLE.to_string(),
        declination: UNAVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Coordinates;
    use crate::ephemeris::{Ayanamsha, Body, EphemerisError, RawPosition, SwissEphemeris};

    /// Returns the same position for every body unless told to fail, and
    /// refuses to compute unless Lahiri was configured first.
    struct ScriptedEphemeris {
        mode: Option<SiderealMode>,
        failing: Vec<Body>,
        position: RawPosition,
    }

    impl ScriptedEphemeris {
        fn returning(position: RawPosition) -> Self {
            Self {
                mode: None,
                failing: Vec::new(),
                position,
            }
        }

        fn failing(mut self, bodies: &[Body]) -> Self {
            self.failing = bodies.to_vec();
            self
        }
    }

    impl Ephemeris for ScriptedEphemeris {
        fn set_sidereal_mode(&mut self, mode: SiderealMode) {
            self.mode = Some(mode);
        }

        fn calc_ut(
            &self,
            _jd_ut: f64,
            body: Body,
            flags: CalcFlags,
        ) -> Result<RawPosition, EphemerisError> {
            if self.mode != Some(SiderealMode::lahiri()) || !flags.contains(CalcFlags::SIDEREAL) {
                return Err(EphemerisError::CalculationFailed {
                    body,
                    message: "sidereal mode not configured".to_string(),
                });
            }
            if self.failing.contains(&body) {
                return Err(EphemerisError::CalculationFailed {
                    body,
                    message: "scripted failure".to_string(),
                });
            }
            Ok(self.position)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn position(longitude: f64, speed: f64) -> RawPosition {
        RawPosition {
            longitude,
            latitude: 0.0,
            speed,
            right_ascension: 10.5,
            declination: -4.25,
        }
    }

    fn scripted_service(engine: ScriptedEphemeris, policy: ZeroValuePolicy) -> HoroscopeService {
        HoroscopeService::new(Box::new(engine), CityTable::builtin(), policy)
    }

    fn swiss_service() -> HoroscopeService {
        HoroscopeService::new(
            Box::new(SwissEphemeris::new(None).unwrap()),
            CityTable::builtin(),
            ZeroValuePolicy::default(),
        )
    }

    fn planets(response: &HoroscopeResponse) -> Vec<&str> {
        response
            .sidereal_positions
            .iter()
            .map(|p| p.planet.as_str())
            .collect()
    }

    fn find<'a>(response: &'a HoroscopeResponse, planet: &str) -> Option<&'a PositionDto> {
        response
            .sidereal_positions
            .iter()
            .find(|p| p.planet == planet)
    }

    #[test]
    fn test_parse_moment() {
        assert_eq!(
            Moment::parse("2024-01-01", "12:30"),
            Some(Moment {
                year: 2024,
                month: 1,
                day: 1,
                hour: 12.5
            })
        );
        assert!(Moment::parse("2024-01", "12:00").is_none());
        assert!(Moment::parse("2024-01-01", "12").is_none());
        assert!(Moment::parse("2024-ab-01", "12:00").is_none());
    }

    #[test]
    fn test_parse_moment_blank_and_padded_parts() {
        let blank_month = Moment::parse("2024--01", "12:00").unwrap();
        assert_eq!(blank_month.month, 0);
        assert_eq!(blank_month.day, 1);

        let padded = Moment::parse(" 2024-01 -01", " 12: 05").unwrap();
        assert_eq!(padded.year, 2024);
        assert_eq!(padded.hour, 12.0 + 5.0 / 60.0);

        assert_eq!(Moment::parse("2024-01-01", ":").unwrap().hour, 0.0);
        assert!(Moment::parse("2024-01-01", "12:3 0").is_none());
    }

    #[test]
    fn test_parse_moment_has_no_range_checks() {
        let moment = Moment::parse("2024-13-45", "25:90").unwrap();
        assert_eq!(moment.month, 13);
        assert_eq!(moment.hour, 26.5);
    }

    #[tokio::test]
    async fn test_delhi_new_year() {
        let response = swiss_service()
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "delhi"))
            .await
            .unwrap();

        assert_eq!(
            response.coordinates,
            Coordinates {
                lat: 28.6139,
                lon: 77.2090
            }
        );
        assert_eq!(response.julian_day, 2_460_311.0);
        assert_eq!(
            planets(&response),
            [
                "Sun", "Moon", "Mercury", "Venus", "Mars", "Jupiter", "Saturn", "Uranus",
                "Neptune", "Pluto", "Rahu", "Ketu"
            ]
        );

        for p in &response.sidereal_positions {
            let (_, fraction) = p.longitude.split_once('.').unwrap();
            assert_eq!(fraction.len(), 6, "{}: {}", p.planet, p.longitude);
        }

        let expected = [
            ("Sun", 256.3576),
            ("Jupiter", 11.3935),
            ("Saturn", 309.0971),
            ("Rahu", 356.6596),
            ("Ketu", 176.6596),
        ];
        for (planet, longitude) in expected {
            let actual: f64 = find(&response, planet).unwrap().longitude.parse().unwrap();
            assert!((actual - longitude).abs() < 1e-4, "{planet}: {actual}");
        }
    }

    #[tokio::test]
    async fn test_blank_month_still_computes() {
        let response = swiss_service()
            .handle(HoroscopeRequest::new("2024--01", " 12: 05", "delhi"))
            .await
            .unwrap();

        assert!(response.julian_day.is_finite());
        assert_eq!(response.sidereal_positions.len(), 12);
    }

    #[tokio::test]
    async fn test_pluto_reported_after_2050() {
        let response = swiss_service()
            .handle(HoroscopeRequest::new("2200-01-01", "00:00", "delhi"))
            .await
            .unwrap();

        let pluto: f64 = find(&response, "Pluto").unwrap().longitude.parse().unwrap();
        assert!((pluto - 118.0978).abs() < 1.0, "pluto = {pluto}");
    }

    #[tokio::test]
    async fn test_ketu_opposite_rahu() {
        let response = swiss_service()
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "delhi"))
            .await
            .unwrap();

        let rahu = find(&response, "Rahu").unwrap();
        let ketu = find(&response, "Ketu").unwrap();

        let rahu_longitude: f64 = rahu.longitude.parse().unwrap();
        assert_eq!(
            ketu.longitude,
            format!("{:.6}", (rahu_longitude + 180.0) % 360.0)
        );
        assert_eq!(ketu.speed, rahu.speed);
        assert_eq!(ketu.retrograde, rahu.retrograde);
        assert!(rahu.retrograde);
        assert_eq!(ketu.right_ascension, "N/A");
        assert_eq!(ketu.declination, "N/A");
        assert_eq!(response.sidereal_positions.last().unwrap().planet, "Ketu");
    }

    #[tokio::test]
    async fn test_ketu_wraps_past_360() {
        let service = scripted_service(
            ScriptedEphemeris::returning(position(300.25, -0.05)),
            ZeroValuePolicy::default(),
        );
        let response = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "pune"))
            .await
            .unwrap();

        assert_eq!(find(&response, "Ketu").unwrap().longitude, "120.250000");
    }

    #[tokio::test]
    async fn test_location_is_case_insensitive() {
        let service = swiss_service();
        let upper = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "DeLhI"))
            .await
            .unwrap();
        let lower = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "delhi"))
            .await
            .unwrap();

        assert_eq!(upper.coordinates, lower.coordinates);
        assert_eq!(upper.sidereal_positions, lower.sidereal_positions);
        assert_eq!(upper.input.location, "DeLhI");
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let service = swiss_service();
        let requests = [
            HoroscopeRequest::default(),
            HoroscopeRequest {
                time: None,
                ..HoroscopeRequest::new("2024-01-01", "12:00", "delhi")
            },
            HoroscopeRequest::new("2024-01-01", "12:00", ""),
            HoroscopeRequest::new("", "12:00", "delhi"),
        ];

        for request in requests {
            let result = service.handle(request).await;
            assert!(matches!(result, Err(AppError::MissingField)));
        }
    }

    #[tokio::test]
    async fn test_unsupported_location() {
        let result = swiss_service()
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "atlantis"))
            .await;
        assert!(matches!(result, Err(AppError::UnsupportedLocation)));
    }

    #[tokio::test]
    async fn test_rahu_failure_drops_ketu() {
        let service = scripted_service(
            ScriptedEphemeris::returning(position(100.0, 1.0)).failing(&[Body::MeanNode]),
            ZeroValuePolicy::default(),
        );
        let response = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "mumbai"))
            .await
            .unwrap();

        assert_eq!(response.sidereal_positions.len(), 10);
        assert!(find(&response, "Rahu").is_none());
        assert!(find(&response, "Ketu").is_none());
    }

    #[tokio::test]
    async fn test_failed_bodies_are_skipped() {
        let service = scripted_service(
            ScriptedEphemeris::returning(position(100.0, 1.0)).failing(&[Body::Moon, Body::Pluto]),
            ZeroValuePolicy::default(),
        );
        let response = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "chennai"))
            .await
            .unwrap();

        assert_eq!(
            planets(&response),
            [
                "Sun", "Mercury", "Venus", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune",
                "Rahu", "Ketu"
            ]
        );
    }

    #[tokio::test]
    async fn test_all_bodies_failing_yields_empty_positions() {
        let all = TRACKED_BODIES.map(|d| d.body);
        let service = scripted_service(
            ScriptedEphemeris::returning(position(100.0, 1.0)).failing(&all),
            ZeroValuePolicy::default(),
        );
        let response = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "kolkata"))
            .await
            .unwrap();

        assert_eq!(response.julian_day, 2_460_311.0);
        assert!(response.sidereal_positions.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_date_yields_nan_and_no_positions() {
        let response = swiss_service()
            .handle(HoroscopeRequest::new("next tuesday", "12:00", "hyderabad"))
            .await
            .unwrap();

        assert!(response.julian_day.is_nan());
        assert!(response.sidereal_positions.is_empty());
        assert_eq!(response.input.date, "next tuesday");
    }

    #[tokio::test]
    async fn test_zero_values_unavailable_by_default() {
        let service = scripted_service(
            ScriptedEphemeris::returning(RawPosition {
                longitude: 0.0,
                latitude: 0.0,
                speed: 0.0,
                right_ascension: 0.0,
                declination: 0.0,
            }),
            ZeroValuePolicy::Unavailable,
        );
        let response = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "delhi"))
            .await
            .unwrap();

        let sun = find(&response, "Sun").unwrap();
        assert_eq!(sun.longitude, "N/A");
        assert_eq!(sun.speed, "N/A");
        assert_eq!(sun.right_ascension, "N/A");
        assert_eq!(sun.declination, "N/A");
        assert!(!sun.retrograde);

        let ketu = find(&response, "Ketu").unwrap();
        assert_eq!(ketu.longitude, "N/A");
    }

    #[tokio::test]
    async fn test_zero_values_numeric_policy() {
        let service = scripted_service(
            ScriptedEphemeris::returning(position(0.0, 0.0)),
            ZeroValuePolicy::Numeric,
        );
        let response = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "delhi"))
            .await
            .unwrap();

        let sun = find(&response, "Sun").unwrap();
        assert_eq!(sun.longitude, "0.000000");
        assert_eq!(sun.speed, "0.000000");
        assert_eq!(sun.right_ascension, "10.500000");
        assert_eq!(find(&response, "Ketu").unwrap().longitude, "180.000000");
    }

    #[tokio::test]
    async fn test_retrograde_follows_raw_speed() {
        let service = scripted_service(
            ScriptedEphemeris::returning(position(45.0, -0.5)),
            ZeroValuePolicy::default(),
        );
        let response = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "delhi"))
            .await
            .unwrap();

        for p in &response.sidereal_positions {
            assert!(p.retrograde, "{}", p.planet);
            assert_eq!(p.speed, "-0.500000");
        }
    }

    #[tokio::test]
    async fn test_tiny_negative_speed_is_retrograde() {
        let service = scripted_service(
            ScriptedEphemeris::returning(position(45.0, -1e-9)),
            ZeroValuePolicy::default(),
        );
        let response = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "delhi"))
            .await
            .unwrap();

        let sun = find(&response, "Sun").unwrap();
        assert!(sun.retrograde);
        assert_eq!(sun.speed, "-0.000000");
    }

    #[tokio::test]
    async fn test_repeatable_after_mode_change() {
        let service = swiss_service();
        let request = HoroscopeRequest::new("2024-01-01", "12:00", "bengaluru");

        let first = service.handle(request.clone()).await.unwrap();

        service
            .ephemeris
            .lock()
            .unwrap()
            .set_sidereal_mode(SiderealMode::new(Ayanamsha::FaganBradley, 0.0, 0.0));

        let second = service.handle(request).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_requests_agree() {
        let service = swiss_service();
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .handle(HoroscopeRequest::new("2024-01-01", "12:00", "pune"))
                        .await
                })
            })
            .collect();

        let mut responses = Vec::new();
        for task in tasks {
            responses.push(task.await.unwrap().unwrap());
        }
        assert!(responses.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_internal_error() {
        let service = swiss_service();
        let engine = Arc::clone(&service.ephemeris);
        let _ = std::thread::spawn(move || {
            let _guard = engine.lock().unwrap();
            panic!("poison the engine lock");
        })
        .join();

        let result = service
            .handle(HoroscopeRequest::new("2024-01-01", "12:00", "delhi"))
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
