use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::LazyLock;

pub static METER: LazyLock<Meter> = LazyLock::new(|| global::meter("sidereal-horoscope-api"));

// --- Domain Metrics ---

pub static HOROSCOPE_COMPUTED: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("horoscope.computed")
        .with_description("Total horoscopes computed")
        .with_unit("{horoscope}")
        .build()
});

pub static HOROSCOPE_REJECTED: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("horoscope.rejected")
        .with_description("Total horoscope requests rejected by validation")
        .with_unit("{request}")
        .build()
});

pub static EPHEMERIS_BODY_SKIPPED: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("ephemeris.body.skipped")
        .with_description("Bodies left out of a response because the ephemeris failed")
        .with_unit("{body}")
        .build()
});

pub static EPHEMERIS_COMPUTATION_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("ephemeris.computation.duration")
        .with_description("Time spent computing all positions for one request, in milliseconds")
        .with_unit("ms")
        .with_boundaries(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0])
        .build()
});

// --- HTTP Metrics ---

pub static HTTP_REQUESTS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("http.requests.total")
        .with_description("Total number of HTTP requests")
        .with_unit("{request}")
        .build()
});

pub static HTTP_REQUEST_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("http.request.duration")
        .with_description("HTTP request duration in milliseconds")
        .with_unit("ms")
        .with_boundaries(vec![
            1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
        ])
        .build()
});
