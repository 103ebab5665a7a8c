use crate::ephemeris::Body;

/// Display name of the mean lunar node in responses.
pub const RAHU: &str = "Rahu";
/// Name of the derived entry opposite Rahu.
pub const KETU: &str = "Ketu";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyDescriptor {
    pub body: Body,
    pub name: &'static str,
}

const fn descriptor(body: Body, name: &'static str) -> BodyDescriptor {
    BodyDescriptor { body, name }
}

/// Bodies computed for every request, in response order.
pub const TRACKED_BODIES: [BodyDescriptor; 11] = [
    descriptor(Body::Sun, "Sun"),
    descriptor(Body::Moon, "Moon"),
    descriptor(Body::Mercury, "Mercury"),
    descriptor(Body::Venus, "Venus"),
    descriptor(Body::Mars, "Mars"),
    descriptor(Body::Jupiter, "Jupiter"),
    descriptor(Body::Saturn, "Saturn"),
    descriptor(Body::Uranus, "Uranus"),
    descriptor(Body::Neptune, "Neptune"),
    descriptor(Body::Pluto, "Pluto"),
    descriptor(Body::MeanNode, RAHU),
];
