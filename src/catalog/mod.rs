//! Static reference data: supported cities and tracked bodies.

mod bodies;
mod cities;

pub use bodies::{BodyDescriptor, KETU, RAHU, TRACKED_BODIES};
pub use cities::{CatalogError, CityTable, Coordinates};
