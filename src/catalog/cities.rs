use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read city table {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse city table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("City {0:?} appears more than once")]
    DuplicateCity(String),

    #[error("City {0:?} has non-finite coordinates")]
    InvalidCoordinates(String),

    #[error("City table is empty")]
    Empty,
}

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

const BUILTIN: [(&str, Coordinates); 7] = [
    ("delhi", Coordinates { lat: 28.6139, lon: 77.2090 }),
    ("mumbai", Coordinates { lat: 19.0760, lon: 72.8777 }),
    ("chennai", Coordinates { lat: 13.0827, lon: 80.2707 }),
    ("kolkata", Coordinates { lat: 22.5726, lon: 88.3639 }),
    ("bengaluru", Coordinates { lat: 12.9716, lon: 77.5946 }),
    ("hyderabad", Coordinates { lat: 17.3850, lon: 78.4867 }),
    ("pune", Coordinates { lat: 18.5204, lon: 73.8567 }),
];

/// Supported cities keyed by lowercase name. Read-only once built.
#[derive(Debug, Clone)]
pub struct CityTable {
    cities: HashMap<String, Coordinates>,
}

impl CityTable {
    pub fn builtin() -> Self {
        Self {
            cities: BUILTIN
                .iter()
                .map(|(name, coordinates)| (name.to_string(), *coordinates))
                .collect(),
        }
    }

    /// Load a table from a JSON object of `name -> {lat, lon}`.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let entries: HashMap<String, Coordinates> = serde_json::from_str(raw)?;
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut cities = HashMap::with_capacity(entries.len());
        for (name, coordinates) in entries {
            if !coordinates.lat.is_finite() || !coordinates.lon.is_finite() {
                return Err(CatalogError::InvalidCoordinates(name));
            }
            let key = name.to_lowercase();
            if cities.insert(key.clone(), coordinates).is_some() {
                return Err(CatalogError::DuplicateCity(key));
            }
        }

        Ok(Self { cities })
    }

    /// Case-insensitive lookup. No trimming is applied.
    pub fn lookup(&self, location: &str) -> Option<Coordinates> {
        self.cities.get(&location.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl Default for CityTable {
    fn default() -> Self {
        Self::builtin()
    }
}
