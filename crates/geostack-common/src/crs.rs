//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coordinate reference system description.
///
/// Only identifies a CRS; any transformation between two of them goes through
/// the `projection` crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// An EPSG registry code, e.g. 4326.
    Epsg(u32),
    /// An OGC WKT definition.
    Wkt(String),
    /// A PROJ string (`+proj=...`).
    Proj(String),
}

impl Crs {
    /// WGS84 geographic (lon/lat in degrees).
    pub const WGS84: Crs = Crs::Epsg(4326);

    /// Web Mercator (meters).
    pub const WEB_MERCATOR: Crs = Crs::Epsg(3857);

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326)
    /// - "EPSG:900913" (legacy alias for EPSG:3857)
    /// - "+proj=longlat +datum=WGS84"
    /// - WKT strings starting with GEOGCS/PROJCS/GEOGCRS/PROJCRS
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let trimmed = s.trim();
        let normalized = trimmed.to_uppercase();

        if normalized == "CRS:84" {
            return Ok(Crs::WGS84);
        }

        if let Some(code) = normalized.strip_prefix("EPSG:") {
            let code: u32 = code
                .trim()
                .parse()
                .map_err(|_| CrsParseError::InvalidEpsg(trimmed.to_string()))?;
            return Ok(match code {
                900913 => Crs::WEB_MERCATOR,
                other => Crs::Epsg(other),
            });
        }

        if trimmed.starts_with("+proj=") {
            return Ok(Crs::Proj(trimmed.to_string()));
        }

        const WKT_ROOTS: [&str; 6] = ["GEOGCS", "PROJCS", "GEOGCRS", "PROJCRS", "GEODCRS", "COMPD_CS"];
        if WKT_ROOTS.iter().any(|root| normalized.starts_with(root)) {
            return Ok(Crs::Wkt(trimmed.to_string()));
        }

        Err(CrsParseError::UnsupportedCrs(trimmed.to_string()))
    }

    /// The EPSG code, when this CRS is registry based.
    pub fn epsg_code(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            _ => None,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        match self {
            Crs::Epsg(code) => matches!(code, 4326 | 4269 | 4258 | 4979),
            Crs::Proj(s) => s.contains("+proj=longlat") || s.contains("+proj=latlong"),
            Crs::Wkt(s) => {
                let upper = s.trim_start().to_uppercase();
                upper.starts_with("GEOGCS") || upper.starts_with("GEOGCRS")
            }
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Wkt(wkt) => write!(f, "{}", wkt),
            Crs::Proj(proj) => write!(f, "{}", proj),
        }
    }
}

impl std::str::FromStr for Crs {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Crs::parse(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid EPSG code: {0}")]
    InvalidEpsg(String),
}
