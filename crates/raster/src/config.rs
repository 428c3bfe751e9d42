//! Configuration for opening and writing rasters.

use std::sync::Arc;

use geostack_common::{Crs, GeoStackError, GeoStackResult};
use netcdf_source::DatasetBackend;
use serde::{Deserialize, Serialize};

use crate::missing::MissingValue;

/// Crate-wide defaults, usually loaded once from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterConfig {
    /// CRS the X/Y coordinates are stored in, when the file does not say.
    pub crs: Option<Crs>,

    /// CRS the X/Y coordinates map to. Lat/lon files are mapped to WGS84.
    pub mappedcrs: Option<Crs>,

    /// Shift regular interval X/Y coordinates to cell centres before writing.
    pub shift_locus: bool,

    /// Warn when a missing-value attribute does not fit the element type.
    pub verify_missingval: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            crs: None,
            mappedcrs: Some(Crs::WGS84),
            shift_locus: true,
            verify_missingval: true,
        }
    }
}

fn parse_crs_var(name: &str, value: &str) -> GeoStackResult<Option<Crs>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Crs::parse(value)
        .map(Some)
        .map_err(|e| GeoStackError::InvalidConfig(format!("{}: {}", name, e)))
}

fn parse_bool(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

impl RasterConfig {
    /// Load configuration from environment variables.
    ///
    /// - `GEOSTACK_CRS`: e.g. `EPSG:3857`, or `none`
    /// - `GEOSTACK_MAPPED_CRS`: e.g. `EPSG:4326`, or `none`
    /// - `GEOSTACK_SHIFT_LOCUS`: `true` / `false`
    /// - `GEOSTACK_VERIFY_MISSINGVAL`: `true` / `false`
    pub fn from_env() -> GeoStackResult<Self> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GEOSTACK_CRS") {
            config.crs = parse_crs_var("GEOSTACK_CRS", &val)?;
        }

        if let Ok(val) = std::env::var("GEOSTACK_MAPPED_CRS") {
            config.mappedcrs = parse_crs_var("GEOSTACK_MAPPED_CRS", &val)?;
        }

        if let Ok(val) = std::env::var("GEOSTACK_SHIFT_LOCUS") {
            config.shift_locus = parse_bool(&val);
        }

        if let Ok(val) = std::env::var("GEOSTACK_VERIFY_MISSINGVAL") {
            config.verify_missingval = parse_bool(&val);
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> GeoStackResult<()> {
        for crs in [&self.crs, &self.mappedcrs].into_iter().flatten() {
            match crs {
                Crs::Epsg(0) => {
                    return Err(GeoStackError::InvalidConfig("EPSG code must be > 0".to_string()))
                }
                Crs::Wkt(s) | Crs::Proj(s) if s.trim().is_empty() => {
                    return Err(GeoStackError::InvalidConfig(
                        "CRS definition must not be empty".to_string(),
                    ))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Per-call options for `open_array` / `open_stack`.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub crs: Option<Crs>,
    pub mappedcrs: Option<Crs>,
    /// Variable to open as the array. Defaults to the first layer.
    pub name: Option<String>,
    /// Override the missing value found in the file.
    pub missingval: Option<MissingValue>,
    pub verify_missingval: bool,
    /// Backend to use instead of choosing one from the file extension.
    pub backend: Option<Arc<dyn DatasetBackend>>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::from_config(&RasterConfig::default())
    }

    /// Options seeded with the crs settings of `config`.
    pub fn from_config(config: &RasterConfig) -> Self {
        Self {
            crs: config.crs.clone(),
            mappedcrs: config.mappedcrs.clone(),
            verify_missingval: config.verify_missingval,
            ..Default::default()
        }
    }

    pub fn crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn mappedcrs(mut self, mappedcrs: Option<Crs>) -> Self {
        self.mappedcrs = mappedcrs;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn missingval(mut self, missingval: MissingValue) -> Self {
        self.missingval = Some(missingval);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn DatasetBackend>) -> Self {
        self.backend = Some(backend);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RasterConfig::default();
        assert_eq!(config.crs, None);
        assert_eq!(config.mappedcrs, Some(Crs::WGS84));
        assert!(config.shift_locus);
        assert!(config.verify_missingval);
    }

    #[test]
    fn test_config_validation() {
        let mut config = RasterConfig::default();
        assert!(config.validate().is_ok());

        config.crs = Some(Crs::Epsg(0));
        assert!(config.validate().is_err());

        config = RasterConfig::default();
        config.mappedcrs = Some(Crs::Wkt("  ".to_string()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_crs_var() {
        assert_eq!(parse_crs_var("X", "EPSG:3857").unwrap(), Some(Crs::WEB_MERCATOR));
        assert_eq!(parse_crs_var("X", "none").unwrap(), None);
        assert!(parse_crs_var("X", "EPSG:abc").is_err());
    }

    #[test]
    fn test_options_from_config() {
        let config = RasterConfig {
            crs: Some(Crs::WEB_MERCATOR),
            ..Default::default()
        };
        let options = OpenOptions::from_config(&config).name("tmax");
        assert_eq!(options.crs, Some(Crs::WEB_MERCATOR));
        assert_eq!(options.mappedcrs, Some(Crs::WGS84));
        assert_eq!(options.name.as_deref(), Some("tmax"));
        assert!(options.missingval.is_none());
    }
}
