//! Missing-value sentinels: discovery on read, fill on write.

use geostack_common::{DataType, GeoStackError, GeoStackResult, Metadata, RasterData, Scalar};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// CF attribute holding the fill value.
pub const FILL_VALUE_ATTR: &str = "_FillValue";

/// Older attribute some files use instead of `_FillValue`.
pub const MISSING_VALUE_ATTR: &str = "missing_value";

/// How missing cells of an array are marked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MissingValue {
    /// No sentinel.
    None,
    /// Missing cells are NaN in memory; a fill value is chosen on write.
    Masked,
    /// Cells equal to this value are missing.
    Value(Scalar),
}

impl MissingValue {
    pub fn scalar(&self) -> Option<Scalar> {
        match self {
            MissingValue::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Find the missing value of a variable from `_FillValue`, else `missing_value`.
///
/// The sentinel is cast to `dtype`. Sentinels that cannot be cast are dropped
/// with a warning. With `verify`, a floating point sentinel on an integer
/// element type is kept but also warned about.
pub fn discover_missingval(attrs: &Metadata, dtype: DataType, verify: bool) -> MissingValue {
    let Some((attr, value)) = [FILL_VALUE_ATTR, MISSING_VALUE_ATTR]
        .iter()
        .find_map(|name| attrs.get(name).map(|v| (*name, v)))
    else {
        return MissingValue::None;
    };

    match value.to_scalar(dtype) {
        Some(scalar) => {
            if verify && value.natural_dtype() == Some(DataType::F64) && !dtype.is_float() {
                warn!(
                    attr,
                    %dtype,
                    value = scalar.as_f64(),
                    "Missing value type does not match element type"
                );
            }
            MissingValue::Value(scalar)
        }
        None => {
            warn!(attr, %dtype, ?value, "Missing value cannot be represented in element type, ignoring");
            MissingValue::None
        }
    }
}

/// Prepare data and attributes for writing.
///
/// Returns the data with masked cells filled, and the attributes with
/// `_FillValue` set to the sentinel written (or removed when there is none).
pub fn apply_missingval(
    data: &RasterData,
    attrs: &Metadata,
    missingval: &MissingValue,
) -> GeoStackResult<(RasterData, Metadata)> {
    let dtype = data.dtype();
    let base = attrs.clone().without(FILL_VALUE_ATTR).without(MISSING_VALUE_ATTR);
    let fill = match missingval {
        MissingValue::None => return Ok((data.clone(), base)),
        MissingValue::Masked => attrs
            .get(FILL_VALUE_ATTR)
            .and_then(|v| v.to_scalar(dtype))
            .or_else(|| dtype.default_fill())
            .ok_or(GeoStackError::NoFillValue(dtype))?,
        MissingValue::Value(v) => v.cast(dtype).ok_or_else(|| {
            GeoStackError::InvalidConfig(format!(
                "missing value {} cannot be stored as {}",
                v, dtype
            ))
        })?,
    };
    Ok((data.fill_masked(&fill), base.with(FILL_VALUE_ATTR, fill)))
}
