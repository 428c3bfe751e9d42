//! Combining the dimensions of several layers.

use geostack_common::{GeoStackError, GeoStackResult};

use crate::dimension::Dimension;
use crate::label::DimLabel;

/// Check that two dimensions with the same label can be shared.
///
/// Lengths must match. When both carry index values, the values and the
/// mode must match as well.
pub fn check_compatible(a: &Dimension, b: &Dimension) -> GeoStackResult<()> {
    if a.len() != b.len() {
        return Err(GeoStackError::merge_conflict(
            a.label().to_string(),
            format!("length {} vs {}", a.len(), b.len()),
        ));
    }
    if a.index().is_positional() || b.index().is_positional() {
        return Ok(());
    }
    if !a.index().approx_eq(b.index()) {
        return Err(GeoStackError::merge_conflict(
            a.label().to_string(),
            "index values differ",
        ));
    }
    if !a.mode().approx_eq(b.mode()) {
        return Err(GeoStackError::merge_conflict(
            a.label().to_string(),
            format!("mode {} vs {}", a.mode(), b.mode()),
        ));
    }
    Ok(())
}

/// Fail when two dimensions of one layer share a label, as `lat` and `y` do.
pub fn check_unique_labels(dims: &[Dimension]) -> GeoStackResult<()> {
    for (i, dim) in dims.iter().enumerate() {
        if dims[..i].iter().any(|d| d.label() == dim.label()) {
            return Err(GeoStackError::InvalidConfig(format!(
                "dimension label {} appears more than once in {:?}",
                dim.label(),
                layer_labels(dims)
            )));
        }
    }
    Ok(())
}

/// Union of the dimensions of all layers, in first-seen order.
///
/// Shared labels are verified with [`check_compatible`]. A positional
/// dimension is replaced by an indexed one of the same label.
pub fn combine_dims<'a, I>(layers: I) -> GeoStackResult<Vec<Dimension>>
where
    I: IntoIterator<Item = &'a [Dimension]>,
{
    let mut combined: Vec<Dimension> = Vec::new();
    for dims in layers {
        check_unique_labels(dims)?;
        for dim in dims {
            match combined.iter_mut().find(|d| d.label() == dim.label()) {
                Some(existing) => {
                    check_compatible(existing, dim)?;
                    if existing.index().is_positional() && !dim.index().is_positional() {
                        *existing = dim.clone();
                    }
                }
                None => combined.push(dim.clone()),
            }
        }
    }
    Ok(combined)
}

/// The ordered labels of a layer's dimensions.
pub fn layer_labels(dims: &[Dimension]) -> Vec<DimLabel> {
    dims.iter().map(|d| d.label().clone()).collect()
}
