//! Conversion between `Projected` and `Mapped` modes.

use geostack_common::{Crs, GeoStackError, GeoStackResult};
use ndarray::Array2;
use projection::{AxisKind, Reprojector};
use tracing::debug;

use crate::dimension::Dimension;
use crate::index::DimIndex;
use crate::inference::{infer_order, infer_span};
use crate::mode::{IndexMode, ModeClass, ProjectedMode, SampledMode};
use crate::span::Span;

/// Convert a dimension to the `target` projection class.
///
/// Dimensions without a projection mode, and dimensions already of the
/// target class, are returned unchanged. Switching class reprojects the
/// index from the stored crs to the other one, which needs `reprojector`.
/// When both crs are the same the mode is relabelled without reprojecting.
pub fn convert_mode(
    target: ModeClass,
    dim: &Dimension,
    reprojector: Option<&dyn Reprojector>,
) -> GeoStackResult<Dimension> {
    let (current, mode) = match dim.mode() {
        IndexMode::Projected(p) => (ModeClass::Projected, p),
        IndexMode::Mapped(p) => (ModeClass::Mapped, p),
        _ => return Ok(dim.clone()),
    };
    if current == target {
        return Ok(dim.clone());
    }

    let (source, dest) = match target {
        ModeClass::Mapped => (mode.crs(), mode.mappedcrs()),
        ModeClass::Projected => (mode.mappedcrs(), mode.crs()),
    };
    let (source, dest) = match (source, dest) {
        (Some(source), Some(dest)) => (source, dest),
        _ => {
            return Err(GeoStackError::ReprojectionFailed(format!(
                "dimension {} needs both crs and mappedcrs to convert {} to {}",
                dim.label(),
                current,
                target
            )))
        }
    };
    if source == dest {
        debug!(label = %dim.label(), %target, "crs and mappedcrs match, relabelling");
        return Ok(dim.with_mode(relabel(target, mode.clone())));
    }

    let reprojector = reprojector.ok_or_else(|| GeoStackError::ReprojectionUnavailable {
        from: current.to_string(),
        to: target.to_string(),
    })?;
    let axis = dim.label().axis_kind().ok_or_else(|| {
        GeoStackError::ReprojectionFailed(format!("{} is not a spatial dimension", dim.label()))
    })?;
    let values = dim.index().as_numeric().ok_or_else(|| {
        GeoStackError::ReprojectionFailed(format!(
            "dimension {} has no numeric index to reproject",
            dim.label()
        ))
    })?;

    debug!(label = %dim.label(), %source, %dest, %target, "Reprojecting dimension index");
    let projected = reprojector.reproject(source, dest, axis, values)?;
    let order = infer_order(&projected);
    let sampled = mode.sampled();
    let span = match &sampled.span {
        Span::Regular(_) => infer_span(&projected, &order),
        Span::Irregular(bounds) => match infer_span(&projected, &order) {
            regular @ Span::Regular(_) => regular,
            _ => Span::Irregular(
                bounds
                    .as_ref()
                    .map(|b| reproject_pair(reprojector, source, dest, axis, *b))
                    .transpose()?,
            ),
        },
        Span::Explicit(bounds) => {
            Span::Explicit(reproject_matrix(reprojector, source, dest, axis, bounds)?)
        }
    };

    let converted = mode.with_sampled(SampledMode::new(order, span, sampled.sampling));
    Ok(dim.with_index(DimIndex::Numeric(projected), relabel(target, converted)))
}

/// Convert every dimension of an array.
pub fn convert_dims(
    target: ModeClass,
    dims: &[Dimension],
    reprojector: Option<&dyn Reprojector>,
) -> GeoStackResult<Vec<Dimension>> {
    dims.iter()
        .map(|dim| convert_mode(target, dim, reprojector))
        .collect()
}

fn relabel(target: ModeClass, mode: ProjectedMode) -> IndexMode {
    match target {
        ModeClass::Projected => IndexMode::Projected(mode),
        ModeClass::Mapped => IndexMode::Mapped(mode),
    }
}

fn reproject_pair(
    reprojector: &dyn Reprojector,
    source: &Crs,
    dest: &Crs,
    axis: AxisKind,
    (lo, hi): (f64, f64),
) -> GeoStackResult<(f64, f64)> {
    let out = reprojector.reproject(source, dest, axis, &[lo, hi])?;
    Ok((out[0].min(out[1]), out[0].max(out[1])))
}

fn reproject_matrix(
    reprojector: &dyn Reprojector,
    source: &Crs,
    dest: &Crs,
    axis: AxisKind,
    bounds: &Array2<f64>,
) -> GeoStackResult<Array2<f64>> {
    let flat: Vec<f64> = bounds.iter().copied().collect();
    let out = reprojector.reproject(source, dest, axis, &flat)?;
    Array2::from_shape_vec(bounds.raw_dim(), out)
        .map_err(|e| GeoStackError::ReprojectionFailed(e.to_string()))
}
