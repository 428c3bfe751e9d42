//! Element types, scalars, coordinate arrays and n-dimensional raster buffers.

use std::fmt;
use std::ops::Range;

use chrono::NaiveDateTime;
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use num_traits::NumCast;
use serde::{Deserialize, Serialize};

use crate::error::{GeoStackError, GeoStackResult};

/// Element type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Text,
}

impl DataType {
    /// The NetCDF default fill value for this type.
    ///
    /// `Bool` and `Text` have none.
    pub fn default_fill(&self) -> Option<Scalar> {
        match self {
            DataType::I8 => Some(Scalar::I8(-127)),
            DataType::I16 => Some(Scalar::I16(-32767)),
            DataType::I32 => Some(Scalar::I32(-2147483647)),
            DataType::I64 => Some(Scalar::I64(-9223372036854775806)),
            DataType::U8 => Some(Scalar::U8(255)),
            DataType::U16 => Some(Scalar::U16(65535)),
            DataType::U32 => Some(Scalar::U32(4294967295)),
            DataType::U64 => Some(Scalar::U64(18446744073709551614)),
            DataType::F32 => Some(Scalar::F32(9.969_209_968_386_869e36_f32)),
            DataType::F64 => Some(Scalar::F64(9.969_209_968_386_869e36)),
            DataType::Bool | DataType::Text => None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::Bool => "bool",
            DataType::Text => "text",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single typed value, used for missing-value sentinels and fill values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
}

impl Scalar {
    pub fn dtype(&self) -> DataType {
        match self {
            Scalar::I8(_) => DataType::I8,
            Scalar::I16(_) => DataType::I16,
            Scalar::I32(_) => DataType::I32,
            Scalar::I64(_) => DataType::I64,
            Scalar::U8(_) => DataType::U8,
            Scalar::U16(_) => DataType::U16,
            Scalar::U32(_) => DataType::U32,
            Scalar::U64(_) => DataType::U64,
            Scalar::F32(_) => DataType::F32,
            Scalar::F64(_) => DataType::F64,
            Scalar::Bool(_) => DataType::Bool,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::I8(v) => v as f64,
            Scalar::I16(v) => v as f64,
            Scalar::I32(v) => v as f64,
            Scalar::I64(v) => v as f64,
            Scalar::U8(v) => v as f64,
            Scalar::U16(v) => v as f64,
            Scalar::U32(v) => v as f64,
            Scalar::U64(v) => v as f64,
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
            Scalar::Bool(v) => v as u8 as f64,
        }
    }

    /// The exact integer value for integer scalars.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::I8(v) => Some(v as i64),
            Scalar::I16(v) => Some(v as i64),
            Scalar::I32(v) => Some(v as i64),
            Scalar::I64(v) => Some(v),
            Scalar::U8(v) => Some(v as i64),
            Scalar::U16(v) => Some(v as i64),
            Scalar::U32(v) => Some(v as i64),
            Scalar::U64(v) => i64::try_from(v).ok(),
            Scalar::F32(_) | Scalar::F64(_) | Scalar::Bool(_) => None,
        }
    }

    /// Convert a float into a scalar of `dtype`, if representable.
    pub fn from_f64(v: f64, dtype: DataType) -> Option<Scalar> {
        match dtype {
            DataType::F32 => Some(Scalar::F32(v as f32)),
            DataType::F64 => Some(Scalar::F64(v)),
            DataType::I8 => <i8 as NumCast>::from(v).map(Scalar::I8),
            DataType::I16 => <i16 as NumCast>::from(v).map(Scalar::I16),
            DataType::I32 => <i32 as NumCast>::from(v).map(Scalar::I32),
            DataType::I64 => <i64 as NumCast>::from(v).map(Scalar::I64),
            DataType::U8 => <u8 as NumCast>::from(v).map(Scalar::U8),
            DataType::U16 => <u16 as NumCast>::from(v).map(Scalar::U16),
            DataType::U32 => <u32 as NumCast>::from(v).map(Scalar::U32),
            DataType::U64 => <u64 as NumCast>::from(v).map(Scalar::U64),
            DataType::Bool => {
                if v == 0.0 {
                    Some(Scalar::Bool(false))
                } else if v == 1.0 {
                    Some(Scalar::Bool(true))
                } else {
                    None
                }
            }
            DataType::Text => None,
        }
    }

    /// Convert an integer into a scalar of `dtype`, if representable.
    pub fn from_i64(v: i64, dtype: DataType) -> Option<Scalar> {
        match dtype {
            DataType::I8 => <i8 as NumCast>::from(v).map(Scalar::I8),
            DataType::I16 => <i16 as NumCast>::from(v).map(Scalar::I16),
            DataType::I32 => <i32 as NumCast>::from(v).map(Scalar::I32),
            DataType::I64 => Some(Scalar::I64(v)),
            DataType::U8 => <u8 as NumCast>::from(v).map(Scalar::U8),
            DataType::U16 => <u16 as NumCast>::from(v).map(Scalar::U16),
            DataType::U32 => <u32 as NumCast>::from(v).map(Scalar::U32),
            DataType::U64 => <u64 as NumCast>::from(v).map(Scalar::U64),
            other => Scalar::from_f64(v as f64, other),
        }
    }

    /// Cast to another element type, if the value is representable there.
    pub fn cast(&self, dtype: DataType) -> Option<Scalar> {
        if self.dtype() == dtype {
            return Some(*self);
        }
        match self.as_i64() {
            Some(v) => Scalar::from_i64(v, dtype),
            None => Scalar::from_f64(self.as_f64(), dtype),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            other => match other.as_i64() {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "{}", other.as_f64()),
            },
        }
    }
}

/// Raw values of a coordinate variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Coordinates {
    Numeric(Vec<f64>),
    Time(Vec<NaiveDateTime>),
    Text(Vec<String>),
}

impl Coordinates {
    pub fn len(&self) -> usize {
        match self {
            Coordinates::Numeric(v) => v.len(),
            Coordinates::Time(v) => v.len(),
            Coordinates::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type used when this coordinate is written to disk.
    pub fn dtype(&self) -> DataType {
        match self {
            Coordinates::Numeric(_) | Coordinates::Time(_) => DataType::F64,
            Coordinates::Text(_) => DataType::Text,
        }
    }
}

/// Conversion of raster elements to `f64` for inspection.
trait Element: Copy {
    fn to_f64(self) -> f64;

    fn is_nan(self) -> bool {
        false
    }
}

macro_rules! impl_int_element {
    ($($t:ty),*) => {
        $(impl Element for $t {
            fn to_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_int_element!(i8, i16, i32, i64, u8, u16, u32, u64);

impl Element for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
}

impl Element for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
}

impl Element for bool {
    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

/// An in-memory n-dimensional raster buffer.
///
/// Axis order follows the variable's dimension order on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RasterData {
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    Bool(ArrayD<bool>),
}

macro_rules! dispatch {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            RasterData::I8($arr) => $body,
            RasterData::I16($arr) => $body,
            RasterData::I32($arr) => $body,
            RasterData::I64($arr) => $body,
            RasterData::U8($arr) => $body,
            RasterData::U16($arr) => $body,
            RasterData::U32($arr) => $body,
            RasterData::U64($arr) => $body,
            RasterData::F32($arr) => $body,
            RasterData::F64($arr) => $body,
            RasterData::Bool($arr) => $body,
        }
    };
}

macro_rules! map_data {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            RasterData::I8($arr) => RasterData::I8($body),
            RasterData::I16($arr) => RasterData::I16($body),
            RasterData::I32($arr) => RasterData::I32($body),
            RasterData::I64($arr) => RasterData::I64($body),
            RasterData::U8($arr) => RasterData::U8($body),
            RasterData::U16($arr) => RasterData::U16($body),
            RasterData::U32($arr) => RasterData::U32($body),
            RasterData::U64($arr) => RasterData::U64($body),
            RasterData::F32($arr) => RasterData::F32($body),
            RasterData::F64($arr) => RasterData::F64($body),
            RasterData::Bool($arr) => RasterData::Bool($body),
        }
    };
}

macro_rules! impl_from_array {
    ($($t:ty => $variant:ident),*) => {
        $(impl From<ArrayD<$t>> for RasterData {
            fn from(array: ArrayD<$t>) -> Self {
                RasterData::$variant(array)
            }
        })*
    };
}

impl_from_array!(
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    f32 => F32, f64 => F64, bool => Bool
);

impl RasterData {
    /// Build a buffer from a shape and row-major values.
    pub fn from_shape_vec<T>(shape: &[usize], values: Vec<T>) -> GeoStackResult<Self>
    where
        ArrayD<T>: Into<RasterData>,
    {
        ArrayD::from_shape_vec(IxDyn(shape), values)
            .map(Into::into)
            .map_err(|e| GeoStackError::shape_mismatch(e.to_string()))
    }

    pub fn dtype(&self) -> DataType {
        match self {
            RasterData::I8(_) => DataType::I8,
            RasterData::I16(_) => DataType::I16,
            RasterData::I32(_) => DataType::I32,
            RasterData::I64(_) => DataType::I64,
            RasterData::U8(_) => DataType::U8,
            RasterData::U16(_) => DataType::U16,
            RasterData::U32(_) => DataType::U32,
            RasterData::U64(_) => DataType::U64,
            RasterData::F32(_) => DataType::F32,
            RasterData::F64(_) => DataType::F64,
            RasterData::Bool(_) => DataType::Bool,
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        dispatch!(self, a => a.shape().to_vec())
    }

    pub fn ndim(&self) -> usize {
        dispatch!(self, a => a.ndim())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index` converted to `f64`.
    pub fn get_f64(&self, index: &[usize]) -> Option<f64> {
        dispatch!(self, a => a.get(IxDyn(index)).map(|v| Element::to_f64(*v)))
    }

    /// All values converted to `f64`.
    pub fn to_f64_array(&self) -> ArrayD<f64> {
        dispatch!(self, a => a.mapv(Element::to_f64))
    }

    /// Number of NaN cells (always zero for non-float types).
    pub fn count_nan(&self) -> usize {
        dispatch!(self, a => a.iter().filter(|v| Element::is_nan(**v)).count())
    }

    /// Copy out a rectangular window, one range per axis.
    pub fn window(&self, ranges: &[Range<usize>]) -> GeoStackResult<RasterData> {
        let shape = self.shape();
        if ranges.len() != shape.len() {
            return Err(GeoStackError::shape_mismatch(format!(
                "window has {} ranges for {} axes",
                ranges.len(),
                shape.len()
            )));
        }
        for (axis, (range, &len)) in ranges.iter().zip(&shape).enumerate() {
            if range.start > range.end || range.end > len {
                return Err(GeoStackError::shape_mismatch(format!(
                    "range {:?} out of bounds for axis {} of length {}",
                    range, axis, len
                )));
            }
        }
        Ok(map_data!(self, a => a
            .slice_each_axis(|desc| Slice::from(ranges[desc.axis.index()].clone()))
            .to_owned()))
    }

    /// Drop `axis`, keeping its first element.
    pub fn remove_axis(&self, axis: usize) -> GeoStackResult<RasterData> {
        let shape = self.shape();
        match shape.get(axis) {
            Some(&len) if len > 0 => Ok(map_data!(self, a => a.index_axis(Axis(axis), 0).to_owned())),
            _ => Err(GeoStackError::shape_mismatch(format!(
                "cannot remove axis {} from shape {:?}",
                axis, shape
            ))),
        }
    }

    /// Replace NaN cells of float buffers with `fill`. Other types are unchanged.
    pub fn fill_masked(&self, fill: &Scalar) -> RasterData {
        match self {
            RasterData::F32(a) => {
                let fill = fill.as_f64() as f32;
                RasterData::F32(a.mapv(|v| if v.is_nan() { fill } else { v }))
            }
            RasterData::F64(a) => {
                let fill = fill.as_f64();
                RasterData::F64(a.mapv(|v| if v.is_nan() { fill } else { v }))
            }
            other => other.clone(),
        }
    }
}
