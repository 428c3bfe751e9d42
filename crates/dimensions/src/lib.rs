//! Labelled, georeferenced dimensions.
//!
//! A [`Dimension`] binds a semantic [`DimLabel`] to its index values and an
//! [`IndexMode`] describing how those values are laid out:
//!
//! ```text
//! coordinate values ──► infer_mode ──► IndexMode ──► Dimension
//!                           │
//!            order / span / sampling / crs
//! ```
//!
//! Modes are inferred from raw coordinate data ([`inference`]), converted
//! between projected and mapped coordinates ([`convert`]), and dimensions of
//! several layers are combined with [`merge::combine_dims`].

pub mod convert;
pub mod dimension;
pub mod index;
pub mod inference;
pub mod label;
pub mod locus;
pub mod merge;
pub mod mode;
pub mod order;
pub mod sampling;
pub mod span;

pub use convert::{convert_dims, convert_mode};
pub use dimension::Dimension;
pub use index::DimIndex;
pub use inference::{infer_mode, infer_order, infer_span, CrsHints};
pub use label::DimLabel;
pub use locus::shift_to_center;
pub use merge::{check_unique_labels, combine_dims, layer_labels};
pub use mode::{IndexMode, ModeClass, ProjectedMode, SampledMode};
pub use order::{ArrayOrder, IndexOrder, Order, Relation};
pub use sampling::{Locus, Sampling};
pub use span::{Span, Step};
