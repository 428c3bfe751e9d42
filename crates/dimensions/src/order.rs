//! Axis ordering.

use serde::{Deserialize, Serialize};

/// Direction of the index values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexOrder {
    ForwardIndex,
    ReverseIndex,
}

/// Direction of the underlying array storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayOrder {
    ForwardArray,
    ReverseArray,
}

/// How index order relates to array order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    ForwardRelation,
    ReverseRelation,
}

/// Full traversal description of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub index: IndexOrder,
    pub array: ArrayOrder,
    pub relation: Relation,
}

impl Order {
    pub fn new(index: IndexOrder, array: ArrayOrder, relation: Relation) -> Self {
        Self {
            index,
            array,
            relation,
        }
    }

    /// Ascending index stored front to back.
    pub fn forward() -> Self {
        Self::new(
            IndexOrder::ForwardIndex,
            ArrayOrder::ForwardArray,
            Relation::ForwardRelation,
        )
    }

    /// Descending index stored back to front.
    pub fn reverse() -> Self {
        Self::new(
            IndexOrder::ReverseIndex,
            ArrayOrder::ReverseArray,
            Relation::ForwardRelation,
        )
    }

    pub fn is_reverse_index(&self) -> bool {
        self.index == IndexOrder::ReverseIndex
    }

    /// Whether storage order and index order agree once the relation is applied.
    pub fn is_consistent(&self) -> bool {
        let index_fwd = self.index == IndexOrder::ForwardIndex;
        let array_fwd = self.array == ArrayOrder::ForwardArray;
        let related = self.relation == Relation::ForwardRelation;
        (index_fwd == array_fwd) == related
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::forward()
    }
}
