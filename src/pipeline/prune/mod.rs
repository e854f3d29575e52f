//! The surface pruning passes, in the order the driver runs them.
//!
//! | # | Pass | State reached |
//! |---|------|---------------|
//! | 1 | [`TypePruner`] | `TypesPruned` |
//! | 2 | [`NestedTypePruner`] | `NestedTypesPruned` |
//! | 3 | [`InheritancePruner`] | `BasesPruned` |
//! | 4 | [`MemberPruner`] | `MembersPruned` |
//! | 5 | [`PropertyPruner`] | `PropertiesPruned` |
//! | 6 | [`AttributePruner`] | `AttributesPruned` |
//! | 7 | [`InitializerPruner`] | `InitializersPruned` |
//! | 8 | [`ResourcePruner`] | `ResourcesPruned` |
//! | 9 | [`CommonAttributePruner`] | `CommonAttributesPruned` |
//!
//! Later passes rely on earlier ones: member pruning assumes hidden types are already
//! gone, attribute pruning sees the final type set.

mod attributes;
mod data;
mod inheritance;
mod members;
mod types;

pub use attributes::{
    references_hidden_type, AttributePruner, CommonAttributePruner, COMMON_ASSEMBLY_ATTRIBUTES,
    COMMON_MODULE_ATTRIBUTES,
};
pub use data::{InitializerPruner, ResourcePruner};
pub use inheritance::InheritancePruner;
pub use members::{MemberPruner, PropertyPruner};
pub use types::{NestedTypePruner, TypePruner};
