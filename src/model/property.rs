use serde::{Deserialize, Serialize};

use crate::model::{CustomAttribute, SignatureMethod, Token};

/// A property declared in this module.
///
/// Accessors are plain method references, so either one may disappear independently of
/// the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// ECMA-335 `PropertyAttributes`
    pub flags: u16,
    /// Property signature, parameters are indexer arguments
    pub signature: SignatureMethod,
    /// Owning type
    pub declaring_type: Token,
    /// `get_` accessor
    pub getter: Option<Token>,
    /// `set_` accessor
    pub setter: Option<Token>,
    /// Custom attributes applied to the property
    pub custom_attributes: Vec<CustomAttribute>,
}

impl Property {
    /// Returns true once neither accessor is left
    #[must_use]
    pub fn has_no_accessors(&self) -> bool {
        self.getter.is_none() && self.setter.is_none()
    }
}
