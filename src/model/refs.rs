//! References to entities outside this module's definition tables.

use serde::{Deserialize, Serialize};

use crate::model::{SignatureMethod, TypeSignature};

/// Signature of a referenced member
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberRefSignature {
    /// A method or constructor
    Method(SignatureMethod),
    /// A field
    Field(TypeSignature),
}

/// A reference to a member of an external type or of a generic instantiation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    /// Type the member belongs to
    pub parent: TypeSignature,
    /// Member name
    pub name: String,
    /// Member signature
    pub signature: MemberRefSignature,
}

impl MemberRef {
    /// Returns true if this references an instance or type constructor
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        matches!(self.signature, MemberRefSignature::Method(_))
            && (self.name == ".ctor" || self.name == ".cctor")
    }

    /// The method signature, if this references a method
    #[must_use]
    pub fn method_signature(&self) -> Option<&SignatureMethod> {
        match &self.signature {
            MemberRefSignature::Method(sig) => Some(sig),
            MemberRefSignature::Field(_) => None,
        }
    }
}

/// A referenced assembly
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssemblyRef {
    /// Simple name, e.g. `System.Runtime`
    pub name: String,
    /// Major, minor, build, revision
    pub version: [u16; 4],
    /// Public key token, empty when unsigned
    pub public_key_token: Vec<u8>,
}

/// A manifest resource embedded in the module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource name
    pub name: String,
    /// Visible to other assemblies
    pub public: bool,
    /// Resource bytes
    pub data: Vec<u8>,
}
