//! Method definitions and their attribute flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::model::{CustomAttribute, GenericParam, MethodBody, SignatureMethod, Token};

/// Mask to extract the member access bits shared by methods and fields
pub const METHOD_ACCESS_MASK: u32 = 0x0007;

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// Method access flags, one of these values after masking with [`METHOD_ACCESS_MASK`]
    pub struct MethodAccessFlags: u32 {
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
    }
}

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// Method modifiers and properties
    pub struct MethodModifiers: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method can only be overriden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RTSPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
    }
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// ECMA-335 `ParamAttributes`
    pub flags: u16,
    /// Custom attributes applied to the parameter
    pub custom_attributes: Vec<CustomAttribute>,
}

/// A method declared in this module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    /// Method name, `.ctor` and `.cctor` for constructors
    pub name: String,
    /// Access bits plus [`MethodModifiers`]
    pub flags: u32,
    /// ECMA-335 `MethodImplAttributes`
    pub impl_flags: u32,
    /// Signature
    pub signature: SignatureMethod,
    /// Parameter metadata, parallel to `signature.params`
    pub params: Vec<Param>,
    /// Owning type
    pub declaring_type: Token,
    /// Body, present iff the method is neither abstract nor external
    pub body: Option<MethodBody>,
    /// Interface or base methods this method explicitly overrides
    pub overrides: Vec<Token>,
    /// Generic parameters
    pub generic_params: Vec<GenericParam>,
    /// Custom attributes applied to the method
    pub custom_attributes: Vec<CustomAttribute>,
}

impl MethodDef {
    /// Access bits of this method
    #[must_use]
    pub fn access(&self) -> MethodAccessFlags {
        MethodAccessFlags::from_bits_truncate(self.flags & METHOD_ACCESS_MASK)
    }

    /// Modifier bits of this method
    #[must_use]
    pub fn modifiers(&self) -> MethodModifiers {
        MethodModifiers::from_bits_truncate(self.flags)
    }

    /// Returns true for instance and type constructors
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }

    /// Returns true if the method is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers().contains(MethodModifiers::STATIC)
    }

    /// Returns true if the method is abstract
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers().contains(MethodModifiers::ABSTRACT)
    }

    /// Returns true for an instance constructor
    #[must_use]
    pub fn is_instance_constructor(&self) -> bool {
        self.name == ".ctor" && !self.is_static()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeSignature;

    fn method(name: &str, flags: u32) -> MethodDef {
        MethodDef {
            name: name.to_string(),
            flags,
            impl_flags: 0,
            signature: SignatureMethod::instance(TypeSignature::Void, vec![]),
            params: vec![],
            declaring_type: Token(0x02000001),
            body: None,
            overrides: vec![],
            generic_params: vec![],
            custom_attributes: vec![],
        }
    }

    #[test]
    fn access_is_masked() {
        let m = method(
            "Run",
            MethodAccessFlags::FAMILY.bits() | MethodModifiers::VIRTUAL.bits(),
        );
        assert_eq!(m.access(), MethodAccessFlags::FAMILY);
        assert!(m.modifiers().contains(MethodModifiers::VIRTUAL));
    }

    #[test]
    fn constructor_detection() {
        let ctor = method(".ctor", MethodAccessFlags::PUBLIC.bits());
        let cctor = method(
            ".cctor",
            MethodAccessFlags::PRIVATE.bits() | MethodModifiers::STATIC.bits(),
        );
        assert!(ctor.is_constructor());
        assert!(ctor.is_instance_constructor());
        assert!(cctor.is_constructor());
        assert!(!cctor.is_instance_constructor());
        assert!(!method("Run", 0).is_constructor());
    }
}
