//! Type definitions, type references and their resolution scopes.

use serde::{Deserialize, Serialize};

use crate::model::{CustomAttribute, Token, TypeSignature};

#[allow(non_snake_case)]
/// Flags describing a `TypeDef`, as defined by ECMA-335 II.23.1.15.
///
/// Only the visibility bits drive pruning; the rest are carried through unchanged.
pub mod TypeAttributes {
    /// Use this mask to retrieve visibility information. These 3 bits contain one of the following values:
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Class has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Class has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Class is nested with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Class is nested with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Class is nested with family visibility
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Class is nested with assembly visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Class is nested with family and assembly visibility
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Class is nested with family or assembly visibility
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Class is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class cannot be extended
    pub const SEALED: u32 = 0x0000_0100;
    /// Class name is special
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Initialize the class any time before first static field access
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
}

/// A generic parameter declared on a type or method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericParam {
    /// Parameter name, e.g. `T`
    pub name: String,
    /// Constraint types
    pub constraints: Vec<TypeSignature>,
}

/// A type declared in this module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Namespace, empty for nested types
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// `TypeAttributes`
    pub flags: u32,
    /// Base type, `None` for interfaces and `System.Object` itself
    pub extends: Option<TypeSignature>,
    /// Implemented interfaces
    pub interfaces: Vec<TypeSignature>,
    /// Methods, in declaration order
    pub methods: Vec<Token>,
    /// Fields, in declaration order
    pub fields: Vec<Token>,
    /// Properties, in declaration order
    pub properties: Vec<Token>,
    /// Nested types, in declaration order
    pub nested_types: Vec<Token>,
    /// Enclosing type of a nested type
    pub declaring_type: Option<Token>,
    /// Generic parameters
    pub generic_params: Vec<GenericParam>,
    /// Custom attributes applied to the type
    pub custom_attributes: Vec<CustomAttribute>,
}

impl TypeDef {
    /// Creates a type with no members
    #[must_use]
    pub fn new(namespace: &str, name: &str, flags: u32) -> Self {
        TypeDef {
            namespace: namespace.to_string(),
            name: name.to_string(),
            flags,
            extends: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            nested_types: Vec::new(),
            declaring_type: None,
            generic_params: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    /// The 3 visibility bits of [`TypeAttributes`]
    #[must_use]
    pub fn visibility(&self) -> u32 {
        self.flags & TypeAttributes::VISIBILITY_MASK
    }

    /// Returns true if this type is nested in another type
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.declaring_type.is_some()
    }

    /// Returns true if this type is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags & TypeAttributes::INTERFACE != 0
    }

    /// `Namespace.Name`, or just `Name` without a namespace
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

/// The scope an external type reference resolves in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionScope {
    /// The type lives in this module
    Module,
    /// The type lives in a referenced assembly
    AssemblyRef(Token),
    /// The type is nested in another referenced type
    TypeRef(Token),
}

/// A reference to a type by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Namespace, empty for nested references
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// Where the reference resolves
    pub scope: ResolutionScope,
}

impl TypeRef {
    /// Creates a reference to `namespace.name` in `scope`
    #[must_use]
    pub fn new(namespace: &str, name: &str, scope: ResolutionScope) -> Self {
        TypeRef {
            namespace: namespace.to_string(),
            name: name.to_string(),
            scope,
        }
    }

    /// `Namespace.Name`, or just `Name` without a namespace
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

pub(crate) fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}
