//! The module arena: every table, the top-level type order and module-wide metadata.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::model::{
    AssemblyRef, CustomAttribute, Field, MemberRef, MethodDef, Property, ResolutionScope,
    Resource, TableId, Table, Token, TypeDef, TypeRef, TypeSignature,
};

/// Assembly names that identify the core library when looking for `System.*` types
pub const CORLIB_NAMES: [&str; 4] = [
    "System.Runtime",
    "mscorlib",
    "netstandard",
    "System.Private.CoreLib",
];

/// What kind of binary the module is emitted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ModuleKind {
    /// Class library
    Dll,
    /// Console executable
    Console,
    /// GUI executable
    Windows,
}

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// Runtime flags of the CLI header
    pub struct ModuleFlags: u32 {
        /// Image contains only IL code
        const IL_ONLY = 0x0000_0001;
        /// Image can only be loaded into a 32-bit process
        const REQUIRED_32BIT = 0x0000_0002;
        /// Image has a strong name signature
        const STRONG_NAME_SIGNED = 0x0000_0008;
        /// Entry point is native code
        const NATIVE_ENTRYPOINT = 0x0000_0010;
        /// Runtime should track debug data
        const TRACK_DEBUG_DATA = 0x0001_0000;
        /// Image prefers a 32-bit process
        const PREFERRED_32BIT = 0x0002_0000;
    }
}

/// Name and version of the assembly the module belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyIdentity {
    /// Simple name
    pub name: String,
    /// Major, minor, build, revision
    pub version: [u16; 4],
}

/// What is left of a removed entity, so diagnostics can still name it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tombstone {
    /// Qualified name at the time of removal
    pub name: String,
    /// Owning type of a removed member or nested type
    pub declaring_type: Option<Token>,
}

/// In-memory arena graph of one module.
///
/// Entities are addressed by [`Token`]s; ownership edges (type to member, type to nested
/// type) are token lists on the owner, cross references are tokens inside signatures,
/// bodies and attributes. Removal tombstones the row, detaches it from its owner and
/// records a [`Tombstone`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module file name, e.g. `Acme.dll`
    pub name: String,
    /// Assembly identity
    pub assembly: AssemblyIdentity,
    /// Library or executable
    pub kind: ModuleKind,
    /// Raw [`ModuleFlags`]
    pub flags: u32,
    /// Module version id
    pub mvid: [u8; 16],
    /// Entry point method of an executable
    pub entry_point: Option<Token>,
    /// Top-level types in declaration order
    pub types: Vec<Token>,
    /// Type definitions, top-level and nested
    pub type_defs: Table<TypeDef>,
    /// Type references
    pub type_refs: Table<TypeRef>,
    /// Method definitions
    pub methods: Table<MethodDef>,
    /// Field definitions
    pub fields: Table<Field>,
    /// Property definitions
    pub properties: Table<Property>,
    /// Member references
    pub member_refs: Table<MemberRef>,
    /// Assembly references
    pub assembly_refs: Table<AssemblyRef>,
    /// Attributes applied to the assembly
    pub assembly_attributes: Vec<CustomAttribute>,
    /// Attributes applied to the module
    pub module_attributes: Vec<CustomAttribute>,
    /// Embedded manifest resources
    pub resources: Vec<Resource>,
    #[serde(skip)]
    graveyard: BTreeMap<Token, Tombstone>,
}

impl Module {
    /// Creates an empty module
    #[must_use]
    pub fn new(name: &str, assembly: &str, kind: ModuleKind) -> Self {
        Module {
            name: name.to_string(),
            assembly: AssemblyIdentity {
                name: assembly.to_string(),
                version: [1, 0, 0, 0],
            },
            kind,
            flags: ModuleFlags::IL_ONLY.bits(),
            mvid: [0; 16],
            entry_point: None,
            types: Vec::new(),
            type_defs: Table::new(TableId::TypeDef),
            type_refs: Table::new(TableId::TypeRef),
            methods: Table::new(TableId::MethodDef),
            fields: Table::new(TableId::Field),
            properties: Table::new(TableId::Property),
            member_refs: Table::new(TableId::MemberRef),
            assembly_refs: Table::new(TableId::AssemblyRef),
            assembly_attributes: Vec::new(),
            module_attributes: Vec::new(),
            resources: Vec::new(),
            graveyard: BTreeMap::new(),
        }
    }

    /// Runtime flags
    #[must_use]
    pub fn module_flags(&self) -> ModuleFlags {
        ModuleFlags::from_bits_retain(self.flags)
    }

    /// Module version id as a GUID
    #[must_use]
    pub fn mvid(&self) -> uguid::Guid {
        uguid::Guid::from_bytes(self.mvid)
    }

    /// Tombstones of every entity removed so far, keyed by token
    #[must_use]
    pub fn graveyard(&self) -> &BTreeMap<Token, Tombstone> {
        &self.graveyard
    }

    /// Returns true if `token` addresses a live entity of any table
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        match token.table_id() {
            Some(TableId::TypeDef) => self.type_defs.contains(token),
            Some(TableId::TypeRef) => self.type_refs.contains(token),
            Some(TableId::MethodDef) => self.methods.contains(token),
            Some(TableId::Field) => self.fields.contains(token),
            Some(TableId::Property) => self.properties.contains(token),
            Some(TableId::MemberRef) => self.member_refs.contains(token),
            Some(TableId::AssemblyRef) => self.assembly_refs.contains(token),
            None => false,
        }
    }

    /// Every live type, depth first in declaration order: each type is followed by its
    /// nested types
    #[must_use]
    pub fn all_types(&self) -> Vec<Token> {
        let mut result = Vec::new();
        let mut stack: Vec<Token> = self.types.iter().rev().copied().collect();
        while let Some(token) = stack.pop() {
            if let Some(def) = self.type_defs.get(token) {
                result.push(token);
                stack.extend(def.nested_types.iter().rev().copied());
            }
        }
        result
    }

    /// The chain of types enclosing `token`, starting with `token` itself
    #[must_use]
    pub fn declaring_chain(&self, token: Token) -> Vec<Token> {
        let mut chain = Vec::new();
        let mut current = Some(token);
        while let Some(token) = current {
            if chain.contains(&token) {
                break;
            }
            chain.push(token);
            current = self
                .type_defs
                .get(token)
                .and_then(|def| def.declaring_type);
        }
        chain
    }

    /// Full name of a type definition or reference, nested types as `Outer/Inner`.
    ///
    /// Removed types are named from their tombstone.
    #[must_use]
    pub fn type_name(&self, token: Token) -> String {
        if let Some(def) = self.type_defs.get(token) {
            return match def.declaring_type {
                Some(parent) => format!("{}/{}", self.type_name(parent), def.name),
                None => def.qualified_name(),
            };
        }
        if let Some(reference) = self.type_refs.get(token) {
            return match reference.scope {
                ResolutionScope::TypeRef(parent) if parent != token => {
                    format!("{}/{}", self.type_name(parent), reference.name)
                }
                _ => reference.qualified_name(),
            };
        }
        match self.graveyard.get(&token) {
            Some(tombstone) => tombstone.name.clone(),
            None => format!("<unknown {token}>"),
        }
    }

    /// Display name of a signature, for diagnostics and outlines
    #[must_use]
    pub fn signature_name(&self, sig: &TypeSignature) -> String {
        match sig {
            TypeSignature::Void => "void".into(),
            TypeSignature::Boolean => "bool".into(),
            TypeSignature::Char => "char".into(),
            TypeSignature::I1 => "sbyte".into(),
            TypeSignature::U1 => "byte".into(),
            TypeSignature::I2 => "short".into(),
            TypeSignature::U2 => "ushort".into(),
            TypeSignature::I4 => "int".into(),
            TypeSignature::U4 => "uint".into(),
            TypeSignature::I8 => "long".into(),
            TypeSignature::U8 => "ulong".into(),
            TypeSignature::R4 => "float".into(),
            TypeSignature::R8 => "double".into(),
            TypeSignature::I => "nint".into(),
            TypeSignature::U => "nuint".into(),
            TypeSignature::String => "string".into(),
            TypeSignature::Object => "object".into(),
            TypeSignature::TypedByRef => "TypedReference".into(),
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                self.type_name(*token)
            }
            TypeSignature::SzArray(inner) => format!("{}[]", self.signature_name(inner)),
            TypeSignature::Array { element, rank } => format!(
                "{}[{}]",
                self.signature_name(element),
                ",".repeat(rank.saturating_sub(1) as usize)
            ),
            TypeSignature::Ptr(inner) => format!("{}*", self.signature_name(inner)),
            TypeSignature::ByRef(inner) => format!("ref {}", self.signature_name(inner)),
            TypeSignature::GenericInst(generic, args) => {
                let args: Vec<String> = args.iter().map(|a| self.signature_name(a)).collect();
                format!("{}<{}>", self.signature_name(generic), args.join(", "))
            }
            TypeSignature::GenericParamType(index) => format!("!{index}"),
            TypeSignature::GenericParamMethod(index) => format!("!!{index}"),
            TypeSignature::FnPtr(_) => "delegate*".into(),
        }
    }

    /// `Type::Member` for members, the type name for types
    #[must_use]
    pub fn entity_name(&self, token: Token) -> String {
        let member = |owner: Token, name: &str| format!("{}::{}", self.type_name(owner), name);
        if let Some(method) = self.methods.get(token) {
            return member(method.declaring_type, &method.name);
        }
        if let Some(field) = self.fields.get(token) {
            return member(field.declaring_type, &field.name);
        }
        if let Some(property) = self.properties.get(token) {
            return member(property.declaring_type, &property.name);
        }
        if let Some(reference) = self.member_refs.get(token) {
            return format!(
                "{}::{}",
                self.signature_name(&reference.parent),
                reference.name
            );
        }
        if let Some(assembly) = self.assembly_refs.get(token) {
            return format!("[{}]", assembly.name);
        }
        self.type_name(token)
    }

    /// The type owning a method, field, property or member reference; tombstoned members
    /// still report the type that owned them
    #[must_use]
    pub fn member_declaring_type(&self, token: Token) -> Option<Token> {
        if let Some(method) = self.methods.get(token) {
            return Some(method.declaring_type);
        }
        if let Some(field) = self.fields.get(token) {
            return Some(field.declaring_type);
        }
        if let Some(property) = self.properties.get(token) {
            return Some(property.declaring_type);
        }
        if let Some(reference) = self.member_refs.get(token) {
            return reference.parent.head_token();
        }
        self.graveyard
            .get(&token)
            .and_then(|tombstone| tombstone.declaring_type)
    }

    /// The attribute type, i.e. the declaring type of the attribute constructor
    #[must_use]
    pub fn attribute_type(&self, attribute: &CustomAttribute) -> Option<Token> {
        self.member_declaring_type(attribute.constructor)
    }

    /// Full name of the attribute type
    #[must_use]
    pub fn attribute_type_name(&self, attribute: &CustomAttribute) -> String {
        match self.attribute_type(attribute) {
            Some(token) => self.type_name(token),
            None => format!("<unknown {}>", attribute.constructor),
        }
    }

    /// Looks up a live type definition by its full name (`Namespace.Name`, nested types
    /// as `Outer/Inner`)
    #[must_use]
    pub fn find_type(&self, full_name: &str) -> Option<Token> {
        self.all_types()
            .into_iter()
            .find(|token| self.type_name(*token) == full_name)
    }

    /// Every live type definition keyed by the name [`Module::find_type`] matches on.
    ///
    /// When two definitions share a name the first in declaration order wins.
    #[must_use]
    pub fn type_index(&self) -> BTreeMap<String, Token> {
        let mut index = BTreeMap::new();
        for token in self.all_types() {
            index.entry(self.type_name(token)).or_insert(token);
        }
        index
    }

    /// Resolves a type token to a live definition of this module.
    ///
    /// A `TypeDef` resolves to itself if it is live. A `TypeRef` whose scope is this module
    /// resolves by name. References into other assemblies yield `None`.
    #[must_use]
    pub fn resolve_type(&self, token: Token) -> Option<Token> {
        self.resolve_type_by(token, |name| self.find_type(name))
    }

    /// Same as [`Module::resolve_type`], looking names up in an index from
    /// [`Module::type_index`]
    #[must_use]
    pub fn resolve_type_in(&self, index: &BTreeMap<String, Token>, token: Token) -> Option<Token> {
        self.resolve_type_by(token, |name| index.get(name).copied())
    }

    fn resolve_type_by(
        &self,
        token: Token,
        lookup: impl Fn(&str) -> Option<Token>,
    ) -> Option<Token> {
        if self.type_defs.contains(token) {
            return Some(token);
        }
        let reference = self.type_refs.get(token)?;
        match reference.scope {
            ResolutionScope::Module => lookup(&reference.qualified_name()),
            ResolutionScope::TypeRef(_) if self.type_ref_targets_module(token) => {
                lookup(&self.type_name(token))
            }
            _ => None,
        }
    }

    /// Returns true if `token` names a type declared in this module, live or removed.
    ///
    /// A `TypeDef` token always does. A `TypeRef` does when its outermost scope is this
    /// module.
    #[must_use]
    pub fn targets_module(&self, token: Token) -> bool {
        if token.is_table(TableId::TypeDef) {
            return true;
        }
        token.is_table(TableId::TypeRef) && self.type_ref_targets_module(token)
    }

    fn type_ref_targets_module(&self, token: Token) -> bool {
        let mut current = token;
        for _ in 0..64 {
            match self.type_refs.get(current).map(|reference| reference.scope) {
                Some(ResolutionScope::Module) => return true,
                Some(ResolutionScope::TypeRef(parent)) => current = parent,
                _ => return false,
            }
        }
        false
    }

    /// Removes a type together with everything it owns: nested types, methods, fields and
    /// properties. Returns every removed token.
    pub fn remove_type(&mut self, token: Token) -> Vec<Token> {
        let mut removed = Vec::new();
        self.remove_type_into(token, &mut removed);
        if self
            .entry_point
            .is_some_and(|entry| removed.contains(&entry))
        {
            self.entry_point = None;
        }
        removed
    }

    fn remove_type_into(&mut self, token: Token, removed: &mut Vec<Token>) {
        let name = self.type_name(token);
        let Some(def) = self.type_defs.remove(token) else {
            return;
        };
        match def.declaring_type {
            Some(parent) => {
                if let Some(parent_def) = self.type_defs.get_mut(parent) {
                    parent_def.nested_types.retain(|nested| *nested != token);
                }
            }
            None => self.types.retain(|top| *top != token),
        }
        self.bury(token, name, def.declaring_type);
        removed.push(token);

        for nested in def.nested_types {
            self.remove_type_into(nested, removed);
        }
        for method in def.methods {
            self.remove_member_row(method, removed);
        }
        for field in def.fields {
            self.remove_member_row(field, removed);
        }
        for property in def.properties {
            self.remove_member_row(property, removed);
        }
    }

    fn remove_member_row(&mut self, token: Token, removed: &mut Vec<Token>) {
        let name = self.entity_name(token);
        let owner = self.member_declaring_type(token);
        let gone = match token.table_id() {
            Some(TableId::MethodDef) => self.methods.remove(token).is_some(),
            Some(TableId::Field) => self.fields.remove(token).is_some(),
            Some(TableId::Property) => self.properties.remove(token).is_some(),
            _ => false,
        };
        if gone {
            self.bury(token, name, owner);
            removed.push(token);
        }
    }

    /// Removes a method, field or property and detaches it from its declaring type.
    ///
    /// Returns false if `token` did not address a live member.
    pub fn remove_member(&mut self, token: Token) -> bool {
        let Some(owner) = self.member_declaring_type(token) else {
            return false;
        };
        let mut removed = Vec::new();
        self.remove_member_row(token, &mut removed);
        if removed.is_empty() {
            return false;
        }
        if let Some(def) = self.type_defs.get_mut(owner) {
            def.methods.retain(|t| *t != token);
            def.fields.retain(|t| *t != token);
            def.properties.retain(|t| *t != token);
        }
        if self.entry_point == Some(token) {
            self.entry_point = None;
        }
        true
    }

    fn bury(&mut self, token: Token, name: String, declaring_type: Option<Token>) {
        self.graveyard.insert(
            token,
            Tombstone {
                name,
                declaring_type,
            },
        );
    }

    /// Tombstones a type or member reference row that is no longer used
    pub(crate) fn drop_reference(&mut self, token: Token) -> bool {
        let name = self.entity_name(token);
        let gone = match token.table_id() {
            Some(TableId::TypeRef) => self.type_refs.remove(token).is_some(),
            Some(TableId::MemberRef) => self.member_refs.remove(token).is_some(),
            _ => false,
        };
        if gone {
            self.bury(token, name, None);
        }
        gone
    }

    /// The resolution scope used for core library types.
    ///
    /// Prefers an existing reference to one of [`CORLIB_NAMES`] and adds a `mscorlib`
    /// reference otherwise.
    pub fn corlib_scope(&mut self) -> ResolutionScope {
        let existing = CORLIB_NAMES.iter().find_map(|corlib| {
            self.assembly_refs
                .iter()
                .find(|(_, reference)| reference.name == *corlib)
                .map(|(token, _)| token)
        });
        let token = match existing {
            Some(token) => token,
            None => self.assembly_refs.insert(AssemblyRef {
                name: "mscorlib".into(),
                version: [4, 0, 0, 0],
                public_key_token: vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89],
            }),
        };
        ResolutionScope::AssemblyRef(token)
    }

    /// Finds or adds a reference to a core library type
    pub fn import_corlib_type(&mut self, namespace: &str, name: &str) -> Token {
        let existing = self.type_refs.iter().find(|(_, reference)| {
            reference.namespace == namespace
                && reference.name == name
                && match reference.scope {
                    ResolutionScope::AssemblyRef(assembly) => self
                        .assembly_refs
                        .get(assembly)
                        .is_some_and(|a| CORLIB_NAMES.contains(&a.name.as_str())),
                    _ => false,
                }
        });
        if let Some((token, _)) = existing {
            return token;
        }
        let scope = self.corlib_scope();
        self.import_type_ref(TypeRef::new(namespace, name, scope))
    }

    /// Finds or adds a type reference
    pub fn import_type_ref(&mut self, reference: TypeRef) -> Token {
        let found = self
            .type_refs
            .iter()
            .find(|(_, existing)| **existing == reference)
            .map(|(token, _)| token);
        match found {
            Some(token) => token,
            None => self.type_refs.insert(reference),
        }
    }

    /// Finds or adds a member reference
    pub fn import_member_ref(&mut self, reference: MemberRef) -> Token {
        let found = self
            .member_refs
            .iter()
            .find(|(_, existing)| **existing == reference)
            .map(|(token, _)| token);
        match found {
            Some(token) => token,
            None => self.member_refs.insert(reference),
        }
    }

    /// Returns true if `token` is a live type whose base is `System.Enum`
    #[must_use]
    pub fn is_enum(&self, token: Token) -> bool {
        let Some(def) = self.type_defs.get(token) else {
            return false;
        };
        def.extends
            .as_ref()
            .and_then(TypeSignature::head_token)
            .is_some_and(|base| self.type_name(base) == "System.Enum")
    }

    /// Underlying integral type of an enum declared in this module
    #[must_use]
    pub fn enum_underlying_type(&self, token: Token) -> Option<&TypeSignature> {
        if !self.is_enum(token) {
            return None;
        }
        let def = self.type_defs.get(token)?;
        def.fields.iter().find_map(|field| {
            self.fields
                .get(*field)
                .filter(|f| f.name == "value__" && !f.is_static())
                .map(|f| &f.signature)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldAttributes, MethodAccessFlags, ModuleBuilder, TypeAttributes};

    fn sample() -> (Module, Token, Token, Token) {
        let mut builder = ModuleBuilder::library("Acme");
        let outer = builder.class("Acme", "Outer", TypeAttributes::PUBLIC);
        let inner = builder.nested_class(outer, "Inner", TypeAttributes::NESTED_PRIVATE);
        let method = builder.method(inner, "Run", MethodAccessFlags::PUBLIC.bits());
        (builder.build(), outer, inner, method)
    }

    #[test]
    fn nested_names_use_slash() {
        let (module, outer, inner, method) = sample();
        assert_eq!(module.type_name(outer), "Acme.Outer");
        assert_eq!(module.type_name(inner), "Acme.Outer/Inner");
        assert_eq!(module.entity_name(method), "Acme.Outer/Inner::Run");
        assert_eq!(module.find_type("Acme.Outer/Inner"), Some(inner));
        assert_eq!(module.declaring_chain(inner), vec![inner, outer]);
    }

    #[test]
    fn remove_type_cascades_and_keeps_names() {
        let (mut module, outer, inner, method) = sample();
        let removed = module.remove_type(outer);
        assert_eq!(removed, vec![outer, inner, method]);
        assert!(module.types.is_empty());
        assert!(!module.contains(inner));
        assert_eq!(module.type_name(inner), "Acme.Outer/Inner");
        assert_eq!(module.entity_name(method), "Acme.Outer/Inner::Run");
        assert_eq!(module.member_declaring_type(method), Some(inner));
    }

    #[test]
    fn remove_member_detaches_from_owner() {
        let (mut module, _, inner, method) = sample();
        assert!(module.remove_member(method));
        assert!(!module.remove_member(method));
        assert!(module
            .type_defs
            .get(inner)
            .is_some_and(|def| def.methods.is_empty()));
    }

    #[test]
    fn corlib_types_are_imported_once() {
        let (mut module, ..) = sample();
        let first = module.import_corlib_type("System", "Attribute");
        let second = module.import_corlib_type("System", "Attribute");
        assert_eq!(first, second);
        assert_eq!(module.type_name(first), "System.Attribute");
        assert_eq!(
            module
                .assembly_refs
                .iter()
                .filter(|(_, a)| CORLIB_NAMES.contains(&a.name.as_str()))
                .count(),
            1
        );
    }

    #[test]
    fn imports_reuse_rows_and_add_new_ones() {
        let (mut module, ..) = sample();
        let local = TypeRef::new("Acme", "Outer", ResolutionScope::Module);
        let first = module.import_type_ref(local.clone());
        assert_eq!(module.import_type_ref(local), first);
        let other = module.import_type_ref(TypeRef::new("Acme", "Other", ResolutionScope::Module));
        assert_ne!(other, first);
        assert_eq!(module.type_refs.len(), 2);

        let ctor = |parent: Token| MemberRef {
            parent: TypeSignature::Class(parent),
            name: ".ctor".to_string(),
            signature: crate::model::MemberRefSignature::Method(
                crate::model::SignatureMethod::instance(TypeSignature::Void, vec![]),
            ),
        };
        let call = module.import_member_ref(ctor(first));
        assert_eq!(module.import_member_ref(ctor(first)), call);
        assert_ne!(module.import_member_ref(ctor(other)), call);
        assert_eq!(module.member_refs.len(), 2);
    }

    #[test]
    fn module_scoped_type_refs_resolve_by_name() {
        let (mut module, outer, ..) = sample();
        let local = module.import_type_ref(TypeRef::new("Acme", "Outer", ResolutionScope::Module));
        let missing =
            module.import_type_ref(TypeRef::new("Acme", "Gone", ResolutionScope::Module));
        assert!(module.targets_module(local));
        assert_eq!(module.resolve_type(local), Some(outer));
        assert_eq!(module.resolve_type(missing), None);

        let index = module.type_index();
        assert_eq!(index.get("Acme.Outer/Inner"), module.find_type("Acme.Outer/Inner").as_ref());
        assert_eq!(module.resolve_type_in(&index, local), Some(outer));
        assert_eq!(module.resolve_type_in(&index, missing), None);

        let external = module.import_corlib_type("System", "Object");
        assert!(!module.targets_module(external));
    }

    #[test]
    fn enum_underlying_type_from_value_field() {
        let mut builder = ModuleBuilder::library("Acme");
        let base = builder.corlib_type("System", "Enum");
        let color = builder.class("Acme", "Color", TypeAttributes::PUBLIC | TypeAttributes::SEALED);
        builder.extends(color, TypeSignature::Class(base));
        builder.field(
            color,
            "value__",
            MethodAccessFlags::PUBLIC.bits() | FieldAttributes::SPECIAL_NAME,
            TypeSignature::U1,
        );
        let module = builder.build();
        assert!(module.is_enum(color));
        assert_eq!(module.enum_underlying_type(color), Some(&TypeSignature::U1));
    }
}
