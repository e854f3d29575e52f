//! Fluent construction of modules.
//!
//! [`ModuleBuilder`] is how tests, benchmarks and tools assemble a [`Module`] without an
//! image on disk. Every call that creates an entity returns its [`Token`], so later calls
//! can wire up cross references.

use crate::model::{
    AssemblyRef, Constant, CustomAttribute, CustomAttributeArgument, Field, Instruction,
    MemberRef, MemberRefSignature, MethodAccessFlags, MethodBody, MethodDef, MethodModifiers,
    Module, ModuleKind, OpCode, Param, Property, ResolutionScope, Resource, SignatureMethod,
    TableId, Token, TypeAttributes, TypeDef, TypeRef, TypeSignature,
};

/// Builder for [`Module`]s.
///
/// # Examples
///
/// ```rust
/// use refasm::prelude::*;
///
/// let mut builder = ModuleBuilder::library("Acme");
/// let widget = builder.class("Acme", "Widget", TypeAttributes::PUBLIC);
/// builder.constructor(widget, MethodAccessFlags::PUBLIC, vec![TypeSignature::I4]);
/// let module = builder.build();
/// assert_eq!(module.type_name(widget), "Acme.Widget");
/// ```
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Starts an empty module of `kind`
    #[must_use]
    pub fn new(assembly: &str, kind: ModuleKind) -> Self {
        let extension = match kind {
            ModuleKind::Dll => "dll",
            ModuleKind::Console | ModuleKind::Windows => "exe",
        };
        ModuleBuilder {
            module: Module::new(&format!("{assembly}.{extension}"), assembly, kind),
        }
    }

    /// Starts an empty class library
    #[must_use]
    pub fn library(assembly: &str) -> Self {
        Self::new(assembly, ModuleKind::Dll)
    }

    /// Starts an empty console executable
    #[must_use]
    pub fn executable(assembly: &str) -> Self {
        Self::new(assembly, ModuleKind::Console)
    }

    /// The module built so far
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Finds or adds a reference to a core library type
    pub fn corlib_type(&mut self, namespace: &str, name: &str) -> Token {
        self.module.import_corlib_type(namespace, name)
    }

    /// Finds or adds a reference to `namespace.name` in the assembly `assembly`
    pub fn external_type(&mut self, assembly: &str, namespace: &str, name: &str) -> Token {
        let existing = self
            .module
            .assembly_refs
            .iter()
            .find(|(_, reference)| reference.name == assembly)
            .map(|(token, _)| token);
        let scope = match existing {
            Some(token) => token,
            None => self.module.assembly_refs.insert(AssemblyRef {
                name: assembly.to_string(),
                version: [1, 0, 0, 0],
                public_key_token: Vec::new(),
            }),
        };
        self.module.import_type_ref(TypeRef::new(
            namespace,
            name,
            ResolutionScope::AssemblyRef(scope),
        ))
    }

    /// Adds a reference to a type of this module by name, as a netmodule would
    pub fn local_type_ref(&mut self, namespace: &str, name: &str) -> Token {
        self.module
            .import_type_ref(TypeRef::new(namespace, name, ResolutionScope::Module))
    }

    /// Adds a top-level type deriving from `System.Object`, or an interface without base
    /// when `flags` carry [`TypeAttributes::INTERFACE`]
    pub fn class(&mut self, namespace: &str, name: &str, flags: u32) -> Token {
        let def = self.new_type(namespace, name, flags);
        let token = self.module.type_defs.insert(def);
        self.module.types.push(token);
        token
    }

    /// Adds a type nested in `outer`
    pub fn nested_class(&mut self, outer: Token, name: &str, flags: u32) -> Token {
        let mut def = self.new_type("", name, flags);
        def.declaring_type = Some(outer);
        let token = self.module.type_defs.insert(def);
        if let Some(outer) = self.module.type_defs.get_mut(outer) {
            outer.nested_types.push(token);
        }
        token
    }

    fn new_type(&mut self, namespace: &str, name: &str, flags: u32) -> TypeDef {
        let mut def = TypeDef::new(namespace, name, flags);
        if flags & TypeAttributes::INTERFACE == 0 {
            let object = self.corlib_type("System", "Object");
            def.extends = Some(TypeSignature::Class(object));
        }
        def
    }

    /// Replaces the base type of `ty`
    pub fn extends(&mut self, ty: Token, base: TypeSignature) {
        if let Some(def) = self.module.type_defs.get_mut(ty) {
            def.extends = Some(base);
        }
    }

    /// Adds an interface edge to `ty`
    pub fn implements(&mut self, ty: Token, interface: TypeSignature) {
        if let Some(def) = self.module.type_defs.get_mut(ty) {
            def.interfaces.push(interface);
        }
    }

    /// Adds a parameterless method returning `void`, instance or static as `flags` say.
    ///
    /// Non-abstract methods get a body of `ret`.
    pub fn method(&mut self, owner: Token, name: &str, flags: u32) -> Token {
        let signature = if flags & MethodModifiers::STATIC.bits() != 0 {
            SignatureMethod::static_method(TypeSignature::Void, vec![])
        } else {
            SignatureMethod::instance(TypeSignature::Void, vec![])
        };
        self.method_with_signature(owner, name, flags, signature)
    }

    /// Adds a method with an explicit signature
    pub fn method_with_signature(
        &mut self,
        owner: Token,
        name: &str,
        flags: u32,
        signature: SignatureMethod,
    ) -> Token {
        let body = (flags & MethodModifiers::ABSTRACT.bits() == 0).then(|| {
            MethodBody::with_instructions(vec![Instruction::simple(OpCode::Ret)])
        });
        let params = (0..signature.params.len())
            .map(|index| Param {
                name: format!("arg{index}"),
                flags: 0,
                custom_attributes: Vec::new(),
            })
            .collect();
        let token = self.module.methods.insert(MethodDef {
            name: name.to_string(),
            flags,
            impl_flags: 0,
            signature,
            params,
            declaring_type: owner,
            body,
            overrides: Vec::new(),
            generic_params: Vec::new(),
            custom_attributes: Vec::new(),
        });
        if let Some(def) = self.module.type_defs.get_mut(owner) {
            def.methods.push(token);
        }
        token
    }

    /// Adds an instance constructor with `access` and parameter types `params`.
    ///
    /// The body is `ldarg.0; ret`; use [`ModuleBuilder::set_body`] to chain to a base.
    pub fn constructor(
        &mut self,
        owner: Token,
        access: MethodAccessFlags,
        params: Vec<TypeSignature>,
    ) -> Token {
        let flags = access.bits()
            | (MethodModifiers::HIDE_BY_SIG
                | MethodModifiers::SPECIAL_NAME
                | MethodModifiers::RTSPECIAL_NAME)
                .bits();
        let token = self.method_with_signature(
            owner,
            ".ctor",
            flags,
            SignatureMethod::instance(TypeSignature::Void, params),
        );
        self.set_body(
            token,
            vec![
                Instruction::simple(OpCode::Ldarg0),
                Instruction::simple(OpCode::Ret),
            ],
        );
        token
    }

    /// Replaces the instructions of a method body, adding a body if there is none
    pub fn set_body(&mut self, method: Token, instructions: Vec<Instruction>) {
        if let Some(def) = self.module.methods.get_mut(method) {
            let body = def.body.get_or_insert_with(MethodBody::default);
            body.instructions = instructions;
        }
    }

    /// Grants mutable access to a method, for details the builder does not cover
    pub fn method_mut(&mut self, method: Token) -> Option<&mut MethodDef> {
        self.module.methods.get_mut(method)
    }

    /// Records that `method` explicitly implements `target`
    pub fn overrides(&mut self, method: Token, target: Token) {
        if let Some(def) = self.module.methods.get_mut(method) {
            def.overrides.push(target);
        }
    }

    /// Adds a field
    pub fn field(&mut self, owner: Token, name: &str, flags: u32, signature: TypeSignature) -> Token {
        let token = self.module.fields.insert(Field {
            name: name.to_string(),
            flags,
            signature,
            declaring_type: owner,
            constant: None,
            initial_value: None,
            custom_attributes: Vec::new(),
        });
        if let Some(def) = self.module.type_defs.get_mut(owner) {
            def.fields.push(token);
        }
        token
    }

    /// Sets the compile time constant of a field
    pub fn field_constant(&mut self, field: Token, constant: Constant) {
        if let Some(def) = self.module.fields.get_mut(field) {
            def.constant = Some(constant);
        }
    }

    /// Sets the RVA-mapped initial data of a field
    pub fn field_initial_value(&mut self, field: Token, data: Vec<u8>) {
        if let Some(def) = self.module.fields.get_mut(field) {
            def.initial_value = Some(data);
            def.flags |= crate::model::FieldAttributes::HAS_FIELD_RVA;
        }
    }

    /// Adds a property over existing accessor methods; the type is taken from the getter
    /// return type, or the setter's last parameter
    pub fn property(
        &mut self,
        owner: Token,
        name: &str,
        getter: Option<Token>,
        setter: Option<Token>,
    ) -> Token {
        let property_type = getter
            .and_then(|g| self.module.methods.get(g))
            .map(|g| g.signature.return_type.clone())
            .or_else(|| {
                setter
                    .and_then(|s| self.module.methods.get(s))
                    .and_then(|s| s.signature.params.last().cloned())
            })
            .unwrap_or(TypeSignature::Object);
        let token = self.module.properties.insert(Property {
            name: name.to_string(),
            flags: 0,
            signature: SignatureMethod::instance(property_type, vec![]),
            declaring_type: owner,
            getter,
            setter,
            custom_attributes: Vec::new(),
        });
        if let Some(def) = self.module.type_defs.get_mut(owner) {
            def.properties.push(token);
        }
        token
    }

    /// Finds or adds a reference to an instance constructor of `ty`
    pub fn external_constructor(&mut self, ty: Token, params: Vec<TypeSignature>) -> Token {
        self.module.import_member_ref(MemberRef {
            parent: TypeSignature::Class(ty),
            name: ".ctor".to_string(),
            signature: MemberRefSignature::Method(SignatureMethod::instance(
                TypeSignature::Void,
                params,
            )),
        })
    }

    /// Applies an attribute to a type, method, field or property
    pub fn attribute(&mut self, target: Token, constructor: Token, args: Vec<CustomAttributeArgument>) {
        let attribute = CustomAttribute {
            constructor,
            fixed_args: args,
            named_args: Vec::new(),
        };
        self.attribute_with(target, attribute);
    }

    /// Applies a fully specified attribute to a type, method, field or property
    pub fn attribute_with(&mut self, target: Token, attribute: CustomAttribute) {
        let list = match target.table_id() {
            Some(TableId::TypeDef) => self
                .module
                .type_defs
                .get_mut(target)
                .map(|d| &mut d.custom_attributes),
            Some(TableId::MethodDef) => self
                .module
                .methods
                .get_mut(target)
                .map(|d| &mut d.custom_attributes),
            Some(TableId::Field) => self
                .module
                .fields
                .get_mut(target)
                .map(|d| &mut d.custom_attributes),
            Some(TableId::Property) => self
                .module
                .properties
                .get_mut(target)
                .map(|d| &mut d.custom_attributes),
            _ => None,
        };
        if let Some(list) = list {
            list.push(attribute);
        }
    }

    /// Applies an attribute to the assembly
    pub fn assembly_attribute(&mut self, constructor: Token, args: Vec<CustomAttributeArgument>) {
        self.module.assembly_attributes.push(CustomAttribute {
            constructor,
            fixed_args: args,
            named_args: Vec::new(),
        });
    }

    /// Applies an attribute to the module
    pub fn module_attribute(&mut self, constructor: Token, args: Vec<CustomAttributeArgument>) {
        self.module.module_attributes.push(CustomAttribute {
            constructor,
            fixed_args: args,
            named_args: Vec::new(),
        });
    }

    /// Marks `method` as the entry point
    pub fn entry_point(&mut self, method: Token) {
        self.module.entry_point = Some(method);
    }

    /// Embeds a manifest resource
    pub fn resource(&mut self, name: &str, data: Vec<u8>) {
        self.module.resources.push(Resource {
            name: name.to_string(),
            public: true,
            data,
        });
    }

    /// Finishes the module
    #[must_use]
    pub fn build(self) -> Module {
        self.module
    }
}
