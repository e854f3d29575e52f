//! Walking every cross reference held by live definitions.

use std::collections::BTreeSet;

use crate::model::{
    CustomAttribute, GenericParam, MemberRefSignature, Module, ResolutionScope, TableId, Token,
    TypeSignature,
};

/// The holder of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Referrer {
    /// A type, method, field or property
    Entity(Token),
    /// An assembly-level attribute
    Assembly,
    /// A module-level attribute or the entry point
    Module,
}

impl Module {
    /// Human readable name of a referrer
    #[must_use]
    pub fn referrer_name(&self, referrer: Referrer) -> String {
        match referrer {
            Referrer::Entity(token) => self.entity_name(token),
            Referrer::Assembly => format!("[assembly: {}]", self.assembly.name),
            Referrer::Module => format!("[module: {}]", self.name),
        }
    }

    /// Calls `visit` for every token referenced by a live definition, an assembly or
    /// module attribute, or the entry point.
    ///
    /// References through a live `MemberRef` or a nested `TypeRef` are followed, and the
    /// tokens they mention are reported with the original referrer.
    pub fn visit_references(&self, visit: &mut impl FnMut(Referrer, Token)) {
        let mut emit = |referrer: Referrer, token: Token| self.expand(referrer, token, visit, 0);

        for (token, def) in self.type_defs.iter() {
            let referrer = Referrer::Entity(token);
            for sig in def.extends.iter().chain(def.interfaces.iter()) {
                sig.visit_tokens(&mut |t| emit(referrer, t));
            }
            visit_generic_params(&def.generic_params, &mut |t| emit(referrer, t));
            visit_attributes(&def.custom_attributes, &mut |t| emit(referrer, t));
        }

        for (token, method) in self.methods.iter() {
            let referrer = Referrer::Entity(token);
            method.signature.visit_tokens(&mut |t| emit(referrer, t));
            visit_generic_params(&method.generic_params, &mut |t| emit(referrer, t));
            visit_attributes(&method.custom_attributes, &mut |t| emit(referrer, t));
            for param in &method.params {
                visit_attributes(&param.custom_attributes, &mut |t| emit(referrer, t));
            }
            for target in &method.overrides {
                emit(referrer, *target);
            }
            if let Some(body) = &method.body {
                for local in &body.locals {
                    local.visit_tokens(&mut |t| emit(referrer, t));
                }
                for token in body.instructions.iter().filter_map(|i| i.token()) {
                    emit(referrer, token);
                }
                for catch in body
                    .exception_handlers
                    .iter()
                    .filter_map(|h| h.catch_type)
                {
                    emit(referrer, catch);
                }
            }
        }

        for (token, field) in self.fields.iter() {
            let referrer = Referrer::Entity(token);
            field.signature.visit_tokens(&mut |t| emit(referrer, t));
            visit_attributes(&field.custom_attributes, &mut |t| emit(referrer, t));
        }

        for (token, property) in self.properties.iter() {
            let referrer = Referrer::Entity(token);
            property.signature.visit_tokens(&mut |t| emit(referrer, t));
            for accessor in property.getter.iter().chain(property.setter.iter()) {
                emit(referrer, *accessor);
            }
            visit_attributes(&property.custom_attributes, &mut |t| emit(referrer, t));
        }

        visit_attributes(&self.assembly_attributes, &mut |t| emit(Referrer::Assembly, t));
        visit_attributes(&self.module_attributes, &mut |t| emit(Referrer::Module, t));
        if let Some(entry) = self.entry_point {
            emit(Referrer::Module, entry);
        }
    }

    fn expand(
        &self,
        referrer: Referrer,
        token: Token,
        visit: &mut impl FnMut(Referrer, Token),
        depth: usize,
    ) {
        visit(referrer, token);
        if depth > 16 {
            return;
        }
        match token.table_id() {
            Some(TableId::MemberRef) => {
                if let Some(reference) = self.member_refs.get(token) {
                    let mut inner = Vec::new();
                    reference.parent.visit_tokens(&mut |t| inner.push(t));
                    match &reference.signature {
                        MemberRefSignature::Method(sig) => sig.visit_tokens(&mut |t| inner.push(t)),
                        MemberRefSignature::Field(sig) => sig.visit_tokens(&mut |t| inner.push(t)),
                    }
                    for t in inner {
                        self.expand(referrer, t, visit, depth + 1);
                    }
                }
            }
            Some(TableId::TypeRef) => {
                if let Some(ResolutionScope::TypeRef(parent)) =
                    self.type_refs.get(token).map(|r| r.scope)
                {
                    self.expand(referrer, parent, visit, depth + 1);
                }
            }
            _ => {}
        }
    }

    /// Every token referenced from live definitions
    #[must_use]
    pub fn referenced_tokens(&self) -> BTreeSet<Token> {
        let mut tokens = BTreeSet::new();
        self.visit_references(&mut |_, token| {
            tokens.insert(token);
        });
        tokens
    }

    /// Tombstones type and member references that no live definition uses anymore.
    ///
    /// Returns the number of dropped references.
    pub fn compact_references(&mut self) -> usize {
        let used = self.referenced_tokens();
        let unused: Vec<Token> = self
            .type_refs
            .tokens()
            .into_iter()
            .chain(self.member_refs.tokens())
            .filter(|token| !used.contains(token))
            .collect();
        unused
            .into_iter()
            .filter(|token| self.drop_reference(*token))
            .count()
    }
}

fn visit_attributes(attributes: &[CustomAttribute], visit: &mut impl FnMut(Token)) {
    for attribute in attributes {
        visit(attribute.constructor);
        for token in attribute.argument_type_tokens() {
            visit(token);
        }
    }
}

fn visit_generic_params(params: &[GenericParam], visit: &mut impl FnMut(Token)) {
    for param in params {
        for constraint in &param.constraints {
            TypeSignature::visit_tokens(constraint, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CustomAttributeArgument, MethodAccessFlags, ModuleBuilder, TypeAttributes,
    };

    #[test]
    fn attribute_arguments_are_reported_with_their_holder() {
        let mut builder = ModuleBuilder::library("Acme");
        let public = builder.class("Acme", "PublicA", TypeAttributes::PUBLIC);
        let hidden = builder.class("Acme", "Hidden", TypeAttributes::NOT_PUBLIC);
        let attr = builder.corlib_type("System", "ObsoleteAttribute");
        let system_type = builder.corlib_type("System", "Type");
        let ctor = builder.external_constructor(attr, vec![TypeSignature::Class(system_type)]);
        builder.attribute(
            public,
            ctor,
            vec![CustomAttributeArgument::Type(TypeSignature::Class(hidden))],
        );
        let module = builder.build();

        let mut seen = Vec::new();
        module.visit_references(&mut |referrer, token| {
            if token == hidden {
                seen.push(referrer);
            }
        });
        assert_eq!(seen, vec![Referrer::Entity(public)]);
    }

    #[test]
    fn member_refs_expand_to_their_parent() {
        let mut builder = ModuleBuilder::library("Acme");
        let owner = builder.class("Acme", "Owner", TypeAttributes::PUBLIC);
        let method = builder.method(owner, "Run", MethodAccessFlags::PUBLIC.bits());
        let exception = builder.corlib_type("System", "Exception");
        let ctor = builder.external_constructor(exception, vec![]);
        builder.set_body(
            method,
            vec![crate::model::Instruction::with_token(
                crate::model::OpCode::Newobj,
                ctor,
            )],
        );
        let module = builder.build();
        let tokens = module.referenced_tokens();
        assert!(tokens.contains(&ctor));
        assert!(tokens.contains(&exception));
    }

    #[test]
    fn compaction_drops_unused_references() {
        let mut builder = ModuleBuilder::library("Acme");
        builder.class("Acme", "Owner", TypeAttributes::PUBLIC);
        let unused = builder.corlib_type("System", "Guid");
        let mut module = builder.build();
        let before = module.type_refs.len();
        let dropped = module.compact_references();
        assert!(dropped >= 1);
        assert!(!module.type_refs.contains(unused));
        assert_eq!(module.type_refs.len(), before - dropped);
        assert_eq!(module.type_name(unused), "System.Guid");
    }
}
