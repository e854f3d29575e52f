//! Attribute pruning: attributes that mention hidden types, and the common
//! assembly-level boilerplate.

use log::debug;

use crate::{
    model::{CustomAttribute, Module, Token},
    pipeline::{EventKind, ModulePass, PassContext, PipelineState},
    visibility::VisibilityClassifier,
    Result,
};

const TARGET: &str = "refasm::prune";

/// Assembly attributes describing versioning, branding, compliance and compilation
/// mode. None of them matter to a compiler consuming the reference module.
pub const COMMON_ASSEMBLY_ATTRIBUTES: &[&str] = &[
    "System.Reflection.AssemblyVersionAttribute",
    "System.Resources.NeutralResourcesLanguageAttribute",
    "System.Reflection.AssemblyTitleAttribute",
    "System.Reflection.AssemblyProductAttribute",
    "System.Reflection.AssemblyInformationalVersionAttribute",
    "System.Reflection.AssemblyFileVersionAttribute",
    "System.Reflection.AssemblyConfigurationAttribute",
    "System.Reflection.AssemblyCompanyAttribute",
    "System.Reflection.AssemblyMetadataAttribute",
    "System.Reflection.AssemblyDefaultAliasAttribute",
    "System.Runtime.InteropServices.DefaultDllImportSearchPathsAttribute",
    "System.CLSCompliantAttribute",
    "System.Runtime.CompilerServices.DependencyAttribute",
    "System.Diagnostics.DebuggableAttribute",
    "System.Runtime.CompilerServices.RuntimeCompatibilityAttribute",
    "System.Runtime.CompilerServices.CompilationRelaxationsAttribute",
];

/// Module attributes removed alongside [`COMMON_ASSEMBLY_ATTRIBUTES`]
pub const COMMON_MODULE_ATTRIBUTES: &[&str] = &["System.Security.UnverifiableCodeAttribute"];

/// Something attributes hang off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Entity(Token),
    Param(Token, usize),
    Assembly,
    Module,
}

impl Holder {
    fn subject(self) -> Option<Token> {
        match self {
            Holder::Entity(token) | Holder::Param(token, _) => Some(token),
            Holder::Assembly | Holder::Module => None,
        }
    }

    fn name(self, module: &Module) -> String {
        match self {
            Holder::Entity(token) => module.entity_name(token),
            Holder::Param(token, index) => format!("{} (parameter {index})", module.entity_name(token)),
            Holder::Assembly => format!("assembly {}", module.assembly.name),
            Holder::Module => format!("module {}", module.name),
        }
    }
}

fn holders(module: &Module) -> Vec<Holder> {
    let mut holders = vec![Holder::Assembly, Holder::Module];
    for ty in module.all_types() {
        holders.push(Holder::Entity(ty));
        let Some(def) = module.type_defs.get(ty) else {
            continue;
        };
        for method in &def.methods {
            holders.push(Holder::Entity(*method));
            let params = module.methods.get(*method).map_or(0, |m| m.params.len());
            holders.extend((0..params).map(|index| Holder::Param(*method, index)));
        }
        holders.extend(def.fields.iter().map(|field| Holder::Entity(*field)));
        holders.extend(def.properties.iter().map(|property| Holder::Entity(*property)));
    }
    holders
}

fn attributes(module: &Module, holder: Holder) -> Option<&Vec<CustomAttribute>> {
    match holder {
        Holder::Assembly => Some(&module.assembly_attributes),
        Holder::Module => Some(&module.module_attributes),
        Holder::Param(method, index) => module
            .methods
            .get(method)
            .and_then(|m| m.params.get(index))
            .map(|p| &p.custom_attributes),
        Holder::Entity(token) => {
            if let Some(def) = module.type_defs.get(token) {
                return Some(&def.custom_attributes);
            }
            if let Some(method) = module.methods.get(token) {
                return Some(&method.custom_attributes);
            }
            if let Some(field) = module.fields.get(token) {
                return Some(&field.custom_attributes);
            }
            module.properties.get(token).map(|p| &p.custom_attributes)
        }
    }
}

fn attributes_mut(module: &mut Module, holder: Holder) -> Option<&mut Vec<CustomAttribute>> {
    match holder {
        Holder::Assembly => Some(&mut module.assembly_attributes),
        Holder::Module => Some(&mut module.module_attributes),
        Holder::Param(method, index) => module
            .methods
            .get_mut(method)
            .and_then(|m| m.params.get_mut(index))
            .map(|p| &mut p.custom_attributes),
        Holder::Entity(token) => {
            if module.type_defs.contains(token) {
                return module.type_defs.get_mut(token).map(|d| &mut d.custom_attributes);
            }
            if module.methods.contains(token) {
                return module.methods.get_mut(token).map(|m| &mut m.custom_attributes);
            }
            if module.fields.contains(token) {
                return module.fields.get_mut(token).map(|f| &mut f.custom_attributes);
            }
            module
                .properties
                .get_mut(token)
                .map(|p| &mut p.custom_attributes)
        }
    }
}

/// Removes the attributes of `holder` for which `doomed` is true and records one event
/// of `kind` per removal
fn remove_where(
    module: &mut Module,
    ctx: &mut PassContext,
    holder: Holder,
    kind: EventKind,
    doomed: impl Fn(&Module, &CustomAttribute) -> bool,
) -> usize {
    let Some(list) = attributes(module, holder) else {
        return 0;
    };
    let verdicts: Vec<bool> = list.iter().map(|attr| doomed(module, attr)).collect();
    if !verdicts.contains(&true) {
        return 0;
    }

    let holder_name = holder.name(module);
    for (attribute, _) in list.iter().zip(&verdicts).filter(|(_, gone)| **gone) {
        let message = format!("[{}] on {holder_name}", module.attribute_type_name(attribute));
        debug!(target: TARGET, "removed {message}");
        let mut event = ctx.events.record(kind).message(message);
        if let Some(subject) = holder.subject() {
            event = event.subject(subject);
        }
        drop(event);
    }

    let removed = verdicts.iter().filter(|gone| **gone).count();
    if let Some(list) = attributes_mut(module, holder) {
        let mut verdicts = verdicts.into_iter();
        list.retain(|_| !verdicts.next().unwrap_or(false));
    }
    removed
}

/// Returns true if the attribute type, its constructor or any type it receives as an
/// argument is hidden
pub fn references_hidden_type(
    module: &Module,
    classifier: &VisibilityClassifier,
    attribute: &CustomAttribute,
) -> bool {
    if !module.contains(attribute.constructor) {
        return true;
    }
    let Some(attribute_type) = module.attribute_type(attribute) else {
        return true;
    };
    !classifier.is_type_token_retained(module, attribute_type)
        || attribute
            .argument_type_tokens()
            .into_iter()
            .any(|token| !classifier.is_type_token_retained(module, token))
}

/// Removes attributes whose type or type-valued arguments are hidden
pub struct AttributePruner;

impl ModulePass for AttributePruner {
    fn name(&self) -> &'static str {
        "prune-attributes"
    }

    fn state(&self) -> PipelineState {
        PipelineState::AttributesPruned
    }

    fn description(&self) -> &'static str {
        "Removes attributes that reference hidden types"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        let classifier = ctx.classifier;
        let mut removed = 0;
        for holder in holders(module) {
            removed += remove_where(
                module,
                ctx,
                holder,
                EventKind::AttributeRemoved,
                |module, attribute| references_hidden_type(module, &classifier, attribute),
            );
        }
        Ok(removed)
    }
}

/// Removes the well known assembly and module attributes that only describe the build
pub struct CommonAttributePruner;

impl ModulePass for CommonAttributePruner {
    fn name(&self) -> &'static str {
        "prune-common-attributes"
    }

    fn state(&self) -> PipelineState {
        PipelineState::CommonAttributesPruned
    }

    fn description(&self) -> &'static str {
        "Removes versioning and compilation attributes from the assembly and module"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        if !ctx.config.remove_common_attributes {
            return Ok(0);
        }
        let listed = |names: &'static [&'static str]| {
            move |module: &Module, attribute: &CustomAttribute| {
                names.contains(&module.attribute_type_name(attribute).as_str())
            }
        };
        let assembly = remove_where(
            module,
            ctx,
            Holder::Assembly,
            EventKind::CommonAttributeRemoved,
            listed(COMMON_ASSEMBLY_ATTRIBUTES),
        );
        let module_level = remove_where(
            module,
            ctx,
            Holder::Module,
            EventKind::CommonAttributeRemoved,
            listed(COMMON_MODULE_ATTRIBUTES),
        );
        Ok(assembly + module_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GeneratorConfig,
        model::{
            CustomAttributeArgument, MethodAccessFlags, ModuleBuilder, TypeAttributes,
            TypeSignature,
        },
        pipeline::prune::{MemberPruner, NestedTypePruner, TypePruner},
    };

    #[test]
    fn attributes_with_hidden_type_arguments_go() {
        let mut builder = ModuleBuilder::library("Acme");
        let widget = builder.class("Acme", "Widget", TypeAttributes::PUBLIC);
        let secret = builder.nested_class(widget, "Secret", TypeAttributes::NESTED_PRIVATE);
        let type_converter = builder.corlib_type("System.ComponentModel", "TypeConverterAttribute");
        let system_type = builder.corlib_type("System", "Type");
        let ctor = builder.external_constructor(type_converter, vec![TypeSignature::class(system_type)]);
        builder.attribute(
            widget,
            ctor,
            vec![CustomAttributeArgument::Type(TypeSignature::class(secret))],
        );
        builder.attribute(
            widget,
            ctor,
            vec![CustomAttributeArgument::Type(TypeSignature::class(widget))],
        );
        let mut module = builder.build();

        let mut ctx = PassContext::new(GeneratorConfig::public_only(), &module);
        NestedTypePruner.run(&mut module, &mut ctx).unwrap();
        assert_eq!(AttributePruner.run(&mut module, &mut ctx).unwrap(), 1);
        let kept = &module.type_defs.get(widget).unwrap().custom_attributes;
        assert_eq!(kept.len(), 1);
        assert_eq!(
            kept[0].fixed_args,
            vec![CustomAttributeArgument::Type(TypeSignature::class(widget))]
        );
    }

    #[test]
    fn attributes_of_hidden_type_go_from_members_too() {
        let mut builder = ModuleBuilder::library("Acme");
        let marker = builder.class("Acme", "MarkerAttribute", TypeAttributes::NOT_PUBLIC);
        let marker_ctor = builder.constructor(marker, MethodAccessFlags::PUBLIC, vec![]);
        let widget = builder.class("Acme", "Widget", TypeAttributes::PUBLIC);
        let run = builder.method(widget, "Run", MethodAccessFlags::PUBLIC.bits());
        builder.attribute(run, marker_ctor, vec![]);
        builder.assembly_attribute(marker_ctor, vec![]);
        let mut module = builder.build();

        let mut ctx = PassContext::new(GeneratorConfig::default(), &module);
        TypePruner.run(&mut module, &mut ctx).unwrap();
        assert!(module.contains(marker));
        assert_eq!(AttributePruner.run(&mut module, &mut ctx).unwrap(), 0);

        let mut ctx = PassContext::new(GeneratorConfig::public_only(), &module);
        TypePruner.run(&mut module, &mut ctx).unwrap();
        MemberPruner.run(&mut module, &mut ctx).unwrap();
        assert_eq!(AttributePruner.run(&mut module, &mut ctx).unwrap(), 2);
        assert!(module.methods.get(run).unwrap().custom_attributes.is_empty());
        assert!(module.assembly_attributes.is_empty());
    }

    #[test]
    fn common_attributes_are_stripped_from_the_assembly_and_module() {
        let mut builder = ModuleBuilder::library("Acme");
        let version = builder.corlib_type("System.Reflection", "AssemblyVersionAttribute");
        let visible_to = builder.corlib_type(
            "System.Runtime.CompilerServices",
            "InternalsVisibleToAttribute",
        );
        let unverifiable = builder.corlib_type("System.Security", "UnverifiableCodeAttribute");
        let version_ctor = builder.external_constructor(version, vec![TypeSignature::String]);
        let visible_ctor = builder.external_constructor(visible_to, vec![TypeSignature::String]);
        let unverifiable_ctor = builder.external_constructor(unverifiable, vec![]);
        builder.assembly_attribute(
            version_ctor,
            vec![CustomAttributeArgument::String("1.0.0.0".into())],
        );
        builder.assembly_attribute(
            visible_ctor,
            vec![CustomAttributeArgument::String("Acme.Tests".into())],
        );
        builder.module_attribute(unverifiable_ctor, vec![]);
        let mut module = builder.build();

        let mut ctx = PassContext::new(GeneratorConfig::default(), &module);
        assert_eq!(CommonAttributePruner.run(&mut module, &mut ctx).unwrap(), 2);
        assert_eq!(module.assembly_attributes.len(), 1);
        assert_eq!(module.assembly_attributes[0].constructor, visible_ctor);
        assert!(module.module_attributes.is_empty());
        assert_eq!(ctx.events.count_kind(EventKind::CommonAttributeRemoved), 2);
    }
}
