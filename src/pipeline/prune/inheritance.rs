//! Base type and interface pruning.

use std::collections::BTreeSet;

use log::debug;

use crate::{
    model::{Module, Token, TypeSignature},
    pipeline::{EventKind, ModulePass, PassContext, PipelineState},
    Result,
};

const TARGET: &str = "refasm::prune";

/// Re-roots hidden base types at `System.Object` and drops hidden interfaces together
/// with the methods that only implemented them
pub struct InheritancePruner;

impl ModulePass for InheritancePruner {
    fn name(&self) -> &'static str {
        "prune-bases"
    }

    fn state(&self) -> PipelineState {
        PipelineState::BasesPruned
    }

    fn description(&self) -> &'static str {
        "Re-roots hidden base types and removes hidden interface implementations"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        let mut changes = 0;
        for token in module.all_types() {
            changes += reroot_base(module, ctx, token);
            changes += prune_interfaces(module, ctx, token);
        }
        Ok(changes)
    }
}

fn reroot_base(module: &mut Module, ctx: &mut PassContext, token: Token) -> usize {
    let Some(base) = module
        .type_defs
        .get(token)
        .and_then(|def| def.extends.clone())
    else {
        return 0;
    };
    if ctx.classifier.is_signature_retained(module, &base) {
        return 0;
    }

    let object = module.import_corlib_type("System", "Object");
    let old_name = module.signature_name(&base);
    if let Some(def) = module.type_defs.get_mut(token) {
        def.extends = Some(TypeSignature::Class(object));
    }
    debug!(
        target: TARGET,
        "{} no longer derives from {old_name}",
        module.type_name(token)
    );
    ctx.events
        .record(EventKind::BaseTypeRerooted)
        .subject(token)
        .message(format!("{} was {old_name}", module.type_name(token)));
    1
}

fn prune_interfaces(module: &mut Module, ctx: &mut PassContext, token: Token) -> usize {
    let Some(interfaces) = module
        .type_defs
        .get(token)
        .map(|def| def.interfaces.clone())
    else {
        return 0;
    };

    let mut kept = Vec::with_capacity(interfaces.len());
    let mut removed_heads = BTreeSet::new();
    let mut changes = 0;
    for interface in interfaces {
        if ctx.classifier.is_signature_retained(module, &interface) {
            kept.push(interface);
            continue;
        }
        if let Some(head) = interface.head_token() {
            removed_heads.insert(head);
            if let Some(resolved) = module.resolve_type(head) {
                removed_heads.insert(resolved);
            }
        }
        ctx.events
            .record(EventKind::InterfaceRemoved)
            .subject(token)
            .message(format!(
                "{} : {}",
                module.type_name(token),
                module.signature_name(&interface)
            ));
        changes += 1;
    }
    if removed_heads.is_empty() {
        return changes;
    }
    if let Some(def) = module.type_defs.get_mut(token) {
        def.interfaces = kept;
    }

    let methods = module
        .type_defs
        .get(token)
        .map(|def| def.methods.clone())
        .unwrap_or_default();
    for method in methods {
        changes += prune_overrides(module, ctx, method, &removed_heads);
    }
    changes
}

/// Drops overrides of removed interfaces; a method left with none of its overrides is
/// removed
fn prune_overrides(
    module: &mut Module,
    ctx: &mut PassContext,
    method: Token,
    removed_heads: &BTreeSet<Token>,
) -> usize {
    let Some(overrides) = module.methods.get(method).map(|m| m.overrides.clone()) else {
        return 0;
    };
    if overrides.is_empty() {
        return 0;
    }

    let targets_removed = |target: Token| {
        module.member_declaring_type(target).is_some_and(|owner| {
            removed_heads.contains(&owner)
                || module
                    .resolve_type(owner)
                    .is_some_and(|resolved| removed_heads.contains(&resolved))
        })
    };
    let surviving: Vec<Token> = overrides
        .iter()
        .copied()
        .filter(|target| !targets_removed(*target))
        .collect();
    if surviving.len() == overrides.len() {
        return 0;
    }

    if surviving.is_empty() && !ctx.is_entry_point(method) {
        let name = module.entity_name(method);
        module.remove_member(method);
        debug!(target: TARGET, "removed {name}, it only implemented hidden interfaces");
        ctx.events
            .record(EventKind::MethodRemoved)
            .subject(method)
            .message(name);
    } else if let Some(def) = module.methods.get_mut(method) {
        def.overrides = surviving;
    }
    1
}
