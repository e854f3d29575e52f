//! Type removal: top-level types first, then nested types.

use log::debug;

use crate::{
    model::{Module, Token},
    pipeline::{EventKind, ModulePass, PassContext, PipelineState},
    Result,
};

const TARGET: &str = "refasm::prune";

/// Removes top-level types outside the mask, sparing the entry point's type
pub struct TypePruner;

impl ModulePass for TypePruner {
    fn name(&self) -> &'static str {
        "prune-types"
    }

    fn state(&self) -> PipelineState {
        PipelineState::TypesPruned
    }

    fn description(&self) -> &'static str {
        "Removes top-level types outside the access modifier mask"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        let doomed: Vec<Token> = module
            .types
            .iter()
            .copied()
            .filter(|token| !is_kept(module, ctx, *token))
            .collect();

        for token in &doomed {
            let name = module.type_name(*token);
            let removed = module.remove_type(*token);
            debug!(target: TARGET, "removed type {name} ({} entities)", removed.len());
            ctx.events
                .record(EventKind::TypeRemoved)
                .subject(*token)
                .message(name);
        }
        Ok(doomed.len())
    }
}

/// Removes nested types outside the mask, at any depth
pub struct NestedTypePruner;

impl ModulePass for NestedTypePruner {
    fn name(&self) -> &'static str {
        "prune-nested-types"
    }

    fn state(&self) -> PipelineState {
        PipelineState::NestedTypesPruned
    }

    fn description(&self) -> &'static str {
        "Removes nested types outside the access modifier mask"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        let mut count = 0;
        for token in module.all_types() {
            let nested = module
                .type_defs
                .get(token)
                .is_some_and(|def| def.is_nested());
            if !nested || is_kept(module, ctx, token) {
                continue;
            }
            let name = module.type_name(token);
            module.remove_type(token);
            debug!(target: TARGET, "removed nested type {name}");
            ctx.events
                .record(EventKind::NestedTypeRemoved)
                .subject(token)
                .message(name);
            count += 1;
        }
        Ok(count)
    }
}

fn is_kept(module: &Module, ctx: &PassContext, token: Token) -> bool {
    if ctx.is_entry_type(token) {
        return true;
    }
    ctx.classifier
        .classify_type(module, token)
        .is_some_and(|class| ctx.classifier.is_retained(class))
}
