//! Method, field and property pruning.

use log::debug;

use crate::{
    model::{Module, Token},
    pipeline::{EventKind, ModulePass, PassContext, PipelineState},
    Result,
};

const TARGET: &str = "refasm::prune";

/// Removes methods and fields outside the mask, sparing the entry point
pub struct MemberPruner;

impl ModulePass for MemberPruner {
    fn name(&self) -> &'static str {
        "prune-members"
    }

    fn state(&self) -> PipelineState {
        PipelineState::MembersPruned
    }

    fn description(&self) -> &'static str {
        "Removes methods and fields outside the access modifier mask"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        let mut doomed = Vec::new();
        for token in module.all_types() {
            let Some(def) = module.type_defs.get(token) else {
                continue;
            };
            for member in def.methods.iter().chain(def.fields.iter()).copied() {
                if ctx.is_entry_point(member) {
                    continue;
                }
                let retained = ctx
                    .classifier
                    .classify_member(module, member)
                    .is_some_and(|class| ctx.classifier.is_retained(class));
                if !retained {
                    doomed.push(member);
                }
            }
        }

        for member in &doomed {
            let name = module.entity_name(*member);
            let kind = if module.methods.contains(*member) {
                EventKind::MethodRemoved
            } else {
                EventKind::FieldRemoved
            };
            if module.remove_member(*member) {
                debug!(target: TARGET, "removed {name}");
                ctx.events.record(kind).subject(*member).message(name);
            }
        }
        Ok(doomed.len())
    }
}

/// Detaches accessors that are gone or hidden and removes properties left without any
pub struct PropertyPruner;

impl ModulePass for PropertyPruner {
    fn name(&self) -> &'static str {
        "prune-properties"
    }

    fn state(&self) -> PipelineState {
        PipelineState::PropertiesPruned
    }

    fn description(&self) -> &'static str {
        "Removes hidden property accessors and properties without accessors"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        let mut changes = 0;
        let properties: Vec<Token> = module.properties.tokens();
        for token in properties {
            let Some(property) = module.properties.get(token) else {
                continue;
            };
            let keep = |accessor: Option<Token>| {
                accessor.filter(|method| {
                    ctx.classifier
                        .classify_member(module, *method)
                        .is_some_and(|class| ctx.classifier.is_retained(class))
                })
            };
            let getter = keep(property.getter);
            let setter = keep(property.setter);
            let dropped: Vec<Token> = [property.getter, property.setter]
                .into_iter()
                .flatten()
                .filter(|accessor| Some(*accessor) != getter && Some(*accessor) != setter)
                .collect();
            if dropped.is_empty() {
                continue;
            }

            let name = module.entity_name(token);
            for accessor in dropped {
                ctx.events
                    .record(EventKind::AccessorRemoved)
                    .subject(accessor)
                    .message(format!("{name}: {}", module.entity_name(accessor)));
                changes += 1;
            }
            if getter.is_none() && setter.is_none() {
                module.remove_member(token);
                debug!(target: TARGET, "removed property {name}");
                ctx.events
                    .record(EventKind::PropertyRemoved)
                    .subject(token)
                    .message(name);
                changes += 1;
            } else if let Some(property) = module.properties.get_mut(token) {
                property.getter = getter;
                property.setter = setter;
            }
        }
        Ok(changes)
    }
}
