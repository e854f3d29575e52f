//! Data that only the implementation needs: field initial values and resources.

use log::debug;

use crate::{
    model::{FieldAttributes, Module, Token},
    pipeline::{EventKind, ModulePass, PassContext, PipelineState},
    Result,
};

const TARGET: &str = "refasm::prune";

/// Drops RVA-mapped initial data of fields that are not compile time constants
pub struct InitializerPruner;

impl ModulePass for InitializerPruner {
    fn name(&self) -> &'static str {
        "prune-initializers"
    }

    fn state(&self) -> PipelineState {
        PipelineState::InitializersPruned
    }

    fn description(&self) -> &'static str {
        "Removes field initial values that are not compile time constants"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        let targets: Vec<Token> = module
            .fields
            .iter()
            .filter(|(_, field)| field.constant.is_none() && field.initial_value.is_some())
            .map(|(token, _)| token)
            .collect();

        for token in &targets {
            let name = module.entity_name(*token);
            if let Some(field) = module.fields.get_mut(*token) {
                let size = field.initial_value.take().map_or(0, |data| data.len());
                field.flags &= !FieldAttributes::HAS_FIELD_RVA;
                debug!(target: TARGET, "dropped {size} bytes of initial data from {name}");
            }
            ctx.events
                .record(EventKind::InitialValueRemoved)
                .subject(*token)
                .message(name);
        }
        Ok(targets.len())
    }
}

/// Removes every embedded manifest resource.
///
/// Turning off [`GeneratorConfig::remove_resources`](crate::config::GeneratorConfig::remove_resources) makes
/// the pass keep them all; there is no per-resource filter.
pub struct ResourcePruner;

impl ModulePass for ResourcePruner {
    fn name(&self) -> &'static str {
        "prune-resources"
    }

    fn state(&self) -> PipelineState {
        PipelineState::ResourcesPruned
    }

    fn description(&self) -> &'static str {
        "Removes embedded manifest resources"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        if !ctx.config.remove_resources {
            return Ok(0);
        }
        let resources = std::mem::take(&mut module.resources);
        for resource in &resources {
            debug!(
                target: TARGET,
                "removed resource {} ({} bytes)",
                resource.name,
                resource.data.len()
            );
            ctx.events
                .record(EventKind::ResourceRemoved)
                .message(resource.name.clone());
        }
        Ok(resources.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GeneratorConfig,
        model::{Constant, MethodAccessFlags, ModuleBuilder, TypeAttributes, TypeSignature},
    };

    #[test]
    fn initial_data_goes_but_constants_stay() {
        let mut builder = ModuleBuilder::library("Acme");
        let table = builder.class("Acme", "Table", TypeAttributes::PUBLIC);
        let flags = MethodAccessFlags::PUBLIC.bits() | FieldAttributes::STATIC;
        let data = builder.field(table, "Data", flags, TypeSignature::I4);
        builder.field_initial_value(data, vec![1, 2, 3, 4]);
        let answer = builder.field(
            table,
            "Answer",
            flags | FieldAttributes::LITERAL | FieldAttributes::HAS_DEFAULT,
            TypeSignature::I4,
        );
        builder.field_constant(answer, Constant::I4(42));
        let mut module = builder.build();

        let mut ctx = PassContext::new(GeneratorConfig::default(), &module);
        assert_eq!(InitializerPruner.run(&mut module, &mut ctx).unwrap(), 1);

        let data = module.fields.get(data).unwrap();
        assert!(data.initial_value.is_none());
        assert_eq!(data.flags & FieldAttributes::HAS_FIELD_RVA, 0);
        assert_eq!(module.fields.get(answer).unwrap().constant, Some(Constant::I4(42)));
    }

    #[test]
    fn resources_are_drained() {
        let mut builder = ModuleBuilder::library("Acme");
        builder.resource("Acme.Strings.resources", vec![0; 32]);
        builder.resource("logo.png", vec![0; 8]);
        let mut module = builder.build();

        let mut ctx = PassContext::new(GeneratorConfig::default(), &module);
        assert_eq!(ResourcePruner.run(&mut module, &mut ctx).unwrap(), 2);
        assert!(module.resources.is_empty());
        assert_eq!(ctx.events.count_kind(EventKind::ResourceRemoved), 2);
    }

    #[test]
    fn resources_stay_when_disabled() {
        let mut builder = ModuleBuilder::library("Acme");
        builder.resource("logo.png", vec![0; 8]);
        let mut module = builder.build();

        let config = GeneratorConfig {
            remove_resources: false,
            ..GeneratorConfig::default()
        };
        let mut ctx = PassContext::new(config, &module);
        assert_eq!(ResourcePruner.run(&mut module, &mut ctx).unwrap(), 0);
        assert_eq!(module.resources.len(), 1);
    }
}
