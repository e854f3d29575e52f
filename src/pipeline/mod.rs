//! The reduction pipeline: ordered passes over one module, then the consistency check
//! that decides whether the result may be written.
//!
//! # Architecture
//!
//! A [`Pipeline`] owns the fixed sequence of [`ModulePass`]es. [`Pipeline::run`] takes the
//! module by value, runs every pass exactly once in order and then runs the
//! [`ConsistencyChecker`]. The returned [`PipelineRun`] owns the module until it is
//! committed:
//!
//! ```text
//! Loaded -> BodiesStripped -> TypesPruned -> ... -> CommonAttributesPruned
//!        -> Validated -> Committed
//!        \-> Aborted (unresolved in-module type references)
//! ```
//!
//! After every pass the driver looks for live entities that still point at something the
//! pass removed and records them as [`EventKind::DanglingReference`] warnings. They never
//! stop the run.
//!
//! # Example
//!
//! ```rust
//! use refasm::prelude::*;
//!
//! let mut builder = ModuleBuilder::library("Acme");
//! let widget = builder.class("Acme", "Widget", TypeAttributes::PUBLIC);
//! builder.method(widget, "Run", MethodAccessFlags::PUBLIC.bits());
//! builder.class("Acme", "Helper", TypeAttributes::NOT_PUBLIC);
//!
//! let pipeline = Pipeline::new(GeneratorConfig::public_only());
//! let mut run = pipeline.run(builder.build()).unwrap();
//! assert_eq!(run.state(), PipelineState::Validated);
//!
//! let module = run.commit().unwrap();
//! assert_eq!(module.types.len(), 1);
//! ```

mod consistency;
mod events;
mod pass;
pub mod prune;
mod state;
mod strip;

use std::collections::BTreeSet;

use log::{debug, info, warn};

pub use consistency::{ConsistencyChecker, ConsistencyReport};
pub use events::{Event, EventBuilder, EventKind, EventLog, PipelineStats};
pub use pass::{ModulePass, PassContext};
pub use state::PipelineState;
pub use strip::BodyStripper;

use crate::{
    config::GeneratorConfig,
    model::{Module, Token},
    Error, Result,
};

const TARGET: &str = "refasm::pipeline";

/// The fixed sequence of passes plus the consistency gate
pub struct Pipeline {
    config: GeneratorConfig,
    passes: Vec<Box<dyn ModulePass>>,
    checker: ConsistencyChecker,
}

impl Pipeline {
    /// Creates the standard pipeline for `config`
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let passes: Vec<Box<dyn ModulePass>> = vec![
            Box::new(BodyStripper),
            Box::new(prune::TypePruner),
            Box::new(prune::NestedTypePruner),
            Box::new(prune::InheritancePruner),
            Box::new(prune::MemberPruner),
            Box::new(prune::PropertyPruner),
            Box::new(prune::AttributePruner),
            Box::new(prune::InitializerPruner),
            Box::new(prune::ResourcePruner),
            Box::new(prune::CommonAttributePruner),
        ];
        Pipeline {
            config,
            passes,
            checker: ConsistencyChecker::new(config.fail_on_dangling_references),
        }
    }

    /// The configuration runs use
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The passes, in execution order
    pub fn passes(&self) -> impl Iterator<Item = &dyn ModulePass> {
        self.passes.iter().map(AsRef::as_ref)
    }

    /// Runs every pass over `module`, then the consistency check.
    ///
    /// The returned run is either [`PipelineState::Validated`] or
    /// [`PipelineState::Aborted`].
    ///
    /// # Errors
    ///
    /// Returns an error if a pass fails. A failed consistency check is not an error here;
    /// it surfaces from [`PipelineRun::commit`].
    pub fn run(&self, mut module: Module) -> Result<PipelineRun> {
        let mut ctx = PassContext::new(self.config, &module);
        let mut state = PipelineState::Loaded;
        info!(
            target: TARGET,
            "reducing {} to {} surface",
            module.name,
            self.config.modifiers
        );

        for pass in &self.passes {
            let expected = state.next();
            if expected != Some(pass.state()) {
                return Err(Error::Error(format!(
                    "pass {} reaches {} but the run is at {state}",
                    pass.name(),
                    pass.state()
                )));
            }

            let buried_before: BTreeSet<_> = module.graveyard().keys().copied().collect();
            ctx.events.enter_pass(pass.name());
            ctx.events
                .record(EventKind::PassStarted)
                .message(pass.description());
            let changes = pass.run(&mut module, &mut ctx)?;
            report_dangling(&module, &mut ctx, &buried_before);
            ctx.events
                .record(EventKind::PassCompleted)
                .message(format!("{changes} change(s)"));
            ctx.events.leave_pass();

            state = pass.state();
            debug!(target: TARGET, "{} made {changes} change(s), now {state}", pass.name());
        }

        let report = self.checker.check(&module);
        for reference in &report.unresolved {
            ctx.events
                .record(EventKind::UnresolvedReference)
                .subject(reference.target)
                .message(reference.to_string());
        }
        let state = if report.is_consistent() {
            PipelineState::Validated
        } else {
            PipelineState::Aborted
        };
        info!(target: TARGET, "{}: {}", module.name, ctx.events.stats());

        Ok(PipelineRun {
            module,
            state,
            events: ctx.events,
            report,
        })
    }
}

/// Records a warning for every live reference to an entity buried since `buried_before`
fn report_dangling(module: &Module, ctx: &mut PassContext, buried_before: &BTreeSet<Token>) {
    let fresh: BTreeSet<_> = module
        .graveyard()
        .keys()
        .filter(|token| !buried_before.contains(token))
        .copied()
        .collect();
    if fresh.is_empty() {
        return;
    }

    let mut seen = BTreeSet::new();
    module.visit_references(&mut |referrer, token| {
        if fresh.contains(&token) && !module.contains(token) {
            seen.insert((referrer, token));
        }
    });
    for (referrer, token) in seen {
        let message = format!(
            "{} still references removed {}",
            module.referrer_name(referrer),
            module.entity_name(token)
        );
        warn!(target: TARGET, "{message}");
        ctx.events
            .record(EventKind::DanglingReference)
            .subject(token)
            .message(message);
    }
}

/// A finished run, owning the reduced module until it is committed
#[derive(Debug)]
pub struct PipelineRun {
    module: Module,
    state: PipelineState,
    events: EventLog,
    report: ConsistencyReport,
}

impl PipelineRun {
    /// Where the run stands
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Everything the passes recorded
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Summary counts derived from the events
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        self.events.stats()
    }

    /// The consistency check outcome
    #[must_use]
    pub fn report(&self) -> &ConsistencyReport {
        &self.report
    }

    /// The reduced module, for inspection
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Hands the module over for serialization.
    ///
    /// Moves a validated run to [`PipelineState::Committed`] and drops type and member
    /// references nothing uses anymore.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConsistencyCheckFailed`] listing every unresolved reference if the
    /// check failed; the run is then [`PipelineState::Aborted`] for good.
    pub fn commit(&mut self) -> Result<&mut Module> {
        match self.state {
            PipelineState::Validated => {
                let dropped = self.module.compact_references();
                if dropped > 0 {
                    self.events
                        .record(EventKind::ReferencesCompacted)
                        .message(format!("{dropped} unused reference(s)"));
                }
                self.state = PipelineState::Committed;
                Ok(&mut self.module)
            }
            PipelineState::Committed => Ok(&mut self.module),
            _ => {
                self.state = PipelineState::Aborted;
                Err(Error::ConsistencyCheckFailed {
                    unresolved: self.report.unresolved.clone(),
                })
            }
        }
    }

    /// Splits the run into the module and its events
    #[must_use]
    pub fn into_parts(self) -> (Module, EventLog) {
        (self.module, self.events)
    }
}
