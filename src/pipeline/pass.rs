//! Pass trait and the context every pass runs in.

use crate::{
    config::GeneratorConfig,
    model::{Module, Token},
    pipeline::{EventKind, EventLog, PipelineState},
    visibility::VisibilityClassifier,
    Result,
};

/// A whole-module transformation step of the reduction pipeline.
///
/// Passes don't declare their own position. The driver runs them in a fixed order, each
/// exactly once, and moves the run to [`ModulePass::state`] once the pass returns.
pub trait ModulePass {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// The pipeline state reached after this pass.
    fn state(&self) -> PipelineState;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }

    /// Run the pass over the whole module.
    ///
    /// Returns the number of changes made. Events should be recorded directly to
    /// `ctx.events`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass cannot complete; the run is abandoned.
    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize>;
}

/// Shared state of one pipeline run.
pub struct PassContext {
    /// The run configuration
    pub config: GeneratorConfig,
    /// Classifier built from the configuration
    pub classifier: VisibilityClassifier,
    /// Events recorded so far
    pub events: EventLog,
    /// Entry point method, as it was when the module was loaded; `None` when converting to a
    /// library
    pub entry_point: Option<Token>,
    /// The entry point's declaring type followed by its enclosing types
    pub entry_chain: Vec<Token>,
}

impl PassContext {
    /// Creates the context for a run over `module`
    #[must_use]
    pub fn new(config: GeneratorConfig, module: &Module) -> Self {
        let entry_point = module.entry_point.filter(|_| !config.convert_to_library);
        let entry_chain = entry_point
            .and_then(|entry| module.methods.get(entry))
            .map(|method| module.declaring_chain(method.declaring_type))
            .unwrap_or_default();
        PassContext {
            config,
            classifier: config.classifier(),
            events: EventLog::new(),
            entry_point,
            entry_chain,
        }
    }

    /// Returns true if `token` is the entry point's type or encloses it
    #[must_use]
    pub fn is_entry_type(&self, token: Token) -> bool {
        self.entry_chain.contains(&token)
    }

    /// Returns true if `token` is the entry point method
    #[must_use]
    pub fn is_entry_point(&self, token: Token) -> bool {
        self.entry_point == Some(token)
    }

    /// Logs a warning under `target` and records it as an event
    pub fn warn(&mut self, target: &str, subject: Option<Token>, message: String) {
        log::warn!(target: target, "{message}");
        let mut event = self.events.record(EventKind::Warning).message(message);
        if let Some(token) = subject {
            event = event.subject(token);
        }
        drop(event);
    }
}
