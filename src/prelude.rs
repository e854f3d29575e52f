//! # refasm Prelude
//!
//! The types most programs need: configuration, the generator, the pipeline and the
//! module model used to build or inspect modules.
//!
//! ```rust
//! use refasm::prelude::*;
//!
//! let mut builder = ModuleBuilder::library("Acme");
//! builder.class("Acme", "Widget", TypeAttributes::PUBLIC);
//! let run = Pipeline::new(GeneratorConfig::public_only()).run(builder.build())?;
//! assert_eq!(run.state(), PipelineState::Validated);
//! # Ok::<(), refasm::Error>(())
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

pub use crate::{Error, Result, UnresolvedReference};

// ================================================================================================
// Main Entry Points
// ================================================================================================

pub use crate::{GenerationSummary, GeneratorConfig, ReferenceGenerator};

pub use crate::pipeline::{
    ConsistencyChecker, ConsistencyReport, EventKind, EventLog, ModulePass, Pipeline,
    PipelineRun, PipelineState, PipelineStats,
};

pub use crate::visibility::{AccessModifiers, Accessibility, FoldPolicy, VisibilityClassifier};

// ================================================================================================
// Module Model
// ================================================================================================

pub use crate::model::{
    Constant, CustomAttribute, CustomAttributeArgument, FieldAttributes, Instruction,
    MethodAccessFlags, MethodModifiers, Module, ModuleBuilder, ModuleFlags, ModuleKind, OpCode,
    SignatureMethod, Token, TypeAttributes, TypeSignature,
};

// ================================================================================================
// Collaborators
// ================================================================================================

pub use crate::decompiler::{Decompiler, OutlineDecompiler};
pub use crate::file::{ImageProvider, ModuleProvider, ScopedTempCopy, SystemTempAllocator, TempAllocator};
