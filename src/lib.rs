// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # refasm
//!
//! Reference assembly generation for .NET modules. `refasm` derives a "reference" module
//! from a compiled one: a structurally valid copy that exposes only a chosen visibility
//! surface and contains no implementation.
//!
//! ## What happens to a module
//!
//! 1. Every method body becomes `throw new NotImplementedException()`. Constructors keep
//!    a call into their base type where the base has no accessible parameterless one.
//! 2. Types, nested types, methods, fields and properties outside the selected access
//!    modifiers are removed. Base types and interfaces that would leak hidden types are
//!    re-rooted or dropped.
//! 3. Attributes naming hidden types, field initial data, embedded resources and
//!    build-describing assembly attributes are removed.
//! 4. A consistency check verifies that every reference to a type of this module still
//!    resolves. Only then is the result written.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use refasm::prelude::*;
//! use std::path::Path;
//!
//! let config = GeneratorConfig::default().with_modifiers("public+protected".parse()?);
//! let summary = ReferenceGenerator::new(config)
//!     .generate(Path::new("Acme.dll"), Path::new("ref/Acme.dll"))?;
//! println!("{}", summary.stats);
//! # Ok::<(), refasm::Error>(())
//! ```
//!
//! ## Working on a module directly
//!
//! ```rust
//! use refasm::prelude::*;
//!
//! let mut builder = ModuleBuilder::library("Acme");
//! let widget = builder.class("Acme", "Widget", TypeAttributes::PUBLIC);
//! builder.method(widget, "Run", MethodAccessFlags::PUBLIC.bits());
//! builder.method(widget, "Helper", MethodAccessFlags::PRIVATE.bits());
//!
//! let mut run = Pipeline::new(GeneratorConfig::default()).run(builder.build())?;
//! let module = run.commit()?;
//! assert_eq!(module.type_defs.get(widget).map(|t| t.methods.len()), Some(1));
//! # Ok::<(), refasm::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`model`] - arena model of a module, addressed by [`model::Token`]s
//! - [`visibility`] - accessibility classification and the access modifier mask
//! - [`pipeline`] - the passes, the consistency check and the driver
//! - [`file`] - image loading and writing, temporary copies
//! - [`decompiler`] - declaration outlines of written images
//! - [`ReferenceGenerator`] - everything above, from input file to output file
//! - [`Error`] and [`Result`] - error handling

#[macro_use]
pub(crate) mod error;

mod config;
pub mod decompiler;
pub mod file;
mod generator;
pub mod model;
pub mod pipeline;
pub mod prelude;
pub mod visibility;

pub use config::GeneratorConfig;
pub use error::{Error, UnresolvedReference};
pub use generator::{GenerationSummary, ReferenceGenerator};

/// `refasm` Result type
pub type Result<T> = std::result::Result<T, Error>;
