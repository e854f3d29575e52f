//! End-to-end reference generation: input file in, reference image out.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{error, info, warn};

use crate::{
    config::GeneratorConfig,
    decompiler::Decompiler,
    file::{image, ImageProvider, ModuleProvider, ScopedTempCopy, SystemTempAllocator, TempAllocator},
    model::{ModuleFlags, ModuleKind},
    pipeline::{Pipeline, PipelineState, PipelineStats},
    Error, Result,
};

const TARGET: &str = "refasm::generator";

/// What a successful generation produced
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    /// Where the reference image was written
    pub output: PathBuf,
    /// What the pipeline changed
    pub stats: PipelineStats,
    /// Warnings recorded during the run
    pub warnings: Vec<String>,
    /// Module version id of the written image
    pub mvid: uguid::Guid,
    /// Outline files, if a decompiler ran and succeeded
    pub outlines: Vec<PathBuf>,
}

/// Produces reference images.
///
/// The input is never modified: the module is loaded from a temporary copy, the reduced
/// module is written over that copy, and the copy is then moved to the output location.
/// Nothing reaches the output location if the consistency check fails.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use refasm::{GeneratorConfig, ReferenceGenerator};
///
/// let summary = ReferenceGenerator::new(GeneratorConfig::public_only())
///     .generate(Path::new("Acme.dll"), Path::new("ref/Acme.dll"))?;
/// println!("{}: {}", summary.output.display(), summary.stats);
/// # Ok::<(), refasm::Error>(())
/// ```
pub struct ReferenceGenerator {
    config: GeneratorConfig,
    provider: Box<dyn ModuleProvider>,
    allocator: Box<dyn TempAllocator>,
    decompiler: Option<(Box<dyn Decompiler>, PathBuf)>,
}

impl ReferenceGenerator {
    /// Creates a generator reading and writing `RFAM` images through the system temp
    /// directory
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        ReferenceGenerator {
            config,
            provider: Box::new(ImageProvider),
            allocator: Box::new(SystemTempAllocator::default()),
            decompiler: None,
        }
    }

    /// Replaces the module provider
    #[must_use]
    pub fn with_provider(mut self, provider: impl ModuleProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Replaces the temporary file allocator
    #[must_use]
    pub fn with_temp_allocator(mut self, allocator: impl TempAllocator + 'static) -> Self {
        self.allocator = Box::new(allocator);
        self
    }

    /// Runs `decompiler` on every committed image, writing into `output_dir`
    #[must_use]
    pub fn with_decompiler(
        mut self,
        decompiler: impl Decompiler + 'static,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        self.decompiler = Some((Box::new(decompiler), output_dir.into()));
        self
    }

    /// The configuration in use
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates the reference image of `input` at `output`.
    ///
    /// # Errors
    /// - [`Error::InputNotFound`] before any work if `input` is not a file
    /// - [`Error::RetriesExhausted`] if no temporary copy could be allocated
    /// - [`Error::ConsistencyCheckFailed`] if pruning left unresolved type references;
    ///   `output` is untouched
    /// - image and I/O errors from loading and writing
    pub fn generate(&self, input: &Path, output: &Path) -> Result<GenerationSummary> {
        if !input.is_file() {
            return Err(Error::InputNotFound(input.to_path_buf()));
        }
        if output.is_dir() {
            return Err(Error::InvalidOutputPath {
                path: output.to_path_buf(),
                reason: "is a directory".to_string(),
            });
        }

        let copy = ScopedTempCopy::create(input, self.allocator.as_ref())?;
        let mut module = self.provider.load(copy.path())?;
        info!(
            target: TARGET,
            "generating reference for {} ({} types)",
            input.display(),
            module.type_defs.len()
        );

        if self.config.convert_to_library && module.kind != ModuleKind::Dll {
            info!(target: TARGET, "converting {} to a library", module.name);
            module.kind = ModuleKind::Dll;
            module.entry_point = None;
        }

        let mut run = Pipeline::new(self.config).run(module)?;
        if run.state() == PipelineState::Aborted {
            for reference in &run.report().unresolved {
                error!(target: TARGET, "unresolved reference {reference}");
            }
        }
        let stats = run.stats();
        let warnings: Vec<String> = run.events().warnings().map(|e| e.message.clone()).collect();

        let module = run.commit()?;
        module.flags = ModuleFlags::IL_ONLY.bits();
        let mvid = if self.config.deterministic_mvid {
            image::stamp_mvid(module)?
        } else {
            module.mvid()
        };

        self.provider.write(module, copy.path())?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| Error::InvalidOutputPath {
                path: output.to_path_buf(),
                reason: error.to_string(),
            })?;
        }
        let output = copy.persist(output)?;
        info!(target: TARGET, "wrote {} ({stats})", output.display());

        let outlines = match &self.decompiler {
            Some((decompiler, dir)) => match decompiler.decompile(&output, dir) {
                Ok(files) => files,
                Err(error) => {
                    warn!(target: TARGET, "decompiling {} failed: {error}", output.display());
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(GenerationSummary {
            output,
            stats,
            warnings,
            mvid,
            outlines,
        })
    }
}
