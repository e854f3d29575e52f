//! Reading and writing module images, and the temporary copies generation works on.
//!
//! - [`ModuleProvider`] abstracts how a [`Module`] is loaded and written;
//!   [`ImageProvider`] implements it for `RFAM` images.
//! - [`ScopedTempCopy`] copies the input to a fresh temporary file with bounded retries,
//!   so the input is never modified and the output is only ever replaced whole.
//! - [`io`] holds the bounds-checked header helpers, [`Physical`] the memory mapping.

pub mod image;
pub mod io;
mod physical;
mod temp;

use std::path::Path;

pub use image::ImageProvider;
pub use physical::Physical;
pub use temp::{ScopedTempCopy, SystemTempAllocator, TempAllocator, TEMP_COPY_ATTEMPTS};

use crate::{model::Module, Result};

/// Loads modules from and writes modules to disk
pub trait ModuleProvider {
    /// Loads the module at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid module image.
    fn load(&self, path: &Path) -> Result<Module>;

    /// Writes `module` to `path`, replacing its contents.
    ///
    /// # Errors
    /// Returns an error if the module cannot be encoded or the file cannot be written.
    fn write(&self, module: &Module, path: &Path) -> Result<()>;
}
