//! Output location resolution.

use std::{
    fs,
    path::{Path, PathBuf, MAIN_SEPARATOR},
};

use anyhow::{anyhow, bail, Context};

/// Name of the directory references go to when no output is given
const REF_DIR: &str = "ref";

/// Checks that the input exists before anything else happens.
pub fn check_input(input: &Path) -> anyhow::Result<()> {
    if !input.is_file() {
        bail!("{} does not exist", input.display());
    }
    Ok(())
}

/// Resolves where the reference for `input` is written.
///
/// - no output: `ref/<input name>` next to the input, or `~/ref/<input name>` if that
///   directory cannot be created
/// - an existing directory, or a path ending in a separator: `<dir>/<input name>`
/// - anything else must name a `.dll`; its directory is created
pub fn resolve_output(input: &Path, output: Option<&Path>) -> anyhow::Result<PathBuf> {
    let file_name = input
        .file_name()
        .ok_or_else(|| anyhow!("{} has no file name", input.display()))?;

    let Some(output) = output else {
        let beside = input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(REF_DIR);
        let dir = match fs::create_dir_all(&beside) {
            Ok(()) => beside,
            Err(error) => {
                log::warn!("could not create {}: {error}", beside.display());
                let home = dirs::home_dir()
                    .ok_or_else(|| anyhow!("could not create {}", beside.display()))?
                    .join(REF_DIR);
                fs::create_dir_all(&home)
                    .with_context(|| format!("could not create {}", beside.display()))?;
                home
            }
        };
        return Ok(dir.join(file_name));
    };

    if output.is_dir() {
        return Ok(output.join(file_name));
    }

    let text = output.to_string_lossy();
    if text.ends_with(MAIN_SEPARATOR) || text.ends_with('/') {
        fs::create_dir_all(output)
            .with_context(|| format!("could not create {}", output.display()))?;
        return Ok(output.join(file_name));
    }

    let is_dll = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dll"));
    if !is_dll {
        bail!("{} must be a DLL", output.display());
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    Ok(output.to_path_buf())
}
