use thiserror::Error;

use crate::model::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// A single in-module type reference that no longer resolves after pruning.
///
/// Produced by the [`crate::pipeline::ConsistencyChecker`] and carried by
/// [`Error::ConsistencyCheckFailed`] so callers can report every offending reference,
/// not just the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Human readable description of the entity holding the reference
    pub referrer: String,
    /// Token of the reference target
    pub target: Token,
    /// Qualified name of the reference target, as far as it is still known
    pub target_name: String,
}

impl std::fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.referrer, self.target_name, self.target
        )
    }
}

/// The generic Error type, which covers every failure this library can return.
///
/// # Error Categories
///
/// ## Input Errors
/// Reported before any pipeline work begins and never retried:
/// - [`Error::InputNotFound`] - The input module does not exist
/// - [`Error::InvalidAccessModifier`] - An access modifier list could not be parsed
/// - [`Error::InvalidOutputPath`] - The output location could not be resolved
///
/// ## Image Errors
/// - [`Error::Malformed`] - Corrupted or invalid module image
/// - [`Error::OutOfBounds`] - Attempted to read beyond the image boundaries
/// - [`Error::NotSupported`] - Unsupported image format or version
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::Serialization`] - The image payload could not be encoded or decoded
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// ## Transient Resource Errors
/// - [`Error::RetriesExhausted`] - Temporary file allocation kept colliding
///
/// ## Structural Errors
/// - [`Error::ConsistencyCheckFailed`] - Pruning left unresolved in-module type references
/// - [`Error::TokenNotFound`] - A token does not address a live entity
///
/// # Examples
///
/// ```rust,no_run
/// use refasm::{Error, ReferenceGenerator, GeneratorConfig};
///
/// let generator = ReferenceGenerator::new(GeneratorConfig::default());
/// match generator.generate("Acme.dll".as_ref(), "ref/Acme.dll".as_ref()) {
///     Ok(summary) => println!("wrote {}", summary.output.display()),
///     Err(Error::ConsistencyCheckFailed { unresolved }) => {
///         for reference in unresolved {
///             eprintln!("unresolved: {reference}");
///         }
///     }
///     Err(e) => eprintln!("error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The image is damaged and could not be parsed.
    ///
    /// Includes the source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the image.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This image type or format version is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// The module payload could not be encoded or decoded.
    #[error("Serialization failed - {0}")]
    Serialization(String),

    /// The input module could not be found.
    #[error("Input module {0} does not exist")]
    InputNotFound(std::path::PathBuf),

    /// An access modifier name is not one of `private`, `protected`, `internal`, `public`.
    #[error("{0} is not a valid access modifier")]
    InvalidAccessModifier(String),

    /// The output location could not be resolved or created.
    #[error("Invalid output location {path}: {reason}")]
    InvalidOutputPath {
        /// The offending path
        path: std::path::PathBuf,
        /// Why the path was rejected
        reason: String,
    },

    /// A bounded retry loop ran out of attempts.
    ///
    /// Raised by temporary file allocation when every attempt collided with an
    /// existing file.
    #[error("{operation} failed after {attempts} attempts")]
    RetriesExhausted {
        /// The operation that was retried
        operation: &'static str,
        /// How many attempts were made
        attempts: usize,
    },

    /// The pruned module still references in-module types that are gone.
    ///
    /// Nothing has been written to the output location when this is returned.
    #[error("Consistency check failed with {} unresolved reference(s)", unresolved.len())]
    ConsistencyCheckFailed {
        /// Every reference that failed to resolve
        unresolved: Vec<UnresolvedReference>,
    },

    /// A token did not address a live entity of the module.
    #[error("Failed to find entity - {0}")]
    TokenNotFound(Token),

    /// The decompiler collaborator failed.
    #[error("Decompilation failed - {0}")]
    Decompile(String),
}
