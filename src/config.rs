//! Generator configuration
//!
//! [`GeneratorConfig`] selects the surface that survives and toggles the passes that are
//! not strictly about visibility.

use crate::visibility::{AccessModifiers, FoldPolicy, VisibilityClassifier};

/// Configuration for one reference generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct GeneratorConfig {
    /// Accessibility classes to retain (default: protected, internal, public)
    pub modifiers: AccessModifiers,

    /// How `protected internal` and `private protected` are classified
    pub fold_policy: FoldPolicy,

    /// Replace every method body with a throw stub
    pub strip_bodies: bool,

    /// Drop embedded manifest resources
    pub remove_resources: bool,

    /// Drop versioning, title, product and similar assembly-level attributes
    pub remove_common_attributes: bool,

    /// Emit the result as a class library without entry point
    pub convert_to_library: bool,

    /// Abort when a member reference is left pointing at a removed member.
    /// Unresolved type references always abort.
    pub fail_on_dangling_references: bool,

    /// Derive the module version id from the output content instead of keeping the input's
    pub deterministic_mvid: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            modifiers: AccessModifiers::default(),
            fold_policy: FoldPolicy::Split,
            strip_bodies: true,
            remove_resources: true,
            remove_common_attributes: true,
            convert_to_library: false,
            fail_on_dangling_references: false,
            deterministic_mvid: true,
        }
    }
}

impl GeneratorConfig {
    /// Creates a configuration that keeps only the public surface
    #[must_use]
    pub fn public_only() -> Self {
        Self {
            modifiers: AccessModifiers::PUBLIC,
            ..Self::default()
        }
    }

    /// Creates a configuration that keeps every declared entity; only bodies, initial
    /// values, resources and common attributes go
    #[must_use]
    pub fn full_surface() -> Self {
        Self {
            modifiers: AccessModifiers::all(),
            ..Self::default()
        }
    }

    /// Replaces the access modifier mask
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: AccessModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// The classifier matching this configuration
    #[must_use]
    pub fn classifier(&self) -> VisibilityClassifier {
        VisibilityClassifier::new(self.modifiers, self.fold_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(
            GeneratorConfig::default().modifiers,
            AccessModifiers::PROTECTED | AccessModifiers::INTERNAL | AccessModifiers::PUBLIC
        );
        assert_eq!(GeneratorConfig::public_only().modifiers, AccessModifiers::PUBLIC);
        assert_eq!(GeneratorConfig::full_surface().modifiers, AccessModifiers::all());
        assert!(!GeneratorConfig::default().convert_to_library);
        assert!(GeneratorConfig::default().strip_bodies);
    }

    #[test]
    fn with_modifiers_keeps_other_settings() {
        let config = GeneratorConfig {
            convert_to_library: true,
            ..GeneratorConfig::default()
        }
        .with_modifiers(AccessModifiers::PRIVATE);
        assert!(config.convert_to_library);
        assert_eq!(config.classifier().mask(), AccessModifiers::PRIVATE);
    }
}
