use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use refasm::{
    visibility::{AccessModifiers, FoldPolicy},
    GeneratorConfig,
};

/// refasm - generate reference assemblies from compiled .NET modules
#[derive(Debug, Parser)]
#[command(name = "refasm", version, about, long_about = None)]
pub struct Cli {
    /// Path to the input module.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file or directory. Defaults to `ref/<input name>` next to the input.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Access modifiers to keep, `+`-separated: private, protected, internal, public.
    #[arg(
        short = 'm',
        long = "access-modifiers",
        value_name = "LIST",
        default_value = "protected+internal+public"
    )]
    pub modifiers: AccessModifiers,

    /// How `protected internal` and `private protected` members are classified.
    #[arg(long, value_enum, default_value_t = Fold::Split)]
    pub fold: Fold,

    /// Emit the reference as a class library without entry point.
    #[arg(long)]
    pub library: bool,

    /// Keep embedded resources.
    #[arg(long)]
    pub keep_resources: bool,

    /// Keep versioning, title and similar assembly attributes.
    #[arg(long)]
    pub keep_common_attributes: bool,

    /// Keep the input's module version id instead of deriving one from the output.
    #[arg(long)]
    pub keep_mvid: bool,

    /// Fail when a member reference is left pointing at a removed member.
    #[arg(long)]
    pub strict: bool,

    /// Write declaration outlines of the reference into this directory.
    #[arg(long, value_name = "DIR")]
    pub outline: Option<PathBuf>,

    /// Emit the summary as JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Classification of the combined protected/internal access levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Fold {
    /// `protected internal` is protected, `private protected` is internal.
    Split,
    /// Both are protected.
    Protected,
    /// Both are internal.
    Internal,
}

impl From<Fold> for FoldPolicy {
    fn from(fold: Fold) -> Self {
        match fold {
            Fold::Split => FoldPolicy::Split,
            Fold::Protected => FoldPolicy::Protected,
            Fold::Internal => FoldPolicy::Internal,
        }
    }
}

impl Cli {
    /// The generator configuration these options describe.
    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            modifiers: self.modifiers,
            fold_policy: self.fold.into(),
            strip_bodies: true,
            remove_resources: !self.keep_resources,
            remove_common_attributes: !self.keep_common_attributes,
            convert_to_library: self.library,
            fail_on_dangling_references: self.strict,
            deterministic_mvid: !self.keep_mvid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_library() {
        let cli = Cli::try_parse_from(["refasm", "Acme.dll"]).unwrap();
        assert_eq!(cli.config(), GeneratorConfig::default());
        assert!(cli.output.is_none());
    }

    #[test]
    fn modifiers_are_parsed_case_insensitively() {
        let cli = Cli::try_parse_from(["refasm", "Acme.dll", "-m", "Public+PROTECTED"]).unwrap();
        assert_eq!(
            cli.modifiers,
            AccessModifiers::PUBLIC | AccessModifiers::PROTECTED
        );
    }

    #[test]
    fn unknown_modifier_is_rejected() {
        let result = Cli::try_parse_from(["refasm", "Acme.dll", "-m", "public+friend"]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "refasm",
            "Tool.exe",
            "--library",
            "--keep-resources",
            "--strict",
            "--fold",
            "internal",
        ])
        .unwrap();
        let config = cli.config();
        assert!(config.convert_to_library);
        assert!(!config.remove_resources);
        assert!(config.fail_on_dangling_references);
        assert_eq!(config.fold_policy, FoldPolicy::Internal);
    }
}
