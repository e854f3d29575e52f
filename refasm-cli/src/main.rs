mod app;
mod output;
mod paths;

use clap::Parser;
use refasm::{decompiler::OutlineDecompiler, file::ImageProvider, Error, ReferenceGenerator};

use crate::{app::Cli, output::Report};

fn main() -> anyhow::Result<()> {
    if let Err(error) = ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    }) {
        eprintln!("could not install Ctrl+C handler: {error}");
    }

    let cli = Cli::parse();

    // refasm info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.json {
        let level = if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("refasm", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    paths::check_input(&cli.input)?;
    let output = paths::resolve_output(&cli.input, cli.output.as_deref())?;

    let mut generator = ReferenceGenerator::new(cli.config());
    if let Some(dir) = &cli.outline {
        generator = generator.with_decompiler(OutlineDecompiler::new(ImageProvider), dir);
    }

    let summary = match generator.generate(&cli.input, &output) {
        Ok(summary) => summary,
        Err(Error::ConsistencyCheckFailed { unresolved }) => {
            for reference in &unresolved {
                eprintln!("unresolved: {reference}");
            }
            anyhow::bail!(
                "{} unresolved reference(s), nothing was written",
                unresolved.len()
            );
        }
        Err(error) => return Err(error.into()),
    };

    let report = Report::new(&cli.input, cli.modifiers.to_string(), &summary);
    output::print_output(&report, cli.json, Report::print)
}
