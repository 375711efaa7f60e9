use anyhow::{Context, Result};
use clap::Parser;
use spikewatch::cli::{Cli, OutputFormat};
use spikewatch::config::{FileConfig, RunConfig};
use spikewatch::csv_output::CsvOutput;
use spikewatch::generators::SignalGenerator;
use spikewatch::html_output::HtmlOutput;
use spikewatch::json_output::JsonOutput;
use spikewatch::session::Session;
use spikewatch::text_output;
use std::fs;
use std::ops::ControlFlow;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Stream the configured signal and print the report
fn run_replay(config: &RunConfig, format: OutputFormat) -> Result<Session> {
    let generator = SignalGenerator::new(config.generator, config.seed)?;
    let mut session = Session::new(config.session);

    info!(
        generator = %config.generator.kind,
        method = %config.session.params.method(),
        points = config.points,
        "starting replay"
    );

    session.run(generator, config.points, config.delay, |record| {
        if format == OutputFormat::Text && record.is_anomaly {
            eprintln!("{}", text_output::format_alert(record));
        }
        ControlFlow::Continue(())
    });

    match format {
        OutputFormat::Text => {
            print!(
                "{}",
                text_output::format_summary(&session, config.generator.kind.label())
            );
        }
        OutputFormat::Json => {
            let output = JsonOutput::from_session(&session, config.generator);
            println!("{}", output.to_json()?);
        }
        OutputFormat::Csv => {
            print!("{}", CsvOutput::from_session(&session, true).to_csv());
        }
    }

    Ok(session)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let file = match &args.config {
        Some(path) => Some(FileConfig::from_file(path)?),
        None => None,
    };
    let config = RunConfig::resolve(&args.overrides(), file.as_ref())?;

    let session = run_replay(&config, args.format)?;

    if let Some(path) = &args.html {
        let report = HtmlOutput::from_session(&session, config.generator.kind.label());
        fs::write(path, report.to_html())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}
