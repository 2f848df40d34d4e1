use anyhow::{Context, Result};
use clap::Parser;
use contraste::cli::Cli;
use contraste::input;
use contraste::report::{analyze, AnalysisSources, Provenance};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = cli.analysis_config();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // The results artifact is mandatory; the auxiliaries degrade to
    // skipped tests when missing or unreadable.
    let results = input::load_results(&cli.results)
        .with_context(|| format!("cannot analyze {}", cli.results.display()))?;

    let mut provenance = Provenance::new(&cli.results);

    let baseline = cli.baseline.as_ref().and_then(|path| {
        match input::load_baseline(path) {
            Ok(artifact) => {
                provenance.baseline = Some(path.display().to_string());
                Some(artifact)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "baseline unavailable");
                None
            }
        }
    });
    let cross_validation = cli.cross_validation.as_ref().and_then(|path| {
        match input::load_value(path) {
            Ok(value) => {
                provenance.cross_validation = Some(path.display().to_string());
                Some(value)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cross-validation unavailable");
                None
            }
        }
    });
    let ablation = cli.ablation.as_ref().and_then(|path| {
        match input::load_ablation(path) {
            Ok(artifact) => {
                provenance.ablation = Some(path.display().to_string());
                Some(artifact)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ablation unavailable");
                None
            }
        }
    });

    let sources = AnalysisSources {
        results: Some(&results),
        baseline: baseline.as_ref(),
        cross_validation: cross_validation.as_ref(),
        ablation: ablation.as_ref(),
    };
    let report = analyze(&sources, &config, provenance)?;

    print!("{}", report.render_text());

    if !cli.no_artifact {
        let output = cli.output_path();
        report.write_json(&output)?;
        println!();
        println!("report: {}", output.display());
    }
    Ok(())
}
