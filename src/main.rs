use anyhow::{Context, Result};
use clap::Parser;
use seedrun::cli::{Cli, Commands, OutputFormat};
use seedrun::comparison::compare;
use seedrun::config::{batch_seeds, HarnessConfig, POOL_SIZE, SEED_RANGE};
use seedrun::html_output::HtmlOutput;
use seedrun::json_output::JsonOutput;
use seedrun::runner::{CommandTemplate, TrialRunner};
use seedrun::store::{JsonRunStore, RunAttrs, RunHandle, RunStore};
use seedrun::text_output::render_text;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
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

fn load_config(args: &Cli) -> Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_file(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(dir) = &args.store_dir {
        config.store_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Run every seed and record results as they complete
fn run_batch(store: &JsonRunStore, config: &HarnessConfig, argv: &[String]) -> Result<()> {
    let template = CommandTemplate::from_argv(argv).context("Missing candidate command")?;
    let runner = TrialRunner::new(template, POOL_SIZE);

    let started = unix_now();

    let mut attrs = RunAttrs::new();
    attrs.insert("command".to_string(), Value::from(runner.command().display()));
    attrs.insert(
        "seeds".to_string(),
        Value::from(format!("{}..{}", SEED_RANGE.start, SEED_RANGE.end)),
    );
    attrs.insert("pool_size".to_string(), Value::from(POOL_SIZE));
    attrs.insert("started_at".to_string(), Value::from(started));
    for (key, value) in &config.labels {
        attrs.insert(key.clone(), Value::from(value.as_str()));
    }

    let mut run = store.create_run(attrs)?;
    eprintln!("Recording run {}", run.id());

    let outcome = runner.run_batch_with(&batch_seeds(), |result| {
        println!("{} {}", result.seed, result.score);
        run.add_result(result.clone());
        run.save()
    });

    // Results saved so far stay in the run either way
    run.set_attr("finished_at", unix_now());
    run.set_attr("status", if outcome.is_ok() { "complete" } else { "failed" });
    run.save()?;
    outcome?;

    eprintln!(
        "Recorded {} results in run {}",
        run.run().results.len(),
        run.id()
    );
    Ok(())
}

fn list_runs(store: &JsonRunStore) -> Result<()> {
    let runs = store.list_runs()?;
    if runs.is_empty() {
        eprintln!("No runs in {}", store.dir().display());
        return Ok(());
    }

    for run in runs {
        let score = run
            .mean_score
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "--".to_string());
        let command = run
            .attrs
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or("");
        println!("{}  {:>4} results  mean {}  {}", run.id, run.result_count, score, command);
    }
    Ok(())
}

fn compare_runs(
    store: &JsonRunStore,
    run_id: &str,
    baseline_id: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let run = store.get_run(run_id)?;
    let baseline_results = match baseline_id {
        Some(id) => store.get_run(id)?.results,
        None => Vec::new(),
    };

    let report = compare(&run.results, &baseline_results);

    let output = match format {
        OutputFormat::Html => HtmlOutput::new(&run.id, baseline_id, &run.attrs).to_html(&report),
        OutputFormat::Text => render_text(&report),
        OutputFormat::Json => JsonOutput::new(&run.id, baseline_id, &report)
            .to_json()
            .context("Failed to serialize report")?,
    };
    print!("{}", output);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(&args)?;
    let store = JsonRunStore::open(&config.store_dir)
        .with_context(|| format!("Failed to open run store {}", config.store_dir.display()))?;

    match &args.command {
        Commands::Run { command } => run_batch(&store, &config, command),
        Commands::List => list_runs(&store),
        Commands::Compare {
            run_id,
            baseline,
            format,
        } => compare_runs(&store, run_id, baseline.as_deref(), *format),
    }
}
