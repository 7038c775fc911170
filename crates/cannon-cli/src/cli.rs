use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cannon_capture::CaptureClient;
use cannon_config::{
    BatchConfig, ConfigDocument, defaults, load_document, parse_yes_no, validate, write_template,
};
use cannon_pipeline::{DirectorySource, Scheduler, TracingReporter, UnitReport, UnitWorker};
use cannon_telemetry::{LogFormat, LoggingConfig, Metrics, init_logging};
use clap::Parser;
use tracing::info;
use uuid::Uuid;

use crate::error::{CliError, CliResult};
use crate::output::{render_config_summary, render_run_summary};

/// Parses CLI arguments, runs every pass, and prints the summaries.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("error: failed to initialise logging: {err}");
        return 3;
    }

    match execute(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

#[derive(Parser)]
#[command(
    name = "cannon",
    version,
    about = "Hash samples, look up their Capture API verdicts, and upload the unknown ones"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        alias = "malware_directory",
        env = "CANNON_MALWARE_DIRECTORY",
        help = "Directory holding the samples [default without --conf: malware_files]"
    )]
    malware_directory: Option<PathBuf>,
    #[arg(
        long,
        alias = "capture_api_server",
        env = "CANNON_CAPTURE_API_SERVER",
        help = "Full URL of the Capture API server, e.g. https://capture-api.example.com"
    )]
    capture_api_server: Option<String>,
    #[arg(long, alias = "capture_api_serial", env = "CANNON_CAPTURE_API_SERIAL")]
    capture_api_serial: Option<String>,
    #[arg(
        long,
        alias = "capture_api_key",
        env = "CANNON_CAPTURE_API_KEY",
        hide_env_values = true
    )]
    capture_api_key: Option<String>,
    #[arg(
        long,
        alias = "ignore_verdict",
        env = "CANNON_IGNORE_VERDICT",
        value_name = "yes|no",
        value_parser = parse_switch,
        help = "Upload every sample regardless of its verdict [default without --conf: no]"
    )]
    ignore_verdict: Option<bool>,
    #[arg(
        long,
        alias = "number_of_passes",
        env = "CANNON_NUMBER_OF_PASSES",
        help = "Times to repeat the routine [default without --conf: 1]"
    )]
    number_of_passes: Option<u32>,
    #[arg(
        long,
        alias = "number_of_threads",
        env = "CANNON_NUMBER_OF_THREADS",
        help = "Samples processed simultaneously [default without --conf: 1]"
    )]
    number_of_threads: Option<usize>,
    #[arg(
        long = "timeout",
        env = "CANNON_TIMEOUT_SECS",
        value_name = "SECONDS",
        help = "Per-request timeout [default: 30]"
    )]
    timeout: Option<u64>,
    #[arg(
        long,
        env = "CANNON_VERIFY_CERTS",
        help = "Verify the Capture API server's TLS certificate"
    )]
    verify_certs: bool,
    #[arg(
        long = "conf",
        env = "CANNON_CONFIG",
        value_name = "PATH",
        help = "Read settings from a TOML file; flags override its values"
    )]
    conf: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = defaults::CONFIG_FILE_NAME,
        help = "Write a configuration template and exit"
    )]
    init_config: Option<PathBuf>,
    #[arg(long, env = "CANNON_LOG_FORMAT", value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
    #[arg(
        long,
        env = "CANNON_METRICS_OUT",
        value_name = "PATH",
        help = "Write Prometheus metrics to this file after the run"
    )]
    metrics_out: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigDocument {
        ConfigDocument {
            malware_directory: self.malware_directory.clone(),
            capture_api_server: self.capture_api_server.clone(),
            capture_api_serial: self.capture_api_serial.clone(),
            capture_api_key: self.capture_api_key.clone(),
            ignore_verdict: self.ignore_verdict,
            number_of_passes: self.number_of_passes,
            number_of_threads: self.number_of_threads,
            request_timeout_secs: self.timeout,
            accept_invalid_certs: self.verify_certs.then_some(false),
        }
    }
}

pub(crate) async fn execute(cli: Cli) -> CliResult<()> {
    if let Some(path) = &cli.init_config {
        write_template(path)?;
        println!("wrote configuration template to {}", path.display());
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    let run_id = Uuid::new_v4().to_string();
    println!("{}", render_config_summary(&config, &run_id));

    let (outcomes, metrics) = run_cannon(config, &run_id).await?;
    println!("{}", render_run_summary(&outcomes, &metrics.snapshot()));

    if let Some(path) = &cli.metrics_out {
        let text = metrics.render().map_err(CliError::failure)?;
        fs::write(path, text)
            .with_context(|| format!("failed to write metrics to {}", path.display()))
            .map_err(CliError::failure)?;
    }
    Ok(())
}

/// Flags alone fall back to the classic defaults; with `--conf` the file must
/// supply every required setting the flags leave out.
fn resolve_config(cli: &Cli) -> CliResult<BatchConfig> {
    let base = match &cli.conf {
        Some(path) => load_document(path)?,
        None => flag_defaults(),
    };
    let config = validate(base.layer(cli.overrides()))?;

    if !config.directory.is_dir() {
        return Err(CliError::validation(format!(
            "Malware Directory {} is not a directory",
            config.directory.display()
        )));
    }
    Ok(config)
}

fn flag_defaults() -> ConfigDocument {
    ConfigDocument {
        malware_directory: Some(PathBuf::from(defaults::MALWARE_DIRECTORY)),
        ignore_verdict: Some(false),
        number_of_passes: Some(defaults::NUMBER_OF_PASSES),
        number_of_threads: Some(defaults::FLAG_NUMBER_OF_THREADS),
        ..ConfigDocument::default()
    }
}

pub(crate) async fn run_cannon(
    config: BatchConfig,
    run_id: &str,
) -> CliResult<(Vec<(u32, UnitReport)>, Metrics)> {
    let config = Arc::new(config);
    let client = CaptureClient::from_config(&config, run_id)
        .context("failed to build Capture API client")
        .map_err(CliError::failure)?;
    let metrics = Metrics::new().map_err(CliError::failure)?;

    let worker =
        UnitWorker::new(Arc::new(client), Arc::clone(&config)).with_metrics(metrics.clone());
    let reporter = TracingReporter::new().with_metrics(metrics.clone());
    let scheduler = Scheduler::new(worker, Arc::new(reporter));

    info!(
        run_id,
        passes = config.pass_count,
        threads = config.concurrency,
        "starting capture cannon"
    );
    let outcomes = scheduler
        .run_passes(Arc::new(DirectorySource::new(config.directory.clone())))
        .await;
    Ok((outcomes, metrics))
}

fn parse_switch(input: &str) -> Result<bool, String> {
    parse_yes_no(input).map_err(|err| err.to_string())
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse()
}
