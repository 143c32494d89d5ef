use clap::Parser;
use curly_compiler::config::RuntimeConfig;
use curly_compiler::directives::{Fetcher, HttpFetcher, StaticFetcher};
use curly_compiler::logging::{self, LogLevel};
use curly_compiler::pipeline::{self, PipelineError, PipelineResult};
use curly_compiler::substitution::SubstitutionData;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "curlyproc")]
#[command(version, about = "Render curly-brace templates with x-url fetch directives")]
struct Args {
    /// Template to render
    template: PathBuf,

    /// JSON substitution data: {"recipient": {...}, "global": {...}}
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Write rendered output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Answer x-url directives from canned JSON responses instead of the network
    #[arg(long)]
    responses: Option<PathBuf>,

    /// Copy {{path}} references verbatim; only directives are evaluated
    #[arg(long)]
    passthrough_references: bool,

    /// Exit non-zero when any error diagnostic was produced
    #[arg(long)]
    strict: bool,

    /// Runtime preferences TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log JSON lines instead of human readable events
    #[arg(long)]
    json_logs: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error[{}]: {}", error.error_code(), error);
            process::exit(1);
        }
    };

    if let Err(message) = logging::config::init_runtime_preferences(config.logging.clone())
        .and_then(|_| logging::init_global_logging())
    {
        logging::safe_log_error(
            logging::codes::system::INITIALIZATION_FAILURE,
            &format!("Failed to initialize logging: {}", message),
        );
        process::exit(1);
    }

    match run(&args, &config) {
        Ok(result) => {
            eprintln!(
                "Rendered {} in {:.2}ms ({} errors, {} warnings, {} fetches)",
                args.template.display(),
                result.elapsed.as_secs_f64() * 1000.0,
                result.error_count(),
                result.warning_count(),
                result.stats.fetches()
            );
            logging::print_cargo_style_summary();

            if args.strict && result.has_errors() {
                process::exit(1);
            }
        }
        Err(error) => {
            logging::safe_log_error(error.error_code(), &error.to_string());
            eprintln!("FAILED: {}", error);
            logging::print_cargo_style_summary();
            process::exit(1);
        }
    }
}

fn load_config(args: &Args) -> Result<RuntimeConfig, PipelineError> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };

    if args.passthrough_references {
        config.render.passthrough_references = true;
    }
    if args.json_logs {
        config.logging.use_structured_logging = true;
    }
    if args.quiet {
        config.logging.min_log_level = LogLevel::Error;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: &RuntimeConfig) -> Result<PipelineResult, PipelineError> {
    let data = match &args.data {
        Some(path) => SubstitutionData::load(path)?,
        None => SubstitutionData::default(),
    };

    let fetcher: Box<dyn Fetcher> = match &args.responses {
        Some(path) => Box::new(StaticFetcher::load(path)?),
        None => Box::new(HttpFetcher::new(&config.fetch)?),
    };

    let result = pipeline::render_file(&args.template, &data, fetcher.as_ref(), config)?;

    match &args.output {
        Some(path) => pipeline::write_output(path, &result.output)?,
        None => print!("{}", result.output),
    }

    Ok(result)
}
