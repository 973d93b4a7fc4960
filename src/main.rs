//! preflight-dns command-line entry point

use clap::Parser;
use preflight_dns::{
    cli::Cli,
    config::{load_job, EnvManager},
    equiv::equivalent_command,
    error::{AppError, ErrorReporter, Result},
    executor::PreflightRunner,
    logging::Logger,
    models::Job,
    output::VerdictFormatter,
    server, PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    // Loaded before parsing so PREFLIGHT_* fallbacks see .env values
    if let Err(e) = EnvManager::load_env_file() {
        ErrorReporter::new(false, false).report_error(&e);
        process::exit(e.exit_code());
    }

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), false);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    let settings = cli.log_settings();
    let use_color = cli.use_colors();
    let logger = Logger::with_settings(PKG_NAME, settings.clone());
    logger.debug("starting").field("version", VERSION).log();

    for warning in EnvManager::validate_current_env() {
        logger.warn(&warning).log();
    }

    if cli.server {
        return server::serve(cli.server_addr, settings).await;
    }

    let spec = load_job(cli)?;

    if spec.equiv {
        let job = Job::from_spec(&spec)?;
        println!("{}", equivalent_command(&job)?);
        return Ok(());
    }

    let verdict = PreflightRunner::with_settings(settings).run_spec(&spec).await?;
    let formatter = VerdictFormatter::new(use_color);
    logger
        .debug(&formatter.format_statuses(&verdict))
        .field("passed", verdict.passed)
        .log();

    if verdict.passed {
        println!("{}", formatter.format_verdict(&verdict));
    }
    verdict.into_result().map(|_| ())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Validation(_) => {
            eprintln!();
            eprintln!("Usage help:");
            eprintln!("  - Both --endpoint and --new are required");
            eprintln!("  - Headers use --headers key=value,key=value");
            eprintln!("  - Run with --help for every option");
        }
        AppError::DnsResolution(_) => {
            eprintln!();
            eprintln!("DNS resolution help:");
            eprintln!("  - --new must have an IPv4 (A) record, or be an IP literal");
            eprintln!("  - Test resolution manually with 'dig +short A <name>'");
        }
        AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Timeout help:");
            eprintln!("  - Increase the limit with --timeout (e.g. --timeout 15s)");
        }
        _ => {}
    }
}
