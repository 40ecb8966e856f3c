//! dashboard-e2e: bounded waits from the shell
//!
//! ## Usage
//!
//! ```bash
//! dashboard-e2e wait-for --until-contains Running -- oc get pods -l app=che
//! dashboard-e2e wait-absent --contains ws-1 --attempts 30 -- kubectl get pods
//! dashboard-e2e config --format json
//! ```
//!
//! Exit codes: 0 on success, 2 when a wait times out, 1 on any other error.

use clap::Parser;
use dashboard_e2e::{ShellExecutor, SystemClock, TestConfig};
use dashboard_e2e_cli::{
    load_test_config, logging, wait, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands,
    ConfigArgs, ConfigFormat, OutputMatcher, ProgressReporter, Verbosity, WaitAbsentArgs,
    WaitForArgs,
};
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(config.verbosity, cli.log_json);

    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    match run(cli, &mut reporter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.finish();
            reporter.failure(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

fn run(cli: Cli, reporter: &mut ProgressReporter) -> CliResult<()> {
    let test_config = load_test_config(cli.config.as_deref())?;
    if let Some(ref path) = cli.config {
        reporter.info(&format!("Using configuration from {}", path.display()));
    }
    match cli.command {
        Commands::WaitFor(args) => run_wait_for(&test_config, &args, reporter),
        Commands::WaitAbsent(args) => run_wait_absent(&test_config, &args, reporter),
        Commands::Config(args) => run_config(&test_config, &args),
    }
}

fn run_wait_for(
    config: &TestConfig,
    args: &WaitForArgs,
    reporter: &mut ProgressReporter,
) -> CliResult<()> {
    let matcher =
        OutputMatcher::from_flags(args.until_contains.as_deref(), args.until_matches.as_deref())?;
    let descriptor = wait::descriptor(
        &args.timing,
        config,
        format!("{matcher} from `{}`", args.command.join(" ")),
    );
    tracing::info!(
        timeout_ms = descriptor.timeout.as_millis() as u64,
        interval_ms = descriptor.interval.as_millis() as u64,
        "waiting for {}",
        descriptor.label()
    );

    reporter.start_spinner(&format!("Waiting for {}", descriptor.label()));
    let result = wait::wait_for_output(
        &ShellExecutor::new(),
        &SystemClock::new(),
        &args.command,
        &matcher,
        &descriptor,
    );
    reporter.finish();

    let output = result?;
    std::io::stdout().write_all(output.stdout.as_bytes())?;
    reporter.success(descriptor.label());
    Ok(())
}

fn run_wait_absent(
    config: &TestConfig,
    args: &WaitAbsentArgs,
    reporter: &mut ProgressReporter,
) -> CliResult<()> {
    let matcher = OutputMatcher::from_flags(args.contains.as_deref(), args.matches.as_deref())?;
    let descriptor = wait::descriptor(
        &args.timing,
        config,
        format!("{matcher} to disappear from `{}`", args.command.join(" ")),
    );

    reporter.start_spinner(&format!("Waiting for {}", descriptor.label()));
    let result = wait::wait_for_absence(
        &ShellExecutor::new(),
        &SystemClock::new(),
        &args.command,
        &matcher,
        &descriptor,
    );
    reporter.finish();

    result?;
    reporter.success(descriptor.label());
    Ok(())
}

fn run_config(config: &TestConfig, args: &ConfigArgs) -> CliResult<()> {
    let rendered = match args.format {
        ConfigFormat::Yaml => {
            serde_yaml_ng::to_string(config).map_err(|e| CliError::render(e.to_string()))?
        }
        ConfigFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(config).map_err(|e| CliError::render(e.to_string()))?;
            json.push('\n');
            json
        }
    };
    std::io::stdout().write_all(rendered.as_bytes())?;
    Ok(())
}
