//! mockdir CLI
//!
//! Usage:
//!   mockdir serve <directory> [--host <host>] [--port <port>] [--config <file>]
//!   mockdir test <directory> [--only <index>] [--show-response] [--fail-fast] [--url <base>]
//!   mockdir dump <directory>

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use mockdir::scripting::ScriptRuntime;
use mockdir::server::{MockServer, ServerState};
use mockdir::testing::{TestResponse, TestRunSummary, TestRunner};
use mockdir::{has_test_suite, load_test_suite, EndpointCollection, ResponseLog, ServerConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Directory-configured HTTP mock server
#[derive(Parser, Debug)]
#[command(name = "mockdir", author, version, about)]
struct Cli {
    /// Log filter (e.g. `info`, `mockdir=debug`); defaults to RUST_LOG, then `info`
    #[arg(long, global = true, env = "MOCKDIR_LOG_LEVEL")]
    log_level: Option<String>,

    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the endpoints of a configuration directory
    Serve {
        directory: PathBuf,

        /// Listen host, overrides the settings file
        #[arg(long, env = "MOCKDIR_HOST")]
        host: Option<String>,

        /// Listen port, overrides the settings file
        #[arg(short, long, env = "MOCKDIR_PORT")]
        port: Option<u16>,

        /// YAML settings file
        #[arg(short, long, env = "MOCKDIR_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Run the test suite of a configuration directory
    Test {
        directory: PathBuf,

        /// Run only the test at this position
        #[arg(long)]
        only: Option<usize>,

        /// Print what each test's request currently returns
        #[arg(long)]
        show_response: bool,

        /// Abort on the first execution fault instead of recording it
        #[arg(long)]
        fail_fast: bool,

        /// Run against a live server at this base URL instead of in-process
        #[arg(long)]
        url: Option<String>,
    },

    /// Print every endpoint and its rules
    Dump { directory: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref(), cli.log_format);

    match cli.command {
        Command::Serve {
            directory,
            host,
            port,
            config,
        } => serve(directory, host, port, config).await,
        Command::Test {
            directory,
            only,
            show_response,
            fail_fast,
            url,
        } => {
            let options = TestOptions {
                only,
                show_response,
                handle_errors: !fail_fast,
                url,
            };
            if !run_tests(&directory, &options).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Dump { directory } => dump(&directory),
    }
}

fn init_tracing(level: Option<&str>, format: LogFormat) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn serve(
    directory: PathBuf,
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(host) = host {
        config.listen.host = host;
    }
    if let Some(port) = port {
        config.listen.port = port;
    }
    config.validate()?;

    let scripts = ScriptRuntime::shared(&config.scripting);
    let responses = Arc::new(ResponseLog::new(config.response_log.capacity));
    let state = ServerState::load(&directory, scripts, responses)
        .with_context(|| format!("loading endpoints from {}", directory.display()))?;

    let listener = TcpListener::bind((config.listen.host.as_str(), config.listen.port))
        .await
        .with_context(|| format!("binding {}:{}", config.listen.host, config.listen.port))?;
    let server = MockServer::from_listener(listener, Arc::new(state));

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}

struct TestOptions {
    only: Option<usize>,
    show_response: bool,
    handle_errors: bool,
    url: Option<String>,
}

/// Returns whether every executed case passed.
async fn run_tests(directory: &Path, options: &TestOptions) -> anyhow::Result<bool> {
    println!("{BOLD}{CYAN}mockdir test runner{RESET}");
    println!("{DIM}{RULE}{RESET}");

    if !has_test_suite(directory) {
        bail!("{} has no test suite (expected tests/tests.json)", directory.display());
    }
    let mut cases = load_test_suite(directory)?;
    println!("{DIM}Suite:{RESET} {CYAN}{}{RESET}", directory.display());

    if let Some(index) = options.only {
        if index >= cases.len() {
            bail!("no test at position {index}, suite has {} tests", cases.len());
        }
        cases = vec![cases.swap_remove(index)];
    }
    let offset = options.only.unwrap_or(0);
    let runner = TestRunner::new(cases);

    let summary = match &options.url {
        Some(url) => {
            println!("{DIM}Target:{RESET} {CYAN}{url}{RESET}\n");
            let client = reqwest::Client::new();
            runner.run_remote(&client, url, options.handle_errors).await?
        }
        None => {
            println!();
            let collection = EndpointCollection::read_from_directory(directory)?;
            if options.show_response {
                print_responses(&runner, &collection, offset);
            }
            runner.run(&collection, options.handle_errors)?
        }
    };

    print_summary(&summary, offset);
    Ok(summary.all_ok())
}

fn print_responses(runner: &TestRunner, collection: &EndpointCollection, offset: usize) {
    for (index, case) in runner.cases().iter().enumerate() {
        println!("{BOLD}{}{RESET} {}", index + offset, case.name);
        match case.get_response(collection) {
            Ok(TestResponse::Body(body)) => println!("{body}"),
            Ok(TestResponse::RoutingMiss(message)) => println!("{YELLOW}{message}{RESET}"),
            Err(e) => println!("{RED}{}{RESET}", mockdir::response::error_chain(&e)),
        }
        println!("{DIM}{RULE}{RESET}");
    }
}

fn print_summary(summary: &TestRunSummary, offset: usize) {
    for (index, result) in &summary.results {
        let color = if result.is_ok() {
            GREEN
        } else if result.is_error() {
            YELLOW
        } else {
            RED
        };
        println!(
            "{:>3} {} ... {color}{}{RESET}",
            index + offset,
            result.name,
            result.render()
        );
    }

    println!("{DIM}{RULE}{RESET}");
    println!(
        "{BOLD}{}{RESET} tests: {GREEN}{} OK{RESET}, {RED}{} Fail{RESET}, {YELLOW}{} Error{RESET}",
        summary.results.len(),
        summary.passed(),
        summary.failed(),
        summary.errors()
    );
}

fn dump(directory: &Path) -> anyhow::Result<()> {
    let collection = EndpointCollection::read_from_directory(directory)
        .with_context(|| format!("loading endpoints from {}", directory.display()))?;

    println!("{BOLD}{CYAN}mockdir endpoints{RESET}");
    println!("{DIM}{RULE}{RESET}");
    for endpoint in collection.endpoints() {
        println!(
            "{BOLD}{}{RESET}  {DIM}{}{RESET}",
            endpoint.name(),
            endpoint.path_pattern()
        );
        println!("  {DIM}{}{RESET}", endpoint.directory().display());
        for (index, rule) in endpoint.rules().iter().enumerate() {
            println!(
                "  {index}: {} {DIM}->{RESET} {} {DIM}({}){RESET}",
                rule.matcher,
                rule.creator,
                rule.creator.content_type()
            );
        }
    }
    if collection.is_empty() {
        println!("{YELLOW}Warning:{RESET} no endpoints found in {}", directory.display());
    }
    Ok(())
}
