use anyhow::{Context, Result};
use bddrun_auth::resolve_auth;
use bddrun_config::{BddrunConfig, RendererKind, load_or_default};
use bddrun_engine::{ClassificationPipeline, ExecutionEngine, extract_plan};
use bddrun_extract::Extractor;
use bddrun_http::{DEFAULT_USER_AGENT, ReqwestTransport};
use bddrun_logging::{LogFormat, LogLevel, Logger};
use bddrun_ports::ReportRenderer;
use bddrun_render_json::{JsonRenderer, write_report_json};
use bddrun_render_md::MarkdownRenderer;
use bddrun_schema::execution::RunOutcome;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "bddrun", version)]
#[command(about = "Classify generated Gherkin scenarios and run them against an HTTP API.", long_about = None)]
struct Cli {
    /// YAML or JSON config file.
    #[arg(long, global = true, env = "BDDRUN_CONFIG")]
    config: Option<PathBuf>,
    /// Workspace root (overrides the config).
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,
    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log line format on stderr (overrides the config).
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild bdd_tests/functional and bdd_tests/non_functional.
    Classify {
        /// Feature text file, `-` for stdin.
        input: PathBuf,
    },
    /// Save normalized features to bdd_tests/ and print them.
    Save {
        /// Feature text file, `-` for stdin.
        input: PathBuf,
    },
    /// Show the request and status rules found in each scenario.
    Extract {
        /// Feature text file, `-` for stdin.
        input: PathBuf,
    },
    /// Execute every scenario against the API.
    Run {
        /// Feature text file, `-` for stdin.
        input: PathBuf,
        /// Directory holding the API description (default: <workspace>/output).
        #[arg(long)]
        openapi_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        renderer: Option<RendererArg>,
        /// Scenarios executed at once.
        #[arg(long)]
        concurrency: Option<usize>,
        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Write the execution output here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the execution output to bdd_tests/execution.report.{json,md}.
        #[arg(long, conflicts_with = "out")]
        save: bool,
        /// Exit with status 2 when a scenario fails.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RendererArg {
    Json,
    Markdown,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormatArg {
    Plain,
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Plain => LogFormat::Plain,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

impl From<RendererArg> for RendererKind {
    fn from(arg: RendererArg) -> Self {
        match arg {
            RendererArg::Json => RendererKind::Json,
            RendererArg::Markdown => RendererKind::Markdown,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(workspace) = cli.workspace {
        config.workspace = workspace;
    }
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging = logging.with_level(LogLevel::Debug);
    }
    if let Some(format) = cli.log_format {
        logging = logging.with_format(format.into());
    }
    let logger = Logger::new(logging);

    match cli.cmd {
        Command::Classify { input } => {
            let text = read_input(&input)?;
            let vocabulary = config.vocabulary()?;
            let out = ClassificationPipeline::new(&vocabulary)
                .with_logger(&logger)
                .classify(&text, &config.paths())?;

            println!(
                "classified {} functional, {} non-functional",
                out.functional, out.non_functional
            );
            println!("wrote:");
            for path in &out.written {
                println!("- {}", path.display());
            }
        }

        Command::Save { input } => {
            let text = read_input(&input)?;
            let vocabulary = config.vocabulary()?;
            let out = ClassificationPipeline::new(&vocabulary)
                .with_logger(&logger)
                .save(&text, &config.paths())?;
            for path in &out.written {
                logger.info(format!("wrote {}", path.display()));
            }
            println!("{}", out.normalized_text);
        }

        Command::Extract { input } => {
            let text = read_input(&input)?;
            let extractor = Extractor::new().context("compile phrase grammar")?;
            let plan = extract_plan(&extractor, &text);
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).context("serialize scenario plan")?
            );
        }

        Command::Run {
            input,
            openapi_dir,
            renderer,
            concurrency,
            timeout_secs,
            out,
            save,
            strict,
        } => {
            if let Some(dir) = openapi_dir {
                config.openapi_dir = Some(dir);
            }
            if let Some(kind) = renderer {
                config.execution.renderer = kind.into();
            }
            if let Some(n) = concurrency {
                config.execution.concurrency = n;
            }
            if let Some(secs) = timeout_secs {
                config.execution.timeout_secs = secs;
            }

            let text = read_input(&input)?;
            let outcome = run(&config, &logger, &text);
            let output = outcome.execution_output();
            match out.or_else(|| save.then(|| report_path(&config))) {
                Some(path) => {
                    write_output(&path, &output)?;
                    println!("wrote:");
                    println!("- {}", path.display());
                }
                None => println!("{}", display_output(&output)?),
            }

            if outcome.is_failed() {
                return Ok(ExitCode::FAILURE);
            }
            let any_failed = outcome
                .report()
                .is_some_and(|r| r.summary().failed > 0);
            if strict && any_failed {
                return Ok(ExitCode::from(2));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Setup failures end the run like document failures: with an error output.
fn run(config: &BddrunConfig, logger: &Logger, text: &str) -> RunOutcome {
    let user_agent = config
        .execution
        .user_agent
        .as_deref()
        .unwrap_or(DEFAULT_USER_AGENT);
    let transport = match ReqwestTransport::new(config.execution.timeout(), user_agent) {
        Ok(transport) => transport,
        Err(e) => return setup_failed(logger, &e),
    };
    let auth = resolve_auth(&config.auth.token_env, &config.auth.header);
    let renderer: Box<dyn ReportRenderer> = match config.execution.renderer {
        RendererKind::Json => Box::new(JsonRenderer),
        RendererKind::Markdown => Box::new(MarkdownRenderer),
    };
    let engine = match ExecutionEngine::new(&transport, auth.as_ref(), renderer.as_ref()) {
        Ok(engine) => engine,
        Err(e) => return setup_failed(logger, &e),
    };
    engine
        .with_concurrency(config.execution.concurrency)
        .with_logger(logger)
        .execute_project(text, &config.openapi_dir())
}

fn setup_failed(logger: &Logger, e: &anyhow::Error) -> RunOutcome {
    let error = format!("{e:#}");
    logger.error(error.clone());
    RunOutcome::failed(error)
}

fn report_path(config: &BddrunConfig) -> PathBuf {
    let paths = config.paths();
    match config.execution.renderer {
        RendererKind::Json => paths.report_json(),
        RendererKind::Markdown => paths.report_md(),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("read {path:?}"))
}

/// Markdown output is printed as-is, anything else as pretty JSON.
fn display_output(output: &Value) -> Result<String> {
    match output {
        Value::String(text) => Ok(text.clone()),
        other => serde_json::to_string_pretty(other).context("serialize execution output"),
    }
}

fn write_output(path: &Path, output: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {parent:?}"))?;
    }
    match output {
        Value::String(text) => std::fs::write(path, text).with_context(|| format!("write {path:?}")),
        other => write_report_json(path, other),
    }
}
