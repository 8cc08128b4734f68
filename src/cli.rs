use crate::{
    config::Config,
    llm::{Completion, Disabled, OllamaClient},
    service::Logbook,
    store::JsonFileStore,
    util::{ensure_dir, write_file},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "logbook")]
#[command(about = "Industrial attachment logbook generator (weekly tables, LLM enrichment, sign-off)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./logbook.toml if present, else built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the language model host is reachable and serves the configured model.
    Doctor {},
    /// Extend the blank weekly form in a workbook, creating it if needed.
    Template {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        workbook: Option<PathBuf>,
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Read a task workbook, resolve every week and store it as a draft report.
    Upload {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "Student")]
        student: String,
    },
    Show {
        #[arg(long)]
        report: u64,
    },
    Submit {
        #[arg(long)]
        report: u64,
    },
    /// Reports waiting for the supervisor.
    List {},
    Weeks {
        #[arg(long)]
        report: u64,
    },
    Comment {
        #[arg(long)]
        week: u64,
        #[arg(long)]
        text: String,
        /// Fail instead of overwriting if the week changed since this version was read.
        #[arg(long)]
        expected_version: Option<u64>,
    },
    CommentAll {
        #[arg(long)]
        report: u64,
        #[arg(long)]
        text: String,
    },
    AiComment {
        #[arg(long)]
        week: u64,
    },
    AiCommentAll {
        #[arg(long)]
        report: u64,
    },
    /// Unsigned final document.
    Download {
        #[arg(long)]
        report: u64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Signed final document; marks the report completed.
    Finalize {
        #[arg(long)]
        report: u64,
        #[arg(long)]
        signature: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    let logbook = Logbook::new(
        &cfg,
        completion_client(&cfg)?,
        JsonFileStore::open(&cfg.paths.store_path),
    );

    match args.cmd {
        Command::Doctor {} => print_json(&logbook.health()?),
        Command::Template {
            start,
            end,
            workbook,
            sheet,
        } => {
            let path = workbook.unwrap_or_else(|| PathBuf::from(&cfg.paths.template_workbook));
            let sheet = sheet.unwrap_or_else(|| cfg.sheets.template_sheet.clone());
            let outcome = logbook.generate_template(&path, &sheet, &start, &end)?;
            if cfg.output.print_summary {
                print_json(&serde_json::json!({
                    "workbook": path,
                    "sheet": sheet,
                    "outcome": outcome,
                }))?;
            }
            Ok(())
        }
        Command::Upload {
            input,
            start,
            end,
            student,
        } => {
            let bytes =
                std::fs::read(&input).with_context(|| format!("reading upload: {}", input.display()))?;
            let report = logbook.upload(&bytes, &student, &start, &end)?;
            if cfg.output.print_summary {
                print_json(&serde_json::json!({
                    "report_id": report.id,
                    "status": report.status,
                    "weeks": report.weeks.iter().map(|w| w.week_ending).collect::<Vec<_>>(),
                }))?;
            }
            Ok(())
        }
        Command::Show { report } => print_json(&logbook.preview(report)?),
        Command::Submit { report } => {
            let report = logbook.submit(report)?;
            print_json(&serde_json::json!({ "report_id": report.id, "status": report.status }))
        }
        Command::List {} => print_json(&logbook.submitted()?),
        Command::Weeks { report } => print_json(&logbook.weeks(report)?),
        Command::Comment {
            week,
            text,
            expected_version,
        } => print_json(&logbook.update_comment(week, &text, expected_version)?),
        Command::CommentAll { report, text } => {
            let updated = logbook.comment_all(report, &text)?;
            print_json(&serde_json::json!({ "report_id": report, "updated": updated }))
        }
        Command::AiComment { week } => print_json(&logbook.generate_comment(week)?),
        Command::AiCommentAll { report } => {
            let comments: Vec<_> = logbook
                .generate_comments_all(report)?
                .into_iter()
                .map(|(week_id, comment)| serde_json::json!({ "week_id": week_id, "comment": comment }))
                .collect();
            print_json(&comments)
        }
        Command::Download { report, out } => {
            let path = out.unwrap_or_else(|| {
                Path::new(&cfg.paths.out_dir).join(cfg.output.preview_filename_for(report))
            });
            let bytes = logbook.download(report)?;
            write_output(&cfg, &path, &bytes)
        }
        Command::Finalize {
            report,
            signature,
            out,
        } => {
            let path = out.unwrap_or_else(|| Path::new(&cfg.paths.out_dir).join(&cfg.output.final_filename));
            let image = std::fs::read(&signature)
                .with_context(|| format!("reading signature: {}", signature.display()))?;
            let bytes = logbook.finalize(report, &image)?;
            write_output(&cfg, &path, &bytes)
        }
    }
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    let default = PathBuf::from("logbook.toml");
    if default.exists() {
        Config::load(&default)
    } else {
        Ok(Config::default())
    }
}

fn completion_client(cfg: &Config) -> Result<Box<dyn Completion>> {
    if cfg.llm.enabled {
        Ok(Box::new(OllamaClient::new(&cfg.llm)?))
    } else {
        debug!("llm disabled, every enrichment uses its fallback");
        Ok(Box::new(Disabled))
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(PathBuf::from(&cfg.paths.out_dir).join("logbook.log"))
}

fn write_output(cfg: &Config, path: &Path, bytes: &[u8]) -> Result<()> {
    write_file(path, bytes)?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    if cfg.output.print_summary {
        print_json(&serde_json::json!({ "output": path, "bytes": bytes.len() }))?;
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
