use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use clap::Parser;
use jsonl2md_core::{
    BatchDriver, BatchItem, BatchReport, ExportConfig, Jsonl2mdError, batch_report_to_json,
    collect_transcripts, combine_markdown, load_batch,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STDIN_MARKER: &str = "-";
const STDIN_NAME: &str = "stdin.jsonl";
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "jsonl2md",
    version,
    about = "Convert JSONL chat session transcripts to Markdown"
)]
struct Cli {
    /// Transcript files (.jsonl or .json) or directories to scan; reads stdin when omitted or `-`
    inputs: Vec<PathBuf>,

    /// Directory for written Markdown files (overrides JSONL2MD_OUTPUT_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print Markdown to stdout instead of writing files
    #[arg(long, conflicts_with = "json")]
    stdout: bool,

    /// Write one combined-export-<date>.md instead of one file per transcript
    #[arg(long, conflicts_with = "json")]
    combined: bool,

    /// Print the batch report as JSON instead of writing files
    #[arg(long)]
    json: bool,

    /// Log progress at info level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn reads_stdin(&self) -> bool {
        self.inputs.is_empty()
            || (self.inputs.len() == 1 && self.inputs[0] == Path::new(STDIN_MARKER))
    }

    fn writes_per_file(&self) -> bool {
        !(self.json || self.stdout || self.combined || self.reads_stdin())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = ExportConfig::from_env(cli.verbose).with_output_dir(cli.output_dir.clone());
    init_tracing(&config.log_filter);

    match run(&cli, &config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn install_interrupt_handler(cancel: Arc<AtomicBool>) {
    let result = ctrlc::set_handler(move || {
        if cancel.load(Ordering::SeqCst) {
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
        cancel.store(true, Ordering::SeqCst);
    });

    if let Err(err) = result {
        warn!(error = %err, "could not install Ctrl+C handler");
    }
}

fn run(cli: &Cli, config: &ExportConfig) -> jsonl2md_core::Result<ExitCode> {
    let (mut items, sources) = if cli.reads_stdin() {
        (vec![read_stdin_item()?], Vec::new())
    } else {
        let sources = collect_transcripts(&cli.inputs)?;
        (load_batch(&sources), sources)
    };

    let outputs = if cli.writes_per_file() {
        config.prepare_output_dir()?;
        config.converted_output_plan(&sources)
    } else {
        Vec::new()
    };
    for (item, output) in items.iter_mut().zip(&outputs) {
        if let Err(err) = output {
            item.content = Err(err.to_string());
        }
    }

    let cancel = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(Arc::clone(&cancel));

    let total = items.len();
    let mut completed = 0_usize;
    let report = BatchDriver::new()
        .with_cancel_flag(cancel)
        .run(items, &mut |percent: u8| {
            completed += 1;
            info!(completed, total, percent, "conversion progress");
        });

    if cli.json {
        let json = batch_report_to_json(&report)?;
        println!("{json}");
    } else if cli.stdout || cli.reads_stdin() {
        print!("{}", stdout_markdown(&report, cli.combined));
    } else if cli.combined {
        config.prepare_output_dir()?;
        let path = config.combined_output_path(Utc::now().date_naive());
        write_output(&path, &combine_markdown(&report.entries))?;
    } else {
        for (entry, output) in report.entries.iter().zip(&outputs) {
            if let (Some(markdown), Ok(path)) = (&entry.markdown, output) {
                write_output(path, markdown)?;
            }
        }
    }

    for entry in report.failed() {
        eprintln!(
            "error: {}: {}",
            entry.name,
            entry.error.as_deref().unwrap_or("not converted")
        );
    }

    if report.cancelled {
        eprintln!(
            "cancelled after {} of {} files",
            report.completed, report.total
        );
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }

    if report.has_failures() {
        return Ok(ExitCode::from(1));
    }

    Ok(ExitCode::SUCCESS)
}

fn read_stdin_item() -> jsonl2md_core::Result<BatchItem> {
    let mut content = Vec::new();
    io::stdin()
        .read_to_end(&mut content)
        .map_err(|source| Jsonl2mdError::Io {
            path: PathBuf::from(STDIN_MARKER),
            source,
        })?;
    Ok(BatchItem::new(STDIN_NAME, content))
}

fn stdout_markdown(report: &BatchReport, combined: bool) -> String {
    if combined {
        return combine_markdown(&report.entries);
    }

    report
        .entries
        .iter()
        .filter_map(|entry| entry.markdown.as_deref())
        .collect()
}

fn write_output(path: &Path, markdown: &str) -> jsonl2md_core::Result<()> {
    fs::write(path, markdown).map_err(|source| Jsonl2mdError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    println!("{}", path.display());
    Ok(())
}
