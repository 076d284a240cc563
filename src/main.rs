mod decode;
mod label;
mod model;
mod report;
mod tracing;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::model::{Estimation, ModelError, build_columns};
use crate::report::Grid;
use crate::report::accumulate::{AccumulateOptions, add_model};
use crate::report::describe::{Summary, append_summary};
use crate::report::format::format_timestamp;
use crate::report::margins::{Margins, append_margins};
use crate::report::store::{ReportLock, SheetChoice, StoreError, Workbook, next_free_copy};

#[derive(Debug, Parser)]
#[command(name = "regout", version, about = "Accumulate estimation results into a comparison report")]
struct Cli {
    /// Log at debug level (REGOUT_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Append an estimation as a new model column.
    Reg(RegArgs),
    /// Append a descriptive-statistics row.
    Desc(DescArgs),
    /// Add margins and their `at` grid as two new sheets.
    Margins(MarginsArgs),
}

#[derive(Debug, Args)]
struct RegArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "regout.json")]
    path: PathBuf,
    #[arg(short, long)]
    merge: bool,
    #[arg(short, long)]
    copy: bool,
    /// Target sheet; without a value a new sheet is created.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    sheet: Option<String>,
    #[arg(long, default_value_t = 2)]
    scale: u32,
    #[arg(long, default_value_t = 1000)]
    max_models: usize,
}

#[derive(Debug, Args)]
struct DescArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "descout.json")]
    path: PathBuf,
    #[arg(short, long)]
    merge: bool,
}

#[derive(Debug, Args)]
struct MarginsArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "marginsout.json")]
    path: PathBuf,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Report(#[from] report::ReportError),
}

#[derive(Debug, Clone, PartialEq)]
struct RunConfig {
    input: PathBuf,
    path: PathBuf,
    merge: bool,
    copy: bool,
    sheet: SheetChoice,
    scale: u32,
    max_models: usize,
}

impl From<RegArgs> for RunConfig {
    fn from(args: RegArgs) -> Self {
        let sheet = match args.sheet.as_deref().map(str::trim) {
            None => SheetChoice::Default,
            Some("" | "sh" | "sheet") => SheetChoice::New,
            Some(name) => SheetChoice::Named(name.to_string()),
        };
        Self {
            input: args.input,
            path: args.path,
            merge: args.merge,
            copy: args.copy,
            sheet,
            scale: args.scale,
            max_models: args.max_models,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    crate::tracing::init(cli.verbose);
    let result = match cli.command {
        Command::Reg(args) => run_reg(&RunConfig::from(args)).map(|_| ()),
        Command::Desc(args) => run_desc(&args),
        Command::Margins(args) => run_margins(&args),
    };
    if let Err(err) = result {
        crate::error!("{err}");
        std::process::exit(1);
    }
}

fn run_reg(config: &RunConfig) -> Result<PathBuf, AppError> {
    let estimation = Estimation::load(&config.input)?;
    let _lock = ReportLock::acquire(&config.path)?;

    let mut wb = Workbook::open(&config.path, config.merge)?;
    let idx = wb.select(&config.sheet);
    let opts = AccumulateOptions {
        max_models: config.max_models,
        scale: config.scale,
        created: now_timestamp(),
    };

    // mutate a staged copy so a failing equation leaves the workbook untouched
    let mut staged = wb.sheets[idx].clone();
    let sheet_name = staged.name.clone();
    for column in build_columns(&estimation) {
        add_model(&mut staged, &sheet_name, &column, &estimation.metadata, &opts)?;
    }
    wb.sheets[idx] = staged;

    let out = output_path(&config.path, config.copy);
    wb.save(&out)?;
    crate::info!("report written to {}", out.display());
    Ok(out)
}

fn run_desc(args: &DescArgs) -> Result<(), AppError> {
    let summary = Summary::load(&args.input)?;
    let _lock = ReportLock::acquire(&args.path)?;

    let mut wb = Workbook::open(&args.path, args.merge)?;
    let idx = wb.select(&SheetChoice::Default);
    let sheet = &mut wb.sheets[idx];
    let row = append_summary(sheet, &summary);
    crate::debug!("descriptive row {} of {}", row, sheet.row_count());

    wb.save(&args.path)?;
    crate::info!("report written to {}", args.path.display());
    Ok(())
}

/// Margins always extend an existing report.
fn run_margins(args: &MarginsArgs) -> Result<(), AppError> {
    let margins = Margins::load(&args.input)?;
    let _lock = ReportLock::acquire(&args.path)?;

    let mut wb = Workbook::open(&args.path, true)?;
    let (table, grid) = append_margins(&mut wb, &margins);
    wb.save(&args.path)?;
    crate::info!(
        "margins written to {} (sheets {}, {})",
        args.path.display(),
        table,
        grid
    );
    Ok(())
}

fn output_path(path: &Path, copy: bool) -> PathBuf {
    if copy {
        next_free_copy(path)
    } else {
        path.to_path_buf()
    }
}

fn now_timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_timestamp(secs)
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
