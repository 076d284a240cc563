use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::Sheet;

pub const DEFAULT_SHEET: &str = "Sheet0";
const SHEET_NAME_MAX: usize = 31;
const STORE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid report file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("report {0} is locked by another invocation")]
    Locked(PathBuf),
    #[error("unsupported report version {0}")]
    Version(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetChoice {
    Default,
    New,
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub version: u32,
    #[serde(default)]
    pub active: usize,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Default for Workbook {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            active: 0,
            sheets: Vec::new(),
        }
    }
}

impl Workbook {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path)?;
        let wb: Workbook = serde_json::from_str(&text)?;
        if wb.version != STORE_VERSION {
            return Err(StoreError::Version(wb.version));
        }
        Ok(wb)
    }

    /// Existing report when merging into a file that exists, else an empty one.
    pub fn open(path: &Path, merge: bool) -> Result<Self, StoreError> {
        if merge && path.exists() {
            crate::info!("merging into {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Writes to a sibling temporary file and renames it over `path`, so a
    /// reader never sees a half-written report.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let tmp = sibling(path, ".tmp");
        {
            let mut w = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut w, self)?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Index of the sheet selected by `choice`, creating it when needed. The
    /// selected sheet becomes the active one.
    pub fn select(&mut self, choice: &SheetChoice) -> usize {
        let idx = match choice {
            SheetChoice::Default => self.get_or_create(DEFAULT_SHEET),
            SheetChoice::New => {
                let name = self.next_sheet_name("Sheet", 1);
                self.push(Sheet::new(name))
            }
            SheetChoice::Named(name) => self.get_or_create(&safe_sheet_name(name)),
        };
        self.active = idx;
        idx
    }

    fn get_or_create(&mut self, name: &str) -> usize {
        match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => self.push(Sheet::new(name)),
        }
    }

    fn push(&mut self, sheet: Sheet) -> usize {
        crate::info!("creating sheet {}", sheet.name);
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    fn next_sheet_name(&self, stem: &str, start: usize) -> String {
        (start..)
            .map(|i| format!("{stem}{i}"))
            .find(|name| self.sheet(name).is_none())
            .unwrap_or_else(|| stem.to_string())
    }
}

/// Spreadsheet-safe sheet name: forbidden characters become spaces and the
/// name is cut to 31 characters.
pub fn safe_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | '*' | '?' | '/' | '\\' | ':' => ' ',
            other => other,
        })
        .take(SHEET_NAME_MAX)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.trim().is_empty() {
        "empty".to_string()
    } else {
        cleaned
    }
}

/// First path of the form `<stem> - Copy N.<ext>` that does not exist yet,
/// or `path` itself when it is free.
pub fn next_free_copy(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (base, mut n) = match stem.rsplit_once(" - Copy ") {
        Some((base, num)) => match num.parse::<u32>() {
            Ok(n) => (base.to_string(), n + 1),
            Err(_) => (stem.clone(), 1),
        },
        None => (stem.clone(), 1),
    };
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    loop {
        let candidate = path.with_file_name(format!("{base} - Copy {n}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Exclusive lock for one load-mutate-persist cycle, held as a `.lock` file
/// next to the report and removed on drop.
#[derive(Debug)]
pub struct ReportLock {
    path: PathBuf,
}

impl ReportLock {
    pub fn acquire(report: &Path) -> Result<Self, StoreError> {
        let path = sibling(report, ".lock");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                writeln!(f, "{}", std::process::id())?;
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::Locked(report.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for ReportLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            crate::warn!("failed to remove lock {}: {}", self.path.display(), err);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/store.rs"]
mod tests;
