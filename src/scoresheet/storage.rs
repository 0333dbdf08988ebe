use super::types::{MarkScoresheet, Scoresheet};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::{self, File};
use std::path::Path;

/// Load a scoresheet (marks or tally) from a JSON file
pub fn load_scoresheet(path: &Path) -> Result<Scoresheet> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open scoresheet at {}", path.display()))?;

    let sheet: Scoresheet = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse scoresheet in {}", path.display()))?;

    Ok(sheet)
}

/// Load a mark scoresheet, or None if the file does not exist yet.
///
/// Fails if the file holds a tally scoresheet, since marks cannot be
/// appended to it.
pub fn load_mark_scoresheet(path: &Path) -> Result<Option<MarkScoresheet>> {
    if !path.exists() {
        return Ok(None);
    }

    match load_scoresheet(path)? {
        Scoresheet::Marks(sheet) => Ok(Some(sheet)),
        Scoresheet::Tally(_) => {
            anyhow::bail!("{} holds a tally scoresheet, not marks", path.display())
        }
    }
}

/// Save a scoresheet to a JSON file atomically
///
/// The file is never left half-written. Missing parent directories are
/// created.
pub fn save_scoresheet(path: &Path, sheet: &Scoresheet) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, sheet).context("Failed to serialize scoresheet")?;

    file.commit().context("Failed to save scoresheet")?;

    Ok(())
}
