// File: src/persistence.rs
use crate::core::context::Context;
use crate::error::{DiagnosisError, DiagnosisResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Bumped whenever the serialized layout of [`Context`] changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    context: &'a Context,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    context: Context,
}

/// Writes a fully built context as one bincode file. The write goes to a
/// temporary file in the same directory and is then renamed over `path`.
pub fn save_snapshot(context: &Context, path: &Path) -> DiagnosisResult<()> {
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(|e| DiagnosisError::artifact(parent_dir, e))?;

    let temp_file =
        NamedTempFile::new_in(parent_dir).map_err(|e| DiagnosisError::artifact(path, e))?;
    {
        let mut writer = BufWriter::new(&temp_file);
        let state = SnapshotRef {
            version: SNAPSHOT_VERSION,
            context,
        };
        bincode::serialize_into(&mut writer, &state)
            .map_err(|e| DiagnosisError::artifact(path, e))?;
        writer.flush().map_err(|e| DiagnosisError::artifact(path, e))?;
    }
    temp_file
        .persist(path)
        .map_err(|e| DiagnosisError::artifact(path, e))?;
    log::debug!("Wrote context snapshot {}", path.display());
    Ok(())
}

/// Reads a snapshot back and re-runs the load-time validation on it.
pub fn load_snapshot(path: &Path) -> DiagnosisResult<Context> {
    let file = File::open(path).map_err(|e| DiagnosisError::artifact(path, e))?;
    let reader = BufReader::new(file);
    let state: Snapshot =
        bincode::deserialize_from(reader).map_err(|e| DiagnosisError::artifact(path, e))?;
    if state.version != SNAPSHOT_VERSION {
        return Err(DiagnosisError::artifact(
            path,
            format!(
                "snapshot version {} is not the supported {}",
                state.version, SNAPSHOT_VERSION
            ),
        ));
    }
    state.context.validate()?;
    Ok(state.context)
}
