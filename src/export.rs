// src/export.rs
//
// Serialize cached pages to disk. Only resident data is written; the
// exporter never triggers downloads; what the cache holds is what lands
// in the file.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::csv::{Delim, write_row};
use crate::player::{COLUMNS, Player};

/// Write all resident pages (as returned by
/// `PlayerManager::all_cached_pages`) to `path`. Returns the path for
/// reporting.
pub fn write_players(
    path: &Path,
    delim: Delim,
    include_headers: bool,
    pages: &[(u32, Vec<Player>)],
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let file = File::create(path)?; // truncate/overwrite
    let mut out = BufWriter::new(file);

    if include_headers {
        let headers: Vec<String> = COLUMNS.iter().map(|h| s!(*h)).collect();
        write_row(&mut out, &headers, delim)?;
    }

    let mut written = 0usize;
    for (_, page) in pages {
        for player in page {
            write_row(&mut out, &player.to_row(), delim)?;
            written += 1;
        }
    }
    out.flush()?;

    logf!("export: wrote {} players to {}", written, path.display());
    Ok(path.to_path_buf())
}

/// Resolve an output hint into a concrete file path: a directory (or
/// trailing separator) gets the default stem + format extension.
pub fn resolve_out_path(hint: &Path, stem: &str, delim: Delim) -> PathBuf {
    if hint.is_dir() || looks_like_dir_hint(hint) {
        hint.join(join!(stem, ".", delim.ext()))
    } else {
        hint.to_path_buf()
    }
}

pub fn ensure_directory(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if dir.exists() && !dir.is_dir() {
        return Err(format!("Path exists but is not a directory: {}", dir.display()).into());
    }
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

pub fn looks_like_dir_hint(p: &Path) -> bool {
    let s = p.to_string_lossy();
    s.ends_with('/') || s.ends_with('\\')
}
