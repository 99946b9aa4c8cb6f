//! Locate log files under a data directory

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::core::parameter::Parameter;
use crate::parser::log::TABLE_MARKER;

const LOG_EXTENSIONS: &[&str] = &["txt", "log", "dat"];

/// Lines read when deciding whether a file holds a CP table
const SNIFF_LINES: usize = 10;

/// True for names a tester writes logs under
pub fn is_log_file(path: &Path) -> bool {
    match path.extension() {
        None => true,
        Some(ext) => {
            let ext = ext.to_string_lossy();
            LOG_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
        }
    }
}

/// True when a `No.U` table header naming a known parameter appears in the
/// first lines of `reader`
pub fn has_table_header<R: BufRead>(mut reader: R) -> io::Result<bool> {
    let mut buf = Vec::new();
    for _ in 0..SNIFF_LINES {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_start_matches('\u{FEFF}');
        let mut fields = line.split('\t').map(str::trim);
        if fields.next() == Some(TABLE_MARKER) && fields.any(|name| Parameter::from_column(name).is_some()) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Extension and content check combined
///
/// A file that cannot be opened is kept so loading reports the error.
pub fn is_cp_log(path: &Path) -> bool {
    if !is_log_file(path) {
        return false;
    }
    match File::open(path) {
        Ok(file) => has_table_header(BufReader::new(file)).unwrap_or(true),
        Err(_) => true,
    }
}

/// All CP logs below `dir`, sorted by path
///
/// Hidden files and directories are skipped, as are files with a log
/// extension but no measurement table near the top.
pub fn discover_logs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(dir).map_err(|e| {
        io::Error::new(e.kind(), format!("data directory {}: {}", dir.display(), e))
    })?;
    if !meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("data directory {} is not a directory", dir.display()),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') || e.depth() == 0
        })
    {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() || !is_log_file(entry.path()) {
            continue;
        }
        if is_cp_log(entry.path()) {
            files.push(entry.into_path());
        } else {
            debug!(file = %entry.path().display(), "no CP table header, skipped");
        }
    }

    files.sort();
    Ok(files)
}
