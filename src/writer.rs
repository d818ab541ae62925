use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::Result;
use tempfile::Builder;

/// Writes `content` to `path` through a sibling temp file, then renames it into place.
pub fn write_text_file(path: &Path, content: &str, mode: u32) -> Result<()> {
    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = Builder::new()
        .prefix(".scan2cnv_")
        .suffix(".tmp")
        .tempfile_in(parent_dir)?;

    {
        let mut buf = BufWriter::new(staged.as_file_mut());
        buf.write_all(content.as_bytes())?;
        buf.flush()?;
    }
    set_mode(staged.path(), mode)?;

    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
