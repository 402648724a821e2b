// Temporary-file-then-rename writes, so a failed write never leaves a
// truncated file at the destination.
use crate::error::{PipelineError, Result};
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;

pub fn write_atomically<F>(dest: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> csv::Result<()>,
{
    let write_error = |source: std::io::Error| PipelineError::Write { path: dest.to_path_buf(), source };

    // The temp file must live on the destination's filesystem for the rename to be atomic.
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;

    write(tmp.as_file_mut()).map_err(|e| write_error(e.into()))?;
    tmp.as_file().sync_all().map_err(write_error)?;
    tmp.persist(dest).map_err(|e| write_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_writes_and_replaces_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.csv");
        std::fs::write(&dest, "old").unwrap();

        write_atomically(&dest, |file| {
            file.write_all(b"new")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.csv");
        std::fs::write(&dest, "previous").unwrap();

        let result = write_atomically(&dest, |file| {
            file.write_all(b"partial")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        });

        assert!(matches!(result, Err(PipelineError::Write { .. })));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous");
        // Only the destination remains; the temp file was cleaned up.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_directory_is_write_error() {
        let dest = Path::new("no/such/dir/out.csv");
        let result = write_atomically(dest, |_| Ok(()));
        assert!(matches!(result, Err(PipelineError::Write { .. })));
    }
}
