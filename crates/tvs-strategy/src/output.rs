//! Per-worker persistence of terminal index values.
//!
//! Each worker appends to its own file `<prefix>_rank<worker>.txt`, one
//! value per line, flushing after every path so that an aborted batch
//! leaves every completed path on disk. Files can be read back to restart a
//! run from previously simulated index values.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tvs_core::{errors::Result, Error, Real};

/// File name of worker `worker` for output prefix `prefix`.
pub fn worker_file(prefix: &str, worker: usize) -> PathBuf {
    PathBuf::from(format!("{prefix}_rank{worker}.txt"))
}

/// Append-only writer of terminal values for one worker.
#[derive(Debug)]
pub struct TerminalValueWriter {
    path: PathBuf,
    file: File,
    written: usize,
}

impl TerminalValueWriter {
    /// Open (or create) `<prefix>_rank<worker>.txt` in append mode.
    pub fn open(prefix: &str, worker: usize) -> Result<Self> {
        Self::open_path(worker_file(prefix, worker))
    }

    /// Open (or create) `path` in append mode.
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// Append one value and flush it.
    pub fn write(&mut self, value: Real) -> Result<()> {
        writeln!(self.file, "{value}")?;
        self.file.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Values written through this writer.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read back a file written by [`TerminalValueWriter`]. Blank lines are
/// skipped.
pub fn read_terminal_values(path: impl AsRef<Path>) -> Result<Vec<Real>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut values = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let v = line.parse::<Real>().map_err(|e| {
            Error::Io(format!("{}:{}: cannot parse '{line}': {e}", path.display(), i + 1))
        })?;
        values.push(v);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_and_reads_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("tvs").display().to_string();
        let values = [1.0, 0.987_654_321_012_345_6, 1.0 / 3.0];
        {
            let mut w = TerminalValueWriter::open(&prefix, 4).unwrap();
            for v in &values[..2] {
                w.write(*v).unwrap();
            }
            assert_eq!(w.written(), 2);
            assert!(w.path().ends_with("tvs_rank4.txt"));
        }
        // reopening appends
        let mut w = TerminalValueWriter::open(&prefix, 4).unwrap();
        w.write(values[2]).unwrap();

        let back = read_terminal_values(worker_file(&prefix, 4)).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn workers_do_not_share_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run").display().to_string();
        TerminalValueWriter::open(&prefix, 0).unwrap().write(1.0).unwrap();
        TerminalValueWriter::open(&prefix, 1).unwrap().write(2.0).unwrap();
        assert_eq!(read_terminal_values(worker_file(&prefix, 0)).unwrap(), vec![1.0]);
        assert_eq!(read_terminal_values(worker_file(&prefix, 1)).unwrap(), vec![2.0]);
    }

    #[test]
    fn malformed_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "1.0\n\nnot-a-number\n").unwrap();
        assert!(matches!(read_terminal_values(&path), Err(Error::Io(_))));
        assert!(read_terminal_values(dir.path().join("missing.txt")).is_err());
    }
}
