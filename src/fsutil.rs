use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::field::Field;

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use oci_fleet::fsutil;
/// let reader = fsutil::open_file_reader("/proc/self/status")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Reads a kernel interface file as raw bytes.
///
/// Anything that prevents reading the file yields [`Field::Unavailable`].
pub fn read_bytes(path: impl AsRef<Path>) -> Field<Vec<u8>> {
    let path = path.as_ref();
    let mut reader = match open_file_reader(path) {
        Ok(reader) => reader,
        Err(err) => {
            log::debug!("{err}");
            return Field::Unavailable;
        }
    };

    let mut content = Vec::new();
    if let Err(err) = reader.read_to_end(&mut content) {
        log::debug!("failed to read file `{}`: {}", path.display(), err);
        return Field::Unavailable;
    }
    Field::Available(content)
}

/// Reads a kernel interface file (cgroup counter, procfs entry) as text.
///
/// A single trailing newline is stripped; any other whitespace is preserved, so multi-line
/// files such as `cpu.stat` keep their inner line breaks. Invalid UTF-8 is replaced with
/// U+FFFD. Anything that prevents reading the file yields [`Field::Unavailable`].
pub fn read_value(path: impl AsRef<Path>) -> Field<String> {
    read_bytes(path).map(|bytes| {
        let mut content = String::from_utf8_lossy(&bytes).into_owned();
        if content.ends_with('\n') {
            content.pop();
        }
        content
    })
}
