use std::path::PathBuf;

use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no cgroup2 mount listed in `{path}`")]
    MissingCgroup2Mount { path: PathBuf },
    #[error("cgroup2 mount point `{path}` is not a directory")]
    NotADirectory { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;
