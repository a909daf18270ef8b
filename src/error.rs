// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("'test_img' directory not found in '{}'", .0.display())]
    MissingTestImg(PathBuf),

    #[error("the 'test_img' directory in '{}' has no subfolders", .0.display())]
    NoTestFolders(PathBuf),

    #[error("no subfolders with an 'imgs' directory found in '{}'", .0.display())]
    NoImageFolders(PathBuf),

    #[error("no interactions to export")]
    NothingToExport,

    #[error("unknown test id '{0}'")]
    UnknownTestId(String),

    #[error("image '{image_id}' not found in test '{test_id}'")]
    UnknownImage { test_id: String, image_id: String },
}

impl Error {
    /// Wraps an `io::Error` with the path it happened on, for use with `map_err`
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
