use std::path::PathBuf;

use thiserror::Error;

use crate::snippet::RenderError;

pub type Result<A> = std::result::Result<A, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Encountered io error: `{0}`")]
    IOError(std::io::Error),
    #[error("Unexpected path for a page: `{0}`")]
    PageError(PathBuf),
    #[error("Unexpected path for a directory: `{0}`")]
    DirError(PathBuf),
    #[error("Invalid configuration: `{0}`")]
    Config(Box<figment::Error>),
    #[error("Missing page template: `{0}`")]
    MissingTemplate(PathBuf),
    #[error("Invalid page template: `{0}`")]
    InvalidTemplate(minijinja::Error),
    #[error("Missing source directory: `{0}`")]
    MissingSource(PathBuf),
    #[error("Missing extra file: `{0}`")]
    MissingExtraFile(PathBuf),
    #[error("Two sources map to the same output: `{0}`")]
    DuplicateRoute(PathBuf),
    #[error("Failed to render snippet: `{0}`")]
    Snippet(RenderError),
    #[error("Error with templating: `{0}`")]
    JinjaError(minijinja::Error),
    #[error("Error watching files: `{0}`")]
    NotifyError(notify::Error),
}

impl Error {
    /// errors that abort the whole run instead of a single document
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::MissingTemplate(_)
                | Error::InvalidTemplate(_)
                | Error::MissingSource(_)
                | Error::MissingExtraFile(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<figment::Error> for Error {
    fn from(value: figment::Error) -> Self {
        Self::Config(Box::new(value))
    }
}

impl From<RenderError> for Error {
    fn from(value: RenderError) -> Self {
        Self::Snippet(value)
    }
}

impl From<minijinja::Error> for Error {
    fn from(value: minijinja::Error) -> Self {
        Self::JinjaError(value)
    }
}

impl From<notify::Error> for Error {
    fn from(value: notify::Error) -> Self {
        Self::NotifyError(value)
    }
}
