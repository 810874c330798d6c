use std::path::PathBuf;

use derive_more::{Display, Error};
use pilot::FrameError;
use reqwest::StatusCode;

#[derive(Debug, Display, Error)]
pub enum SeerError {
    #[display("the API key variable {var} is not set")]
    MissingApiKey { var: String },
    #[display("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("could not parse the config at {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[display("{source}")]
    Frame { source: FrameError },
    #[display("request to the model failed: {source}")]
    Request { source: reqwest::Error },
    #[display("the model answered with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[display("the model sent back an empty reply")]
    EmptyReply,
}

impl From<FrameError> for SeerError {
    fn from(source: FrameError) -> Self {
        Self::Frame { source }
    }
}

impl From<reqwest::Error> for SeerError {
    fn from(source: reqwest::Error) -> Self {
        Self::Request { source }
    }
}
