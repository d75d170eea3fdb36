use thiserror::Error;

use crate::model::AttemptError;
use crate::progression::ProgressionConfigError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    ProgressionConfig(#[from] ProgressionConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
