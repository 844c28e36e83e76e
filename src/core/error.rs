use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("need at least {required} net worth snapshots, found {found}")]
    InsufficientData { found: usize, required: usize },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ForecastError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ForecastError::InvalidInput(msg.into())
    }
}
