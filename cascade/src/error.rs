use std::io;

use cascade_core::capabilities::CapabilitiesError;

/// A convenience [`Result`] for the cascade crate.
pub type CascadeResult<T> = Result<T, CascadeError>;

#[derive(thiserror::Error, Debug)]
pub enum CascadeError {
    #[error(transparent)]
    ConfigFileError(#[from] crate::config::ConfigFileError),

    #[error(transparent)]
    CapabilitiesError(#[from] CapabilitiesError),

    #[error(transparent)]
    IoError(#[from] io::Error),
}
