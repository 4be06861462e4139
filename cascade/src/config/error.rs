use std::path::PathBuf;

pub type ConfigFileResult<T> = Result<T, ConfigFileError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error("Unable to load config file {1}: {0}")]
    ConfigLoadError(#[source] std::io::Error, PathBuf),

    #[error("Unable to parse config file {1}: {0}")]
    ConfigParseError(#[source] serde_yaml::Error, PathBuf),

    #[error(
        "Source reference '{reference}' exceeds the maximum nesting depth of {max_depth}; the configuration may contain a cycle"
    )]
    SourceCycle {
        reference: String,
        max_depth: usize,
    },
}
