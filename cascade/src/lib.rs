#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod resolver;

use std::path::Path;
use std::sync::Arc;

pub use error::{CascadeError, CascadeResult};

use cascade_core::capabilities::HttpCapabilitiesClient;

use crate::metadata::{MetadataReport, MetadataResolver};

/// Reads a configuration file and runs automatic metadata inheritance over
/// it with an HTTP-backed capabilities client.
///
/// Problems talking to upstreams are reported in the returned
/// [`MetadataReport`], never as an error; only an unreadable or unparsable
/// configuration file fails the load.
pub async fn load_configuration(path: &Path) -> CascadeResult<(config::Config, MetadataReport)> {
    let mut config = config::read_config(path)?;
    config.finalize();

    let client = HttpCapabilitiesClient::new(HttpCapabilitiesClient::DEFAULT_TIMEOUT)?;
    let resolver = MetadataResolver::new(Arc::new(client));
    let report = resolver.resolve(&mut config).await;
    Ok((config, report))
}
