//! WMS capability document handling.
//!
//! A capability document is an upstream map service's self-description:
//! one service-level metadata record plus the ordered list of advertised
//! layers. This module covers the full path from endpoint URL to matched
//! layer record:
//! - [`CapabilitiesRequest`] and [`CapabilitiesClient`] build and issue the
//!   `GetCapabilities` request
//! - [`CapabilitiesCache`] performs one fetch-and-parse per endpoint per process
//! - [`parse_capabilities`] turns raw XML bytes into a [`CapabilityDocument`]
//! - [`match_layer`] selects the advertised layer backing a target layer name

mod cache;
pub use cache::{CacheKey, CapabilitiesCache, SharedCapabilities};

mod client;
pub use client::{
    CapabilitiesClient, CapabilitiesRequest, DEFAULT_WMS_VERSION, HttpAuth, HttpCapabilitiesClient,
};

mod document;
pub use document::{CapabilityDocument, LayerRecord, ServiceRecord};

mod error;
pub use error::{CapabilitiesError, CapabilitiesResult};

mod matcher;
pub use matcher::match_layer;

mod parse;
pub use parse::parse_capabilities;
