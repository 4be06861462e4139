//! Automatic metadata inheritance during configuration load.
//!
//! For every layer whose `md` block enables `auto_metadata`, the resolver
//! walks the layer's source references down to terminal WMS declarations,
//! fetches each upstream's capability document (at most once per endpoint
//! and version), matches the target layer, and fills missing metadata fields
//! from the matched record. The WMS service block is resolved the same way
//! from the upstreams' service records. Manually authored values always win.
//!
//! Resolution never fails the configuration load: every problem degrades to
//! a [`MetadataWarning`] and the affected layer keeps its manual metadata.

use std::collections::HashSet;
use std::sync::Arc;

use cascade_core::capabilities::{
    CacheKey, CapabilitiesCache, CapabilitiesClient, CapabilitiesError, CapabilitiesRequest,
    match_layer,
};
use cascade_core::metadata::{MergedMetadata, MetadataFragment, merge};
use futures::future::join_all;
use tracing::{info, warn};

use crate::config::{Config, ConfigFileError, LayerConfig, MetadataBlock};
use crate::resolver::{DEFAULT_MAX_SOURCE_DEPTH, ResolvedWmsSource, resolve_wms_sources};

/// Overall outcome of one resolution run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionStatus {
    /// No layer and no service block enabled `auto_metadata`.
    Disabled,
    /// Every enabled block was fully resolved.
    Resolved,
    /// At least one source could not contribute; see the warnings.
    PartiallyResolved,
}

/// A non-fatal problem encountered while resolving metadata.
#[derive(thiserror::Error, Debug)]
pub enum MetadataWarning {
    #[error("Layer '{layer}' source references could not be resolved: {error}")]
    SourceResolution {
        layer: String,
        #[source]
        error: ConfigFileError,
    },

    #[error("Layer '{layer}' gets no metadata from source '{source}': {error}")]
    LayerSource {
        layer: String,
        source: String,
        #[source]
        error: CapabilitiesError,
    },

    #[error("Service metadata gets no contribution from source '{source}': {error}")]
    ServiceSource {
        source: String,
        #[source]
        error: CapabilitiesError,
    },
}

/// What one resolution run did, for the caller's log line.
#[derive(Debug)]
pub struct MetadataReport {
    pub status: ResolutionStatus,
    pub warnings: Vec<MetadataWarning>,
    /// Number of distinct upstream endpoints consulted.
    pub endpoints: usize,
}

/// Resolves automatic metadata for a whole configuration.
#[derive(Clone, Debug)]
pub struct MetadataResolver {
    cache: CapabilitiesCache,
    max_depth: usize,
}

impl MetadataResolver {
    /// Creates a resolver fetching through the given client.
    #[must_use]
    pub fn new(client: Arc<dyn CapabilitiesClient>) -> Self {
        Self {
            cache: CapabilitiesCache::new(client),
            max_depth: DEFAULT_MAX_SOURCE_DEPTH,
        }
    }

    /// Overrides the maximum source reference nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolves metadata for every enabled layer and for the WMS service
    /// block, writing the merge results back into `config`.
    ///
    /// The `auto_metadata` flags are cleared on write-back, so running the
    /// resolver over an already resolved configuration changes nothing.
    pub async fn resolve(&self, config: &mut Config) -> MetadataReport {
        let service_enabled = config.services.wms.md.auto_metadata();
        let any_layer_enabled = config.layers.iter().any(|l| l.md.auto_metadata());
        if !service_enabled && !any_layer_enabled {
            return MetadataReport {
                status: ResolutionStatus::Disabled,
                warnings: Vec::new(),
                endpoints: 0,
            };
        }

        let layer_outcomes = join_all(
            config
                .layers
                .iter()
                .map(|layer| self.resolve_layer(config, layer)),
        )
        .await;

        let service_outcome = if service_enabled {
            Some(self.resolve_service(config).await)
        } else {
            None
        };

        let mut warnings = Vec::new();
        let mut endpoints: HashSet<CacheKey> = HashSet::new();
        let mut resolved_layers = 0;
        for (layer, (merged, layer_warnings, layer_endpoints)) in
            config.layers.iter_mut().zip(layer_outcomes)
        {
            if let Some(merged) = merged {
                layer.md = MetadataBlock::from_merged(merged);
                resolved_layers += 1;
            }
            warnings.extend(layer_warnings);
            endpoints.extend(layer_endpoints);
        }
        if let Some((merged, service_warnings, service_endpoints)) = service_outcome {
            config.services.wms.md = MetadataBlock::from_merged(merged);
            warnings.extend(service_warnings);
            endpoints.extend(service_endpoints);
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        info!(
            "resolved metadata for {resolved_layers} layer(s) from {} upstream endpoint(s)",
            endpoints.len()
        );

        let status = if warnings.is_empty() {
            ResolutionStatus::Resolved
        } else {
            ResolutionStatus::PartiallyResolved
        };
        MetadataReport {
            status,
            warnings,
            endpoints: endpoints.len(),
        }
    }

    /// Computes the merge result for one layer without mutating anything,
    /// together with the endpoints it consulted. Returns `None` for layers
    /// with inheritance disabled.
    async fn resolve_layer(
        &self,
        config: &Config,
        layer: &LayerConfig,
    ) -> (Option<MergedMetadata>, Vec<MetadataWarning>, Vec<CacheKey>) {
        if !layer.md.auto_metadata() {
            return (None, Vec::new(), Vec::new());
        }

        let mut warnings = Vec::new();
        let mut endpoints = Vec::new();
        let sources = match resolve_wms_sources(config, &layer.sources, self.max_depth) {
            Ok(sources) => sources,
            Err(error) => {
                warnings.push(MetadataWarning::SourceResolution {
                    layer: layer.name.clone(),
                    error,
                });
                return (None, warnings, endpoints);
            }
        };

        let mut fragments = Vec::new();
        for resolved in &sources {
            let outcome = match self.request_for(resolved) {
                Ok(request) => {
                    endpoints.push(request.key().clone());
                    self.layer_fragment(&request, resolved.target_layer.as_deref())
                        .await
                }
                Err(error) => Err(error),
            };
            match outcome {
                Ok(fragment) => fragments.push(fragment),
                Err(error) => warnings.push(MetadataWarning::LayerSource {
                    layer: layer.name.clone(),
                    source: resolved.name.to_string(),
                    error,
                }),
            }
        }

        // With no surviving fragment this echoes the manual metadata, which
        // still clears the control flag on write-back.
        let merged = merge(&layer.md.to_fragment(), &fragments);
        (Some(merged), warnings, endpoints)
    }

    async fn layer_fragment(
        &self,
        request: &CapabilitiesRequest,
        target_layer: Option<&str>,
    ) -> Result<MetadataFragment, CapabilitiesError> {
        let document = self.cache.get(request).await?;
        let record = match_layer(&request.key().url, target_layer, &document.layers)?;
        Ok(MetadataFragment::from(record))
    }

    /// Computes the service-level merge from the service records of every
    /// upstream endpoint the layers reference, each counted once, in layer
    /// declaration order.
    async fn resolve_service(
        &self,
        config: &Config,
    ) -> (MergedMetadata, Vec<MetadataWarning>, HashSet<CacheKey>) {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        let mut fragments = Vec::new();

        for layer in &config.layers {
            let Ok(sources) = resolve_wms_sources(config, &layer.sources, self.max_depth) else {
                // Reported by the per-layer pass where it names the layer.
                continue;
            };
            for resolved in &sources {
                let request = match self.request_for(resolved) {
                    Ok(request) => request,
                    Err(error) => {
                        warnings.push(MetadataWarning::ServiceSource {
                            source: resolved.name.to_string(),
                            error,
                        });
                        continue;
                    }
                };
                if !seen.insert(request.key().clone()) {
                    continue;
                }
                match self.cache.get(&request).await {
                    Ok(document) => fragments.push(MetadataFragment::from(&document.service)),
                    Err(error) => warnings.push(MetadataWarning::ServiceSource {
                        source: resolved.name.to_string(),
                        error,
                    }),
                }
            }
        }

        let merged = merge(&config.services.wms.md.to_fragment(), &fragments);
        (merged, warnings, seen)
    }

    fn request_for(
        &self,
        resolved: &ResolvedWmsSource<'_>,
    ) -> Result<CapabilitiesRequest, CapabilitiesError> {
        CapabilitiesRequest::new(
            &resolved.source.req.url,
            resolved.source.version(),
            resolved.source.http_auth(),
            resolved.source.timeout(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::parse_config;

    #[derive(Debug)]
    struct UnreachableClient;

    #[async_trait::async_trait]
    impl CapabilitiesClient for UnreachableClient {
        async fn fetch(
            &self,
            request: &CapabilitiesRequest,
        ) -> Result<bytes::Bytes, CapabilitiesError> {
            Err(CapabilitiesError::SourceUnavailable {
                url: request.key().url.clone(),
                reason: "connection refused".to_string(),
            })
        }
    }

    fn config(yaml: &str) -> Config {
        parse_config(yaml, &PathBuf::from("test.yaml")).unwrap()
    }

    #[tokio::test]
    async fn disabled_configurations_are_left_untouched() {
        let mut config = config(indoc! {"
            sources:
              upstream:
                type: wms
                req:
                  url: https://example.com/wms
                  layers: roads
            layers:
              - name: roads
                sources: [upstream]
                md:
                  title: Manual Roads
        "});
        let before = config.clone();

        let resolver = MetadataResolver::new(Arc::new(UnreachableClient));
        let report = resolver.resolve(&mut config).await;

        assert_eq!(report.status, ResolutionStatus::Disabled);
        assert!(report.warnings.is_empty());
        assert_eq!(config, before);
    }

    #[tokio::test]
    async fn unreachable_upstream_degrades_to_a_warning() {
        let mut config = config(indoc! {"
            sources:
              upstream:
                type: wms
                req:
                  url: https://example.com/wms
                  layers: roads
            layers:
              - name: roads
                sources: [upstream]
                md:
                  auto_metadata: true
                  title: Manual Roads
        "});

        let resolver = MetadataResolver::new(Arc::new(UnreachableClient));
        let report = resolver.resolve(&mut config).await;

        assert_eq!(report.status, ResolutionStatus::PartiallyResolved);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            report.warnings[0],
            MetadataWarning::LayerSource { .. }
        ));
        // The manual metadata survives; only the control flag is cleared.
        assert_eq!(config.layers[0].md.title.as_deref(), Some("Manual Roads"));
        assert_eq!(config.layers[0].md.auto_metadata, None);
    }

    #[tokio::test]
    async fn cyclic_references_degrade_to_a_warning() {
        let mut config = config(indoc! {"
            caches:
              a:
                sources: [b]
              b:
                sources: [a]
            layers:
              - name: looping
                sources: [a]
                md:
                  auto_metadata: true
        "});

        let resolver = MetadataResolver::new(Arc::new(UnreachableClient));
        let report = resolver.resolve(&mut config).await;

        assert_eq!(report.status, ResolutionStatus::PartiallyResolved);
        assert!(matches!(
            report.warnings[0],
            MetadataWarning::SourceResolution { .. }
        ));
        // The layer keeps its flag; nothing was resolved for it.
        assert!(config.layers[0].md.auto_metadata());
    }
}
