//! Walks a layer's source references down to terminal WMS declarations.
//!
//! A reference is either `name` or `name:layer`. Names resolve against
//! `sources` first, then `caches`; caches recurse into their own source list.
//! Non-WMS sources and unknown names are skipped, so a broken reference can
//! never prevent the rest of a layer from resolving.

use tracing::warn;

use crate::config::{Config, ConfigFileError, ConfigFileResult, SourceConfig, WmsSourceConfig};

/// How many levels of cache nesting a reference chain may cross.
pub const DEFAULT_MAX_SOURCE_DEPTH: usize = 16;

/// A terminal WMS declaration reached by following a layer's references,
/// together with the upstream layer name to look up in its capabilities.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedWmsSource<'a> {
    /// Name of the source in the configuration.
    pub name: &'a str,
    pub source: &'a WmsSourceConfig,
    /// Upstream layer name. `None` means the document is expected to expose
    /// exactly one named layer.
    pub target_layer: Option<String>,
}

/// Resolves a list of source references into the WMS declarations behind
/// them, in reference order.
pub fn resolve_wms_sources<'a>(
    config: &'a Config,
    references: &[String],
    max_depth: usize,
) -> ConfigFileResult<Vec<ResolvedWmsSource<'a>>> {
    let mut resolved = Vec::new();
    for reference in references {
        resolve_reference(config, reference, max_depth, max_depth, &mut resolved)?;
    }
    Ok(resolved)
}

fn resolve_reference<'a>(
    config: &'a Config,
    reference: &str,
    depth: usize,
    max_depth: usize,
    resolved: &mut Vec<ResolvedWmsSource<'a>>,
) -> ConfigFileResult<()> {
    if depth == 0 {
        return Err(ConfigFileError::SourceCycle {
            reference: reference.to_string(),
            max_depth,
        });
    }

    let (name, suffix) = match reference.split_once(':') {
        Some((name, suffix)) => (name, Some(suffix)),
        None => (reference, None),
    };

    if let Some((name, source)) = config.sources.get_key_value(name) {
        if let SourceConfig::Wms(wms) = source {
            // A qualified reference may carry namespace colons of its own;
            // the upstream layer name is the last token.
            let target_layer = suffix
                .and_then(|s| s.rsplit(':').next())
                .map(ToOwned::to_owned)
                .or_else(|| wms.first_layer());
            resolved.push(ResolvedWmsSource {
                name,
                source: wms,
                target_layer,
            });
        }
        return Ok(());
    }

    if let Some(cache) = config.caches.get(name) {
        if suffix.is_some() {
            warn!("Ignoring layer suffix on cache reference '{reference}'");
        }
        for nested in &cache.sources {
            resolve_reference(config, nested, depth - 1, max_depth, resolved)?;
        }
        return Ok(());
    }

    warn!("Source reference '{reference}' matches no configured source or cache, skipping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::parse_config;

    fn config(yaml: &str) -> Config {
        parse_config(yaml, &PathBuf::from("test.yaml")).unwrap()
    }

    fn resolve<'a>(config: &'a Config, refs: &[&str]) -> Vec<ResolvedWmsSource<'a>> {
        let refs: Vec<String> = refs.iter().map(ToString::to_string).collect();
        resolve_wms_sources(config, &refs, DEFAULT_MAX_SOURCE_DEPTH).unwrap()
    }

    #[test]
    fn resolves_a_direct_wms_reference() {
        let config = config(indoc! {"
            sources:
              upstream:
                type: wms
                req:
                  url: https://example.com/wms
                  layers: roads,rivers
        "});
        let resolved = resolve(&config, &["upstream"]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "upstream");
        assert_eq!(resolved[0].target_layer.as_deref(), Some("roads"));
    }

    #[test]
    fn reference_suffix_overrides_the_declared_layer() {
        let config = config(indoc! {"
            sources:
              upstream:
                type: wms
                req:
                  url: https://example.com/wms
                  layers: roads
        "});
        let resolved = resolve(&config, &["upstream:rivers"]);
        assert_eq!(resolved[0].target_layer.as_deref(), Some("rivers"));
    }

    #[test]
    fn namespaced_suffix_uses_the_last_token() {
        let config = config(indoc! {"
            sources:
              upstream:
                type: wms
                req:
                  url: https://example.com/wms
        "});
        let resolved = resolve(&config, &["upstream:transport:roads"]);
        assert_eq!(resolved[0].target_layer.as_deref(), Some("roads"));
    }

    #[test]
    fn undeclared_layer_list_leaves_the_target_open() {
        let config = config(indoc! {"
            sources:
              upstream:
                type: wms
                req:
                  url: https://example.com/wms
        "});
        let resolved = resolve(&config, &["upstream"]);
        assert_eq!(resolved[0].target_layer, None);
    }

    #[test]
    fn recurses_through_caches() {
        let config = config(indoc! {"
            sources:
              left:
                type: wms
                req:
                  url: https://left.example.com/wms
                  layers: roads
              right:
                type: wms
                req:
                  url: https://right.example.com/wms
                  layers: rivers
            caches:
              inner:
                sources: [right]
              outer:
                sources: [left, inner]
        "});
        let resolved = resolve(&config, &["outer"]);
        let names: Vec<&str> = resolved.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["left", "right"]);
    }

    #[test]
    fn skips_non_wms_sources_and_unknown_references() {
        let config = config(indoc! {"
            sources:
              tiles:
                type: tile
                url: https://tiles.example.com/{z}/{x}/{y}.png
              upstream:
                type: wms
                req:
                  url: https://example.com/wms
                  layers: roads
        "});
        let resolved = resolve(&config, &["tiles", "missing", "upstream"]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "upstream");
    }

    #[test]
    fn cyclic_cache_references_error_out() {
        let config = config(indoc! {"
            caches:
              a:
                sources: [b]
              b:
                sources: [a]
        "});
        let refs = vec!["a".to_string()];
        let err = resolve_wms_sources(&config, &refs, DEFAULT_MAX_SOURCE_DEPTH).unwrap_err();
        assert!(matches!(err, ConfigFileError::SourceCycle { .. }));
    }
}
