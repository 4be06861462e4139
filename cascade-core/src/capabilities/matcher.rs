use crate::capabilities::{CapabilitiesError, CapabilitiesResult, LayerRecord};

/// Selects the advertised layer backing a target layer name.
///
/// Without a target name the document must advertise exactly one layer;
/// zero layers is [`CapabilitiesError::LayerNotFound`] and more than one is
/// [`CapabilitiesError::LayerAmbiguous`]. With a target name, strategies
/// apply in strict order, stopping at the first that yields a candidate:
///
/// 1. exact, case-sensitive name equality
/// 2. case-insensitive name equality
/// 3. substring containment in either direction, case-insensitive
///
/// Within a strategy tier, ties break by document order; there is no
/// scoring. `url` only labels the returned error.
pub fn match_layer<'a>(
    url: &str,
    target: Option<&str>,
    layers: &'a [LayerRecord],
) -> CapabilitiesResult<&'a LayerRecord> {
    let Some(target) = target else {
        return match layers {
            [only] => Ok(only),
            [] => Err(CapabilitiesError::LayerNotFound {
                url: url.to_string(),
                name: None,
            }),
            _ => Err(CapabilitiesError::LayerAmbiguous {
                url: url.to_string(),
                candidates: layers.len(),
            }),
        };
    };

    let target_lower = target.to_lowercase();
    let strategies: [&dyn Fn(&str) -> bool; 3] = [
        &|name| name == target,
        &|name| name.to_lowercase() == target_lower,
        &|name| {
            let name = name.to_lowercase();
            name.contains(&target_lower) || target_lower.contains(&name)
        },
    ];

    for matches in strategies {
        if let Some(layer) = layers
            .iter()
            .find(|l| l.name.as_deref().is_some_and(matches))
        {
            return Ok(layer);
        }
    }

    Err(CapabilitiesError::LayerNotFound {
        url: url.to_string(),
        name: Some(target.to_string()),
    })
}
