use serde::{Deserialize, Serialize};

use crate::metadata::{AttributionMetadata, ContactMetadata, MetadataFragment};

/// The flattened result of merging manual metadata with source fragments.
///
/// Provenance is not retained; once merged, the origin of a field is gone.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedMetadata {
    /// Title.
    pub title: Option<String>,
    /// Abstract.
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    /// Fee statement.
    pub fees: Option<String>,
    /// Access constraints statement.
    pub access_constraints: Option<String>,
    /// Service online resource link.
    pub online_resource: Option<String>,
    /// Keywords: manual entries first, then fragment entries in encounter
    /// order, exact duplicates removed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Metadata URLs, unioned the same way as keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_urls: Vec<String>,
    /// Attribution, merged per sub-field.
    #[serde(default, skip_serializing_if = "AttributionMetadata::is_empty")]
    pub attribution: AttributionMetadata,
    /// Contact block, merged per sub-field.
    #[serde(default, skip_serializing_if = "ContactMetadata::is_empty")]
    pub contact: ContactMetadata,
}

/// First non-empty value in an ordered provider chain: the manual value,
/// then each fragment in the order its source was resolved.
fn first_filled<'a, F>(manual: &'a MetadataFragment, fragments: &'a [MetadataFragment], get: F) -> Option<String>
where
    F: Fn(&'a MetadataFragment) -> Option<&'a str>,
{
    std::iter::once(manual)
        .chain(fragments)
        .filter_map(&get)
        .find(|v| !v.trim().is_empty())
        .map(str::to_owned)
}

/// Union in encounter order: manual entries are prepended and never removed,
/// fragment entries follow, exact duplicates dropped.
fn union<'a, F>(manual: &'a MetadataFragment, fragments: &'a [MetadataFragment], get: F) -> Vec<String>
where
    F: Fn(&'a MetadataFragment) -> &'a [String],
{
    let mut out: Vec<String> = Vec::new();
    for value in std::iter::once(manual).chain(fragments).flat_map(get) {
        if !out.iter().any(|seen| seen == value) {
            out.push(value.clone());
        }
    }
    out
}

fn merge_contact(manual: &MetadataFragment, fragments: &[MetadataFragment]) -> ContactMetadata {
    let field = |get: fn(&ContactMetadata) -> Option<&str>| {
        first_filled(manual, fragments, |f| get(&f.contact))
    };
    ContactMetadata {
        person: field(|c| c.person.as_deref()),
        position: field(|c| c.position.as_deref()),
        organization: field(|c| c.organization.as_deref()),
        email: field(|c| c.email.as_deref()),
        phone: field(|c| c.phone.as_deref()),
        address: field(|c| c.address.as_deref()),
        city: field(|c| c.city.as_deref()),
        state: field(|c| c.state.as_deref()),
        postcode: field(|c| c.postcode.as_deref()),
        country: field(|c| c.country.as_deref()),
    }
}

fn merge_attribution(manual: &MetadataFragment, fragments: &[MetadataFragment]) -> AttributionMetadata {
    AttributionMetadata {
        title: first_filled(manual, fragments, |f| f.attribution.title.as_deref()),
        url: first_filled(manual, fragments, |f| f.attribution.url.as_deref()),
    }
}

/// Merges manually authored metadata with zero or more source fragments.
///
/// Scalar fields take the manual value when present and non-empty, otherwise
/// the first non-empty fragment value in resolution order. Collections are
/// unioned with manual entries prepended. The contact and attribution blocks
/// merge field by field, so a manually specified organization does not block
/// inheritance of an e-mail address.
///
/// Neither input is mutated; merging the same inputs twice produces
/// identical output.
#[must_use]
pub fn merge(manual: &MetadataFragment, fragments: &[MetadataFragment]) -> MergedMetadata {
    MergedMetadata {
        title: first_filled(manual, fragments, |f| f.title.as_deref()),
        abstract_: first_filled(manual, fragments, |f| f.abstract_.as_deref()),
        fees: first_filled(manual, fragments, |f| f.fees.as_deref()),
        access_constraints: first_filled(manual, fragments, |f| f.access_constraints.as_deref()),
        online_resource: first_filled(manual, fragments, |f| f.online_resource.as_deref()),
        keywords: union(manual, fragments, |f| &f.keywords),
        metadata_urls: union(manual, fragments, |f| &f.metadata_urls),
        attribution: merge_attribution(manual, fragments),
        contact: merge_contact(manual, fragments),
    }
}
