//! Metadata fragments and the manual-wins merge.
//!
//! A *fragment* is one source's contribution of partial metadata: either the
//! matched layer record of an upstream capability document, or the upstream's
//! service record. Fragments are merged with manually authored metadata by
//! [`merge`], which never mutates its inputs.

use serde::{Deserialize, Serialize};

use crate::capabilities::{LayerRecord, ServiceRecord};

mod merge;
pub use merge::{MergedMetadata, merge};

/// Contact information, merged field by field rather than as an atomic block.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMetadata {
    /// Contact person.
    pub person: Option<String>,
    /// Contact position or role.
    pub position: Option<String>,
    /// Contact organization.
    pub organization: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Voice telephone number.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State or province.
    pub state: Option<String>,
    /// Postal code.
    pub postcode: Option<String>,
    /// Country.
    pub country: Option<String>,
}

impl ContactMetadata {
    /// Returns `true` if no sub-field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Attribution of a layer, typically the data provider.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionMetadata {
    /// Human-readable attribution text.
    pub title: Option<String>,
    /// Link to the attributed party.
    pub url: Option<String>,
}

impl AttributionMetadata {
    /// Returns `true` if no sub-field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One source's contribution of partial metadata to a merge.
///
/// The same shape also carries the manually authored metadata into
/// [`merge`], since the priority rule treats it as just the highest-priority
/// provider in the chain.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFragment {
    /// Title.
    pub title: Option<String>,
    /// Abstract. For fragments built from a layer record that advertises
    /// both a title and an abstract, this is already the combined
    /// `"{title}: {abstract}"` form.
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    /// Fee statement.
    pub fees: Option<String>,
    /// Access constraints statement.
    pub access_constraints: Option<String>,
    /// Service online resource link.
    pub online_resource: Option<String>,
    /// Keywords, in encounter order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Metadata URLs, in encounter order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_urls: Vec<String>,
    /// Attribution, merged per sub-field.
    #[serde(default, skip_serializing_if = "AttributionMetadata::is_empty")]
    pub attribution: AttributionMetadata,
    /// Contact block, merged per sub-field.
    #[serde(default, skip_serializing_if = "ContactMetadata::is_empty")]
    pub contact: ContactMetadata,
}

impl From<&LayerRecord> for MetadataFragment {
    fn from(layer: &LayerRecord) -> Self {
        // The combined "{title}: {abstract}" form is baked into the fragment
        // here, before any merge priority is applied.
        let abstract_ = match (&layer.title, &layer.abstract_) {
            (Some(title), Some(abstract_)) if !title.is_empty() && !abstract_.is_empty() => {
                Some(format!("{title}: {abstract_}"))
            }
            _ => layer.abstract_.clone(),
        };
        Self {
            title: layer.title.clone(),
            abstract_,
            keywords: layer.keywords.clone(),
            metadata_urls: layer.metadata_urls.clone(),
            attribution: layer.attribution.clone(),
            ..Self::default()
        }
    }
}

impl From<&ServiceRecord> for MetadataFragment {
    fn from(service: &ServiceRecord) -> Self {
        Self {
            title: service.title.clone(),
            abstract_: service.abstract_.clone(),
            fees: service.fees.clone(),
            access_constraints: service.access_constraints.clone(),
            online_resource: service.online_resource.clone(),
            keywords: service.keywords.clone(),
            contact: service.contact.clone(),
            ..Self::default()
        }
    }
}
