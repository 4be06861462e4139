use cascade_core::metadata::{
    AttributionMetadata, ContactMetadata, MergedMetadata, MetadataFragment,
};
use serde::{Deserialize, Serialize};

use crate::config::{UnrecognizedKeys, UnrecognizedValues};

/// The `md` block of a layer or of the WMS service.
///
/// All fields are hand-authored metadata; `auto_metadata` is a control flag
/// that enables inheritance from upstream capability documents and is never
/// part of the metadata itself.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataBlock {
    /// When `true`, missing fields are inherited from the upstream WMS
    /// sources during configuration load. Absent means disabled.
    pub auto_metadata: Option<bool>,

    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub fees: Option<String>,
    pub access_constraints: Option<String>,
    pub online_resource: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "AttributionMetadata::is_empty")]
    pub attribution: AttributionMetadata,
    #[serde(default, skip_serializing_if = "ContactMetadata::is_empty")]
    pub contact: ContactMetadata,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl MetadataBlock {
    /// Returns the unrecognized keys of this block, prefixed with its path.
    #[must_use]
    pub fn get_unrecognized_keys_with_prefix(&self, prefix: &str) -> UnrecognizedKeys {
        self.unrecognized
            .keys()
            .map(|k| format!("{prefix}{k}"))
            .collect()
    }

    /// Whether automatic metadata inheritance is enabled for this block.
    #[must_use]
    pub fn auto_metadata(&self) -> bool {
        self.auto_metadata.unwrap_or(false)
    }

    /// The manually authored metadata as the highest-priority merge input.
    /// The `auto_metadata` flag is not part of the fragment.
    #[must_use]
    pub fn to_fragment(&self) -> MetadataFragment {
        MetadataFragment {
            title: self.title.clone(),
            abstract_: self.abstract_.clone(),
            fees: self.fees.clone(),
            access_constraints: self.access_constraints.clone(),
            online_resource: self.online_resource.clone(),
            keywords: self.keywords.clone(),
            metadata_urls: self.metadata_urls.clone(),
            attribution: self.attribution.clone(),
            contact: self.contact.clone(),
        }
    }

    /// Rebuilds the block from a merge result. The control flag is dropped;
    /// re-running resolution over an already resolved configuration is a
    /// no-op.
    #[must_use]
    pub fn from_merged(merged: MergedMetadata) -> Self {
        Self {
            auto_metadata: None,
            title: merged.title,
            abstract_: merged.abstract_,
            fees: merged.fees,
            access_constraints: merged.access_constraints,
            online_resource: merged.online_resource,
            keywords: merged.keywords,
            metadata_urls: merged.metadata_urls,
            attribution: merged.attribution,
            contact: merged.contact,
            unrecognized: UnrecognizedValues::default(),
        }
    }
}
