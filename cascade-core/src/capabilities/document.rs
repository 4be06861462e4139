use crate::metadata::{AttributionMetadata, ContactMetadata};

/// A parsed capability document.
///
/// Owned by the [`CapabilitiesCache`](super::CapabilitiesCache) once
/// inserted; everything downstream only ever sees a shared read-only view,
/// so no field is mutated after parsing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapabilityDocument {
    /// Service-level metadata.
    pub service: ServiceRecord,
    /// Named advertised layers, in document order.
    ///
    /// Group layers without a `<Name>` element cannot be addressed by a
    /// `GetMap` request and are not recorded; their named children are.
    pub layers: Vec<LayerRecord>,
}

/// Service-level metadata advertised by a capability document.
///
/// Every field is optional; absence means the upstream did not advertise it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceRecord {
    /// `<Service><Title>`.
    pub title: Option<String>,
    /// `<Service><Abstract>`.
    pub abstract_: Option<String>,
    /// `<Service><Fees>`.
    pub fees: Option<String>,
    /// `<Service><AccessConstraints>`.
    pub access_constraints: Option<String>,
    /// `<Service><OnlineResource xlink:href>`.
    pub online_resource: Option<String>,
    /// `<Service><KeywordList><Keyword>` entries, in document order.
    pub keywords: Vec<String>,
    /// `<Service><ContactInformation>` sub-fields.
    pub contact: ContactMetadata,
}

/// One named layer advertised by a capability document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerRecord {
    /// `<Layer><Name>`, case-sensitive as advertised.
    pub name: Option<String>,
    /// `<Layer><Title>`.
    pub title: Option<String>,
    /// `<Layer><Abstract>`.
    pub abstract_: Option<String>,
    /// `<Layer><KeywordList><Keyword>` entries, in document order.
    pub keywords: Vec<String>,
    /// `<Layer><MetadataURL><OnlineResource xlink:href>` entries, in document order.
    pub metadata_urls: Vec<String>,
    /// `<Layer><Attribution>`.
    pub attribution: AttributionMetadata,
}
