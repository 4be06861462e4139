use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::capabilities::{
    CapabilitiesError, CapabilitiesResult, CapabilityDocument, LayerRecord,
};

/// Root element names of the capability document versions we accept.
const ROOT_ELEMENTS: [&str; 2] = ["WMS_Capabilities", "WMT_MS_Capabilities"];

/// Parses raw capability document bytes into a [`CapabilityDocument`].
///
/// Accepts WMS 1.1.x (`WMT_MS_Capabilities`) and 1.3.0 (`WMS_Capabilities`)
/// documents. Layers are recorded in document order, parents before their
/// nested children; layers without a `<Name>` are dropped after parsing.
/// `url` only labels parse errors.
pub fn parse_capabilities(url: &str, body: &[u8]) -> CapabilitiesResult<CapabilityDocument> {
    let parse_error = |reason: String| CapabilitiesError::Parse {
        url: url.to_string(),
        reason,
    };

    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = true;

    let mut buf = Vec::new();
    let mut state = ParseState::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(parse_error(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if state.root_seen {
                    state.open_element(&name, &e);
                } else if ROOT_ELEMENTS.contains(&name.as_str()) {
                    state.root_seen = true;
                } else {
                    return Err(parse_error(format!("unexpected root element <{name}>")));
                }
                state.path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                if !state.root_seen {
                    return Err(parse_error(format!("unexpected root element <{name}>")));
                }
                state.open_element(&name, &e);
                // Self-closing elements see no End event, so the record a
                // bare <Layer/> opened must be closed here.
                if name == "Layer" {
                    state.layer_stack.pop();
                }
            }
            Ok(Event::Text(t)) => match t.unescape() {
                Ok(text) => state.text(&text),
                Err(e) => return Err(parse_error(e.to_string())),
            },
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                state.text(text.trim());
            }
            Ok(Event::End(_)) => {
                if state.path.pop().as_deref() == Some("Layer") {
                    state.layer_stack.pop();
                }
            }
            // Declarations, comments, doctypes and processing instructions
            // carry no capability metadata.
            Ok(_) => {}
        }
        buf.clear();
    }

    if !state.root_seen {
        return Err(parse_error("not a capabilities document".to_string()));
    }

    Ok(CapabilityDocument {
        service: state.document.service,
        layers: state
            .layers
            .into_iter()
            .filter(|l| l.name.is_some())
            .collect(),
    })
}

#[derive(Default)]
struct ParseState {
    root_seen: bool,
    /// Element names from the root down to the parent of the current event.
    path: Vec<String>,
    document: CapabilityDocument,
    /// All `<Layer>` elements in document order, named or not.
    layers: Vec<LayerRecord>,
    /// Indices into `layers` for the currently open `<Layer>` nesting.
    layer_stack: Vec<usize>,
}

impl ParseState {
    fn open_element(&mut self, name: &str, element: &BytesStart<'_>) {
        match name {
            "Layer" => {
                self.layers.push(LayerRecord::default());
                self.layer_stack.push(self.layers.len() - 1);
            }
            "OnlineResource" => {
                if let Some(href) = href_attribute(element) {
                    self.online_resource(href);
                }
            }
            _ => {}
        }
    }

    fn online_resource(&mut self, href: String) {
        if let Some(&idx) = self.layer_stack.last() {
            let layer = &mut self.layers[idx];
            if self.path.last().is_some_and(|p| p == "MetadataURL") {
                layer.metadata_urls.push(href);
            } else if self.path.last().is_some_and(|p| p == "Attribution") {
                layer.attribution.url = Some(href);
            }
        } else if self.path.last().is_some_and(|p| p == "Service") {
            self.document.service.online_resource = Some(href);
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&idx) = self.layer_stack.last() {
            let layer = &mut self.layers[idx];
            if ends_with(&self.path, &["Layer", "Name"]) {
                append(&mut layer.name, text);
            } else if ends_with(&self.path, &["Layer", "Title"]) {
                append(&mut layer.title, text);
            } else if ends_with(&self.path, &["Layer", "Abstract"]) {
                append(&mut layer.abstract_, text);
            } else if ends_with(&self.path, &["KeywordList", "Keyword"]) {
                layer.keywords.push(text.to_string());
            } else if ends_with(&self.path, &["Attribution", "Title"]) {
                append(&mut layer.attribution.title, text);
            }
        } else if self.path.get(1).is_some_and(|p| p == "Service") {
            let service = &mut self.document.service;
            if ends_with(&self.path, &["Service", "Title"]) {
                append(&mut service.title, text);
            } else if ends_with(&self.path, &["Service", "Abstract"]) {
                append(&mut service.abstract_, text);
            } else if ends_with(&self.path, &["Service", "Fees"]) {
                append(&mut service.fees, text);
            } else if ends_with(&self.path, &["Service", "AccessConstraints"]) {
                append(&mut service.access_constraints, text);
            } else if ends_with(&self.path, &["KeywordList", "Keyword"]) {
                service.keywords.push(text.to_string());
            } else if self.path.iter().any(|p| p == "ContactInformation") {
                let contact = &mut service.contact;
                let field = match self.path.last().map(String::as_str) {
                    Some("ContactPerson") => &mut contact.person,
                    Some("ContactPosition") => &mut contact.position,
                    Some("ContactOrganization") => &mut contact.organization,
                    Some("ContactElectronicMailAddress") => &mut contact.email,
                    Some("ContactVoiceTelephone") => &mut contact.phone,
                    Some("Address") => &mut contact.address,
                    Some("City") => &mut contact.city,
                    Some("StateOrProvince") => &mut contact.state,
                    Some("PostCode") => &mut contact.postcode,
                    Some("Country") => &mut contact.country,
                    _ => return,
                };
                append(field, text);
            }
        }
    }
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn href_attribute(element: &BytesStart<'_>) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"href")
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path[path.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}

/// Text nodes may arrive in several events; later chunks are appended.
fn append(field: &mut Option<String>, text: &str) {
    match field {
        Some(existing) => existing.push_str(text),
        None => *field = Some(text.to_string()),
    }
}
