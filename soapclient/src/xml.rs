//! XML engine boundary: qualified names, fragment helpers and the
//! envelope serialization contract.
//!
//! Fragments are [`xmltree::Element`] values. Each fragment is
//! self-describing: it carries its own qualified name and, when built
//! programmatically, its own `xmlns` declarations. The helpers in this
//! module resolve qualified names uniformly for both parsed elements
//! (where xmltree fills in `namespace`) and hand-built ones (where the
//! namespace lives in an `xmlns`/`xmlns:p` attribute).

use std::fmt;

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::constants::{SOAP_ENVELOPE_NS, SOAP_ENVELOPE_PREFIX};
use crate::envelope::{Body, Envelope, Header};

/// A namespace-qualified XML name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    /// Namespace URI, if any.
    pub namespace: Option<String>,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    /// Creates a namespace-qualified name.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// Creates a name with no namespace.
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Resolves the qualified name of a fragment.
    pub fn of(element: &Element) -> Self {
        Self {
            namespace: namespace_of(element),
            local: local_name(element).to_string(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// Errors raised at the XML boundary.
///
/// Parse failures (malformed input) and schema mismatches (well-formed
/// input that does not carry the expected qualified names) are distinct
/// variants so callers can branch on which one occurred.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The input is not well-formed XML.
    #[error("XML parse error: {0}")]
    Parse(#[from] xmltree::ParseError),

    /// The XML writer failed while emitting.
    #[error("XML write error: {0}")]
    Write(#[from] xmltree::Error),

    /// The XML writer produced bytes that are not valid UTF-8.
    #[error("invalid UTF-8 in XML output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The input was empty or whitespace-only.
    #[error("empty XML document")]
    EmptyDocument,

    /// The root element is not an Envelope in the SOAP 1.1 namespace.
    #[error("root element {0} is not a SOAP 1.1 Envelope")]
    NotAnEnvelope(QName),

    /// The envelope has no Body child.
    #[error("SOAP envelope has no Body element")]
    MissingBody,

    /// The body holds no fragment to extract.
    #[error("SOAP Body is empty")]
    EmptyBody,

    /// A fragment's qualified name does not match the expected one.
    #[error("qualified name mismatch: expected {expected}, found {found}")]
    QualifiedNameMismatch { expected: QName, found: QName },

    /// A field held text that could not be interpreted.
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// A typed object with a two-way, lossless projection to a fragment.
///
/// Conversion to a fragment serializes the object under its own declared
/// qualified name; conversion back checks the declared name against the
/// fragment's and fails with [`XmlError::QualifiedNameMismatch`] when they
/// differ.
pub trait XmlObject: Sized {
    /// The qualified name this object serializes under.
    fn qualified_name() -> QName;

    /// Projects the object into its self-describing fragment form.
    fn to_element(&self) -> Element;

    /// Rebuilds the object from a fragment.
    fn from_element(element: &Element) -> Result<Self, XmlError>;
}

/// Fails with [`XmlError::QualifiedNameMismatch`] unless `element` carries
/// the qualified name declared by `T`.
pub fn ensure_qualified_name<T: XmlObject>(element: &Element) -> Result<(), XmlError> {
    let expected = T::qualified_name();
    let found = QName::of(element);
    if expected == found {
        Ok(())
    } else {
        Err(XmlError::QualifiedNameMismatch { expected, found })
    }
}

/// Local part of an element name, with any prefix stripped.
pub fn local_name(element: &Element) -> &str {
    element
        .name
        .split_once(':')
        .map(|(_, local)| local)
        .unwrap_or(&element.name)
}

/// Namespace URI of an element.
///
/// Parsed elements carry it directly; hand-built elements are resolved
/// through their own `xmlns`/`xmlns:prefix` attributes.
pub fn namespace_of(element: &Element) -> Option<String> {
    if let Some(ns) = &element.namespace {
        return Some(ns.clone());
    }
    let prefix = element
        .name
        .split_once(':')
        .map(|(prefix, _)| prefix)
        .or(element.prefix.as_deref());
    match prefix {
        Some(p) => element.attributes.get(&format!("xmlns:{p}")).cloned(),
        None => element.attributes.get("xmlns").cloned(),
    }
}

/// Iterates over the element children of a fragment, skipping text nodes.
pub fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(XMLNode::as_element)
}

/// First child whose local name matches, regardless of prefix.
pub fn find_child<'a>(element: &'a Element, local: &str) -> Option<&'a Element> {
    child_elements(element).find(|child| local_name(child) == local)
}

/// First child matching a full qualified name.
pub fn find_child_qualified<'a>(
    element: &'a Element,
    namespace: &str,
    local: &str,
) -> Option<&'a Element> {
    child_elements(element).find(|child| {
        local_name(child) == local && namespace_of(child).as_deref() == Some(namespace)
    })
}

/// Concatenated text content of an element.
pub fn text_of(element: &Element) -> String {
    element
        .get_text()
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

/// Attribute lookup by local name, tolerant of prefixed attribute keys.
pub fn attribute<'a>(element: &'a Element, local: &str) -> Option<&'a str> {
    element
        .attributes
        .iter()
        .find(|(key, _)| {
            !key.starts_with("xmlns") && key.rsplit(':').next() == Some(local)
        })
        .map(|(_, value)| value.as_str())
}

/// Appends a prefixed child element holding only text.
pub fn push_text_child(parent: &mut Element, name: &str, text: impl Into<String>) {
    let mut child = Element::new(name);
    child.children.push(XMLNode::Text(text.into()));
    parent.children.push(XMLNode::Element(child));
}

/// The envelope serialization contract: object ⇄ namespace-qualified text.
///
/// Injectable through [`SoapClientSettings`](crate::client::SoapClientSettings)
/// so tests can substitute the engine and exercise the two XML-boundary
/// failures of the send orchestrator.
pub trait EnvelopeSerializer: Send + Sync {
    /// Serializes an envelope to XML text with no declaration and no
    /// indentation.
    fn to_xml(&self, envelope: &Envelope) -> Result<String, XmlError>;

    /// Parses XML text into an envelope.
    ///
    /// Blank input yields `Ok(None)`. Malformed input fails with
    /// [`XmlError::Parse`]; a well-formed document whose root is not an
    /// Envelope in the SOAP 1.1 namespace fails with
    /// [`XmlError::NotAnEnvelope`].
    fn from_xml(&self, xml: &str) -> Result<Option<Envelope>, XmlError>;
}

/// Default [`EnvelopeSerializer`] backed by xmltree.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmltreeSerializer;

impl XmltreeSerializer {
    fn envelope_to_element(envelope: &Envelope) -> Element {
        let mut root = Element::new(&format!("{SOAP_ENVELOPE_PREFIX}:Envelope"));
        root.attributes.insert(
            format!("xmlns:{SOAP_ENVELOPE_PREFIX}"),
            SOAP_ENVELOPE_NS.to_string(),
        );

        if let Some(header) = &envelope.header {
            let mut header_elem = Element::new(&format!("{SOAP_ENVELOPE_PREFIX}:Header"));
            for fragment in &header.fragments {
                header_elem
                    .children
                    .push(XMLNode::Element(fragment.clone()));
            }
            root.children.push(XMLNode::Element(header_elem));
        }

        // An empty Body element is still emitted: the Body child is
        // mandatory on the wire even when there is no payload.
        let mut body_elem = Element::new(&format!("{SOAP_ENVELOPE_PREFIX}:Body"));
        if let Some(fragment) = &envelope.body.value {
            body_elem.children.push(XMLNode::Element(fragment.clone()));
        }
        root.children.push(XMLNode::Element(body_elem));

        root
    }
}

impl EnvelopeSerializer for XmltreeSerializer {
    fn to_xml(&self, envelope: &Envelope) -> Result<String, XmlError> {
        let root = Self::envelope_to_element(envelope);

        let mut buf = Vec::new();
        let config = EmitterConfig::new()
            .write_document_declaration(false)
            .perform_indent(false);
        root.write_with_config(&mut buf, config)?;

        Ok(String::from_utf8(buf)?)
    }

    fn from_xml(&self, xml: &str) -> Result<Option<Envelope>, XmlError> {
        if xml.trim().is_empty() {
            return Ok(None);
        }

        let root = Element::parse(xml.as_bytes())?;

        let root_name = QName::of(&root);
        if root_name != QName::new(SOAP_ENVELOPE_NS, "Envelope") {
            return Err(XmlError::NotAnEnvelope(root_name));
        }

        let header = find_child_qualified(&root, SOAP_ENVELOPE_NS, "Header").map(|elem| Header {
            fragments: child_elements(elem).cloned().collect(),
        });

        let body_elem = find_child_qualified(&root, SOAP_ENVELOPE_NS, "Body")
            .ok_or(XmlError::MissingBody)?;
        let body = Body {
            value: child_elements(body_elem).next().cloned(),
        };

        Ok(Some(Envelope { header, body }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(prefix_name: &str, ns_attr: &str, ns: &str, text: &str) -> Element {
        let mut elem = Element::new(prefix_name);
        elem.attributes.insert(ns_attr.to_string(), ns.to_string());
        elem.children.push(XMLNode::Text(text.to_string()));
        elem
    }

    #[test]
    fn serializes_without_declaration_or_indent() {
        let envelope = Envelope::prepare().with_body(fragment(
            "u:Ping",
            "xmlns:u",
            "urn:example",
            "1",
        ));

        let xml = XmltreeSerializer.to_xml(&envelope).unwrap();
        assert!(!xml.contains("<?xml"));
        assert!(!xml.contains('\n'));
        assert!(xml.contains("soapenv:Envelope"));
        assert!(xml.contains("soapenv:Body"));
        assert!(xml.contains(">1<"));
    }

    #[test]
    fn empty_body_still_emits_body_element() {
        let xml = XmltreeSerializer.to_xml(&Envelope::prepare()).unwrap();
        assert!(xml.contains("Body"));
    }

    #[test]
    fn round_trips_header_and_body_by_qualified_name() {
        let envelope = Envelope::prepare()
            .with_header(fragment("h:Trace", "xmlns:h", "urn:headers", "abc"))
            .with_body(fragment("u:Ping", "xmlns:u", "urn:example", "1"));

        let xml = XmltreeSerializer.to_xml(&envelope).unwrap();
        let parsed = XmltreeSerializer.from_xml(&xml).unwrap().unwrap();

        let header = parsed.header.as_ref().unwrap();
        assert_eq!(header.fragments.len(), 1);
        assert_eq!(
            QName::of(&header.fragments[0]),
            QName::new("urn:headers", "Trace")
        );
        assert_eq!(text_of(&header.fragments[0]), "abc");

        let body = parsed.body.value.as_ref().unwrap();
        assert_eq!(QName::of(body), QName::new("urn:example", "Ping"));
        assert_eq!(text_of(body), "1");
    }

    #[test]
    fn blank_input_yields_none() {
        assert!(XmltreeSerializer.from_xml("").unwrap().is_none());
        assert!(XmltreeSerializer.from_xml("   \n ").unwrap().is_none());
    }

    #[test]
    fn malformed_input_is_a_parse_failure() {
        let err = XmltreeSerializer.from_xml("<open").unwrap_err();
        assert!(matches!(err, XmlError::Parse(_)));
    }

    #[test]
    fn wrong_root_namespace_is_a_schema_mismatch() {
        let xml = r#"<s:Envelope xmlns:s="urn:not-soap"><s:Body/></s:Envelope>"#;
        let err = XmltreeSerializer.from_xml(xml).unwrap_err();
        assert!(matches!(err, XmlError::NotAnEnvelope(_)));
    }

    #[test]
    fn envelope_without_body_is_rejected() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"/>"#;
        let err = XmltreeSerializer.from_xml(xml).unwrap_err();
        assert!(matches!(err, XmlError::MissingBody));
    }

    #[test]
    fn empty_parsed_body_is_present_but_valueless() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body/></s:Envelope>"#;
        let parsed = XmltreeSerializer.from_xml(xml).unwrap().unwrap();
        assert!(parsed.body.value.is_none());
    }

    #[test]
    fn qualified_name_resolution_covers_parsed_and_built_fragments() {
        let built = fragment("u:Ping", "xmlns:u", "urn:example", "1");
        assert_eq!(QName::of(&built), QName::new("urn:example", "Ping"));

        let parsed =
            Element::parse(r#"<u:Ping xmlns:u="urn:example">1</u:Ping>"#.as_bytes()).unwrap();
        assert_eq!(QName::of(&parsed), QName::new("urn:example", "Ping"));

        let default_ns =
            Element::parse(r#"<Ping xmlns="urn:example"/>"#.as_bytes()).unwrap();
        assert_eq!(QName::of(&default_ns), QName::new("urn:example", "Ping"));
    }
}
