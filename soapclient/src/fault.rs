//! SOAP fault model and best-effort extraction.

use xmltree::Element;

use crate::xml::{find_child, text_of};

/// A remote-side failure reported inside a SOAP Body.
///
/// Materialized only on the response path, when a caller asks a received
/// envelope for its fault. Field extraction is permissive: children that
/// are absent simply stay empty, the fault children are never
/// schema-validated.
#[derive(Debug, Clone)]
pub struct Fault {
    /// The fault code, e.g. `soapenv:Server`.
    pub code: String,
    /// Human-readable reason.
    pub string: String,
    /// Optional origin identifier.
    pub actor: Option<String>,
    /// Optional opaque detail fragment.
    pub detail: Option<Element>,
}

impl Fault {
    /// Extracts a fault from the reserved fault element.
    ///
    /// The caller is expected to have checked the fragment's qualified name
    /// first (see [`Envelope::is_faulted`](crate::Envelope::is_faulted)).
    pub fn from_element(element: &Element) -> Self {
        Self {
            code: find_child(element, "faultcode").map(text_of).unwrap_or_default(),
            string: find_child(element, "faultstring").map(text_of).unwrap_or_default(),
            actor: find_child(element, "faultactor").map(text_of).filter(|a| !a.is_empty()),
            detail: find_child(element, "detail").cloned(),
        }
    }
}
