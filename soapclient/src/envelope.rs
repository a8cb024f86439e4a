//! SOAP envelope data model.
//!
//! An [`Envelope`] carries an optional [`Header`] (an ordered, open-ended
//! collection of fragments) and a [`Body`] holding at most one payload
//! fragment. Fragments are opaque, self-describing XML elements; header
//! fragments are matched by qualified name only, never by position.

use xmltree::Element;

use crate::constants::{FAULT_LOCAL_NAME, SOAP_ENVELOPE_NS};
use crate::error::SoapClientError;
use crate::fault::Fault;
use crate::xml::{QName, XmlError, XmlObject};

/// A SOAP 1.1 envelope.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    /// Optional header fragment collection.
    pub header: Option<Header>,
    /// The envelope body.
    pub body: Body,
}

/// The SOAP header: an ordered sequence of opaque fragments.
#[derive(Debug, Clone, Default)]
pub struct Header {
    /// Header fragments, in insertion order.
    pub fragments: Vec<Element>,
}

/// The SOAP body, wrapping at most one payload fragment.
///
/// A valueless body serializes to an empty Body element; deserializing a
/// well-formed Body element always yields a present `Body`.
#[derive(Debug, Clone, Default)]
pub struct Body {
    /// The payload fragment, or a fault fragment on the response path.
    pub value: Option<Element>,
}

impl Envelope {
    /// Prepares an empty envelope.
    pub fn prepare() -> Self {
        Self::default()
    }

    /// Appends a header fragment, keeping existing ones.
    pub fn with_header(mut self, fragment: Element) -> Self {
        self.add_header(fragment);
        self
    }

    /// Appends a typed header in its fragment form.
    pub fn with_header_of<T: XmlObject>(self, header: &T) -> Self {
        self.with_header(header.to_element())
    }

    /// Appends several header fragments at once.
    pub fn with_headers(mut self, fragments: impl IntoIterator<Item = Element>) -> Self {
        for fragment in fragments {
            self.add_header(fragment);
        }
        self
    }

    /// Sets the body payload fragment.
    pub fn with_body(mut self, fragment: Element) -> Self {
        self.set_body(fragment);
        self
    }

    /// Sets a typed payload in its fragment form.
    pub fn with_body_of<T: XmlObject>(self, body: &T) -> Self {
        self.with_body(body.to_element())
    }

    /// Appends a header fragment in place. Intended for pipeline handlers
    /// mutating the envelope before serialization.
    pub fn add_header(&mut self, fragment: Element) {
        self.header
            .get_or_insert_with(Header::default)
            .fragments
            .push(fragment);
    }

    /// Replaces the body payload in place.
    pub fn set_body(&mut self, fragment: Element) {
        self.body.value = Some(fragment);
    }

    /// Looks up a header fragment by qualified name.
    ///
    /// An absent name yields `None`, never an error.
    pub fn header(&self, namespace: &str, local: &str) -> Option<&Element> {
        let want = QName::new(namespace, local);
        self.header
            .as_ref()?
            .fragments
            .iter()
            .find(|fragment| QName::of(fragment) == want)
    }

    /// Looks up a header by the qualified name a typed variant declares and
    /// projects it back into that variant.
    ///
    /// Yields `Ok(None)` when no fragment carries the name; conversion
    /// failures on a present fragment surface as errors.
    pub fn header_as<T: XmlObject>(&self) -> Result<Option<T>, XmlError> {
        let want = T::qualified_name();
        let fragment = self
            .header
            .as_ref()
            .and_then(|header| header.fragments.iter().find(|f| QName::of(f) == want));
        match fragment {
            Some(fragment) => T::from_element(fragment).map(Some),
            None => Ok(None),
        }
    }

    /// The body payload fragment, if any.
    pub fn body_fragment(&self) -> Option<&Element> {
        self.body.value.as_ref()
    }

    /// Extracts the body payload as a typed object.
    ///
    /// Fails with [`XmlError::EmptyBody`] when there is no payload and with
    /// [`XmlError::QualifiedNameMismatch`] when the payload is not what `T`
    /// declares (a received fault falls in this case).
    pub fn body_as<T: XmlObject>(&self) -> Result<T, XmlError> {
        let fragment = self.body.value.as_ref().ok_or(XmlError::EmptyBody)?;
        T::from_element(fragment)
    }

    /// Whether the body holds the reserved fault element.
    ///
    /// The check is namespace-qualified: only `Fault` in the SOAP 1.1
    /// envelope namespace counts, so application payloads that happen to be
    /// named `Fault` elsewhere are not misreported.
    pub fn is_faulted(&self) -> bool {
        self.body
            .value
            .as_ref()
            .map(|fragment| {
                QName::of(fragment) == QName::new(SOAP_ENVELOPE_NS, FAULT_LOCAL_NAME)
            })
            .unwrap_or(false)
    }

    /// Extracts the body as a [`Fault`], if it is one.
    pub fn fault(&self) -> Option<Fault> {
        if self.is_faulted() {
            self.body.value.as_ref().map(Fault::from_element)
        } else {
            None
        }
    }

    /// Asserts the envelope is not a remote fault.
    ///
    /// The send orchestrator never performs this check itself; a faulted
    /// response is returned successfully and only becomes an error when the
    /// caller asks for it here.
    pub fn ensure_not_faulted(&self) -> Result<(), SoapClientError> {
        match self.fault() {
            Some(fault) => Err(SoapClientError::Fault(Box::new(fault))),
            None => Ok(()),
        }
    }
}
