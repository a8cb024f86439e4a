//! # soapclient: SOAP 1.1 over HTTP with a handler pipeline
//!
//! This crate builds, transmits and receives SOAP 1.1 envelopes over HTTP
//! and lets callers observe or mutate the exchange at four fire points:
//! before the request envelope is serialized, before the HTTP request is
//! transmitted, after the HTTP response is received, and after the
//! response envelope is deserialized.
//!
//! ## Features
//!
//! - Envelope model with an open-ended header collection (fragments are
//!   matched by qualified name, never by position)
//! - Typed header catalog: WS-Addressing Action/To and a WS-Security
//!   username-token header with timestamp
//! - Ordered, four-stage handler pipeline with mutation visibility
//! - Namespace-qualified fault detection on received envelopes
//! - Pluggable transport and envelope serializer
//!
//! ## Example
//!
//! ```no_run
//! use soapclient::{headers, Envelope, SoapClient, XmlObject};
//! use soapclient::xmltree::Element;
//!
//! # async fn run() -> soapclient::Result<()> {
//! let client = SoapClient::builder()
//!     .on_envelope_request(
//!         |_, args| {
//!             args.envelope.add_header(
//!                 headers::username_token_and_password_text("some-user", "some-password")
//!                     .to_element(),
//!             );
//!             Ok(())
//!         },
//!         0,
//!     )
//!     .build();
//!
//! let mut payload = Element::new("u:IsAliveRequest");
//! payload
//!     .attributes
//!     .insert("xmlns:u".to_string(), "http://services.company.com".to_string());
//!
//! let response = client
//!     .send(
//!         "https://services.company.com/Service.svc",
//!         "http://services.company.com/IService/IsAlive",
//!         Envelope::prepare().with_body(payload),
//!     )
//!     .await?;
//!
//! response.ensure_not_faulted()?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod fault;
pub mod handler;
pub mod headers;
mod pipeline;
pub mod transport;
pub mod xml;

pub use client::{SoapClient, SoapClientBuilder, SoapClientSettings};
pub use envelope::{Body, Envelope, Header};
pub use error::{Result, SoapClientError};
pub use fault::Fault;
pub use handler::{
    DelegatingSoapHandler, EnvelopeRequestArgs, EnvelopeResponseArgs, HttpRequestArgs,
    HttpResponseArgs, SoapHandler,
};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, SoapTransport};
pub use xml::{EnvelopeSerializer, QName, XmlError, XmlObject, XmltreeSerializer};

// Fragments are xmltree elements; re-exported so callers build payloads
// without pinning the same version themselves.
pub use xmltree;
