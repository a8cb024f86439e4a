//! Error taxonomy for the SOAP client.

use crate::envelope::Envelope;
use crate::fault::Fault;
use crate::xml::XmlError;

/// Result type alias for SOAP client operations.
pub type Result<T> = std::result::Result<T, SoapClientError>;

/// Errors surfaced by a send call or by envelope helpers.
///
/// The orchestrator wraps only the two XML-boundary failures; transport,
/// cancellation and handler errors pass through untouched so callers can
/// tell "my extension broke" apart from "the core broke".
#[derive(Debug, thiserror::Error)]
pub enum SoapClientError {
    /// A required input was absent or unusable.
    #[error("missing or invalid required argument: {0}")]
    InvalidArgument(&'static str),

    /// The request envelope could not be serialized to XML.
    /// Carries the envelope that failed.
    #[error("failed to serialize the SOAP envelope: {source}")]
    EnvelopeSerialization {
        /// The envelope that was being serialized.
        envelope: Box<Envelope>,
        /// The underlying XML failure.
        source: XmlError,
    },

    /// The response text could not be deserialized into an envelope.
    /// Carries the raw text that failed.
    #[error("failed to deserialize the SOAP envelope: {source}")]
    EnvelopeDeserialization {
        /// The XML text that was being deserialized.
        xml: String,
        /// The underlying XML failure.
        source: XmlError,
    },

    /// The transport collaborator failed; propagated unmodified.
    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The cancellation signal was honored.
    #[error("operation cancelled")]
    Cancelled,

    /// The remote service reported a SOAP fault.
    ///
    /// Never raised by the send orchestrator itself: a faulted response is
    /// returned successfully and becomes this error only through
    /// [`Envelope::ensure_not_faulted`].
    #[error("the remote service returned a SOAP fault: [{}] {}", .0.code, .0.string)]
    Fault(Box<Fault>),

    /// An error raised inside a registered handler; propagated unmodified.
    #[error("handler error: {0}")]
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl SoapClientError {
    /// Wraps a transport collaborator failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }

    /// Wraps a handler failure.
    pub fn handler(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Handler(Box::new(err))
    }

    /// Builds a handler failure from a plain message.
    pub fn handler_msg(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into().into())
    }
}
