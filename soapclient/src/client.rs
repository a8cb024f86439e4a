//! The SOAP client and its send orchestrator.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::constants::{SOAP_ACTION_HEADER, SOAP_CONTENT_TYPE};
use crate::envelope::Envelope;
use crate::error::{Result, SoapClientError};
use crate::handler::{
    DelegatingSoapHandler, EnvelopeRequestArgs, EnvelopeResponseArgs, HttpRequestArgs,
    HttpResponseArgs, SoapHandler,
};
use crate::pipeline::HandlerPipeline;
use crate::transport::{HttpRequest, ReqwestTransport, SoapTransport};
use crate::xml::{EnvelopeSerializer, XmlError, XmltreeSerializer};

/// Client configuration, passed in at construction time.
///
/// Carries the envelope serializer (the XML engine boundary) so it can be
/// substituted in tests, and the content type sent with every request.
#[derive(Clone)]
pub struct SoapClientSettings {
    /// The envelope serialization engine.
    pub serializer: Arc<dyn EnvelopeSerializer>,
    /// Content type of outbound requests.
    pub content_type: String,
}

impl Default for SoapClientSettings {
    fn default() -> Self {
        Self {
            serializer: Arc::new(XmltreeSerializer),
            content_type: SOAP_CONTENT_TYPE.to_string(),
        }
    }
}

/// A SOAP 1.1 client.
///
/// Multiple send calls may run concurrently against the same instance.
/// Each call snapshots the handler collection at its start, so handlers
/// registered while a call is in flight only take effect for calls that
/// begin afterwards.
pub struct SoapClient {
    transport: Arc<dyn SoapTransport>,
    handlers: RwLock<Vec<Arc<dyn SoapHandler>>>,
    settings: SoapClientSettings,
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SoapClient {
    /// Creates a client with default settings over a reqwest transport.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a client.
    pub fn builder() -> SoapClientBuilder {
        SoapClientBuilder::default()
    }

    /// The client settings.
    pub fn settings(&self) -> &SoapClientSettings {
        &self.settings
    }

    /// Registers a handler. Takes effect for calls that begin after
    /// registration completes.
    pub fn add_handler(&self, handler: Arc<dyn SoapHandler>) {
        self.handlers.write().push(handler);
    }

    /// Sends an envelope and returns the response envelope.
    ///
    /// Convenience wrapper over [`send_with_cancellation`](Self::send_with_cancellation)
    /// with a token that is never cancelled.
    pub async fn send(&self, url: &str, action: &str, envelope: Envelope) -> Result<Envelope> {
        self.send_with_cancellation(url, action, envelope, &CancellationToken::new())
            .await
    }

    /// Sends an envelope, driving the handler pipeline around
    /// serialization, transmission and deserialization.
    ///
    /// Stages run strictly in sequence:
    ///
    /// 1. validate the destination;
    /// 2. fire `OnEnvelopeRequest` over the mutable request envelope;
    /// 3. serialize it (failures surface as
    ///    [`SoapClientError::EnvelopeSerialization`] and nothing is
    ///    transmitted);
    /// 4. build the POST request and fire `OnHttpRequest`;
    /// 5. transmit, honoring the cancellation signal;
    /// 6. fire `OnHttpResponse` over the received response;
    /// 7. deserialize the response body (failures surface as
    ///    [`SoapClientError::EnvelopeDeserialization`]);
    /// 8. fire `OnEnvelopeResponse`;
    /// 9. return the envelope as-is.
    ///
    /// A faulted response is returned successfully: transport success and
    /// remote-operation failure stay distinct. Call
    /// [`Envelope::ensure_not_faulted`] on the result to assert the latter.
    pub async fn send_with_cancellation(
        &self,
        url: &str,
        action: &str,
        envelope: Envelope,
        cancel: &CancellationToken,
    ) -> Result<Envelope> {
        if url.trim().is_empty() || Url::parse(url).is_err() {
            return Err(SoapClientError::InvalidArgument("url"));
        }

        let pipeline = HandlerPipeline::new(self.handlers.read().as_slice());
        debug!(url, action, handlers = pipeline.len(), "sending SOAP request");

        let mut envelope = envelope;
        {
            let mut args = EnvelopeRequestArgs {
                envelope: &mut envelope,
                url,
                action,
            };
            pipeline.fire_envelope_request(self, &mut args, cancel).await?;
        }

        let xml = self
            .settings
            .serializer
            .to_xml(&envelope)
            .map_err(|source| SoapClientError::EnvelopeSerialization {
                envelope: Box::new(envelope.clone()),
                source,
            })?;
        trace!(body = %xml, "serialized request envelope");

        let mut request = HttpRequest::post(url);
        request.set_header("Content-Type", &self.settings.content_type);
        request.set_header(SOAP_ACTION_HEADER, action);
        request.body = xml.into_bytes();
        {
            let mut args = HttpRequestArgs {
                request: &mut request,
                url,
                action,
            };
            pipeline.fire_http_request(self, &mut args, cancel).await?;
        }

        if cancel.is_cancelled() {
            debug!(url, action, "send cancelled before transmission");
            return Err(SoapClientError::Cancelled);
        }
        let mut response = self.transport.send(request, cancel).await?;
        debug!(status = response.status, "received HTTP response");

        {
            let mut args = HttpResponseArgs {
                response: &mut response,
                url,
                action,
            };
            pipeline.fire_http_response(self, &mut args, cancel).await?;
        }

        let raw = response.body_text().into_owned();
        let parsed = self
            .settings
            .serializer
            .from_xml(&raw)
            .map_err(|source| SoapClientError::EnvelopeDeserialization {
                xml: raw.clone(),
                source,
            })?;
        let mut response_envelope =
            parsed.ok_or_else(|| SoapClientError::EnvelopeDeserialization {
                xml: raw,
                source: XmlError::EmptyDocument,
            })?;

        {
            let mut args = EnvelopeResponseArgs {
                envelope: &mut response_envelope,
                url,
                action,
            };
            pipeline
                .fire_envelope_response(self, &mut args, cancel)
                .await?;
        }

        Ok(response_envelope)
    }
}

/// Builder for [`SoapClient`].
#[derive(Default)]
pub struct SoapClientBuilder {
    transport: Option<Arc<dyn SoapTransport>>,
    handlers: Vec<Arc<dyn SoapHandler>>,
    settings: SoapClientSettings,
}

impl SoapClientBuilder {
    /// Uses the given settings.
    pub fn with_settings(mut self, settings: SoapClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Uses the given transport instead of the default reqwest one.
    pub fn with_transport(mut self, transport: Arc<dyn SoapTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Registers a handler.
    pub fn with_handler(mut self, handler: Arc<dyn SoapHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Registers a bare function for the pre-serialization fire point.
    pub fn on_envelope_request<F>(self, f: F, order: i32) -> Self
    where
        F: Fn(&SoapClient, &mut EnvelopeRequestArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.with_handler(Arc::new(
            DelegatingSoapHandler::new()
                .with_order(order)
                .on_envelope_request(f),
        ))
    }

    /// Registers a bare function for the pre-transmission fire point.
    pub fn on_http_request<F>(self, f: F, order: i32) -> Self
    where
        F: Fn(&SoapClient, &mut HttpRequestArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.with_handler(Arc::new(
            DelegatingSoapHandler::new()
                .with_order(order)
                .on_http_request(f),
        ))
    }

    /// Registers a bare function for the post-reception fire point.
    pub fn on_http_response<F>(self, f: F, order: i32) -> Self
    where
        F: Fn(&SoapClient, &mut HttpResponseArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.with_handler(Arc::new(
            DelegatingSoapHandler::new()
                .with_order(order)
                .on_http_response(f),
        ))
    }

    /// Registers a bare function for the post-deserialization fire point.
    pub fn on_envelope_response<F>(self, f: F, order: i32) -> Self
    where
        F: Fn(&SoapClient, &mut EnvelopeResponseArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.with_handler(Arc::new(
            DelegatingSoapHandler::new()
                .with_order(order)
                .on_envelope_response(f),
        ))
    }

    /// Builds the client.
    pub fn build(self) -> SoapClient {
        SoapClient {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
            handlers: RwLock::new(self.handlers),
            settings: self.settings,
        }
    }
}
