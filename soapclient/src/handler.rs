//! The handler extensibility contract.
//!
//! A handler observes or mutates a SOAP exchange at up to four fire
//! points: before the request envelope is serialized, before the HTTP
//! request is transmitted, after the HTTP response is received, and after
//! the response envelope is deserialized. Every capability is optional;
//! the trait's default methods are immediate no-ops.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::SoapClient;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::transport::{HttpRequest, HttpResponse};

/// Arguments for the pre-serialization fire point.
pub struct EnvelopeRequestArgs<'a> {
    /// The mutable request envelope.
    pub envelope: &'a mut Envelope,
    /// Destination URL of the call.
    pub url: &'a str,
    /// The SOAP action identifier.
    pub action: &'a str,
}

/// Arguments for the pre-transmission fire point.
pub struct HttpRequestArgs<'a> {
    /// The mutable outbound HTTP request.
    pub request: &'a mut HttpRequest,
    /// Destination URL of the call.
    pub url: &'a str,
    /// The SOAP action identifier.
    pub action: &'a str,
}

/// Arguments for the post-reception fire point.
pub struct HttpResponseArgs<'a> {
    /// The received HTTP response.
    pub response: &'a mut HttpResponse,
    /// Destination URL of the call.
    pub url: &'a str,
    /// The SOAP action identifier.
    pub action: &'a str,
}

/// Arguments for the post-deserialization fire point.
pub struct EnvelopeResponseArgs<'a> {
    /// The mutable response envelope.
    pub envelope: &'a mut Envelope,
    /// Destination URL of the call.
    pub url: &'a str,
    /// The SOAP action identifier.
    pub action: &'a str,
}

/// A pipeline participant.
///
/// Handlers run sequentially at each fire point, sorted ascending by
/// [`order`](SoapHandler::order) with ties broken by registration order.
/// Handler N+1 observes mutations made by handler N. An error aborts the
/// remaining handlers and the remaining stages of the call, and propagates
/// to the caller unmodified.
#[async_trait]
pub trait SoapHandler: Send + Sync {
    /// Pipeline position; lower runs earlier. Multiple handlers may share
    /// an order value.
    fn order(&self) -> i32 {
        0
    }

    /// Invoked before the request envelope is serialized. Useful to add
    /// headers such as the WS-Security username token.
    async fn on_envelope_request(
        &self,
        _client: &SoapClient,
        _args: &mut EnvelopeRequestArgs<'_>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(())
    }

    /// Invoked before the HTTP request is transmitted. Useful to log the
    /// request or rewrite headers, body or method.
    async fn on_http_request(
        &self,
        _client: &SoapClient,
        _args: &mut HttpRequestArgs<'_>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(())
    }

    /// Invoked after the HTTP response is received, before parsing.
    async fn on_http_response(
        &self,
        _client: &SoapClient,
        _args: &mut HttpResponseArgs<'_>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(())
    }

    /// Invoked after the response envelope is deserialized.
    async fn on_envelope_response(
        &self,
        _client: &SoapClient,
        _args: &mut EnvelopeResponseArgs<'_>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(())
    }
}

type EnvelopeRequestFn =
    dyn Fn(&SoapClient, &mut EnvelopeRequestArgs<'_>) -> Result<()> + Send + Sync;
type HttpRequestFn = dyn Fn(&SoapClient, &mut HttpRequestArgs<'_>) -> Result<()> + Send + Sync;
type HttpResponseFn = dyn Fn(&SoapClient, &mut HttpResponseArgs<'_>) -> Result<()> + Send + Sync;
type EnvelopeResponseFn =
    dyn Fn(&SoapClient, &mut EnvelopeResponseArgs<'_>) -> Result<()> + Send + Sync;

/// A handler whose four capabilities are independently optional function
/// values, for wiring bare functions into the pipeline without a dedicated
/// type.
///
/// An unset slot is an immediate successful no-op. The pipeline treats a
/// delegating handler exactly like any other [`SoapHandler`].
#[derive(Default)]
pub struct DelegatingSoapHandler {
    order: i32,
    envelope_request: Option<Box<EnvelopeRequestFn>>,
    http_request: Option<Box<HttpRequestFn>>,
    http_response: Option<Box<HttpResponseFn>>,
    envelope_response: Option<Box<EnvelopeResponseFn>>,
}

impl DelegatingSoapHandler {
    /// Creates a delegating handler with no capabilities set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipeline order.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Sets the pre-serialization capability.
    pub fn on_envelope_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&SoapClient, &mut EnvelopeRequestArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.envelope_request = Some(Box::new(f));
        self
    }

    /// Sets the pre-transmission capability.
    pub fn on_http_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&SoapClient, &mut HttpRequestArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.http_request = Some(Box::new(f));
        self
    }

    /// Sets the post-reception capability.
    pub fn on_http_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&SoapClient, &mut HttpResponseArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.http_response = Some(Box::new(f));
        self
    }

    /// Sets the post-deserialization capability.
    pub fn on_envelope_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&SoapClient, &mut EnvelopeResponseArgs<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.envelope_response = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl SoapHandler for DelegatingSoapHandler {
    fn order(&self) -> i32 {
        self.order
    }

    async fn on_envelope_request(
        &self,
        client: &SoapClient,
        args: &mut EnvelopeRequestArgs<'_>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        match &self.envelope_request {
            Some(f) => f(client, args),
            None => Ok(()),
        }
    }

    async fn on_http_request(
        &self,
        client: &SoapClient,
        args: &mut HttpRequestArgs<'_>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        match &self.http_request {
            Some(f) => f(client, args),
            None => Ok(()),
        }
    }

    async fn on_http_response(
        &self,
        client: &SoapClient,
        args: &mut HttpResponseArgs<'_>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        match &self.http_response {
            Some(f) => f(client, args),
            None => Ok(()),
        }
    }

    async fn on_envelope_response(
        &self,
        client: &SoapClient,
        args: &mut EnvelopeResponseArgs<'_>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        match &self.envelope_response {
            Some(f) => f(client, args),
            None => Ok(()),
        }
    }
}
