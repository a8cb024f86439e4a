//! The four-stage handler pipeline.
//!
//! Built from a snapshot of the registered handlers at the start of each
//! send call, sorted ascending by order. The sort is stable, so handlers
//! sharing an order value run in registration order. Invocation is
//! strictly sequential; the first error aborts the fire point and the
//! remaining pipeline stages.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::client::SoapClient;
use crate::error::Result;
use crate::handler::{
    EnvelopeRequestArgs, EnvelopeResponseArgs, HttpRequestArgs, HttpResponseArgs, SoapHandler,
};

pub(crate) struct HandlerPipeline {
    handlers: Vec<Arc<dyn SoapHandler>>,
}

impl HandlerPipeline {
    /// Snapshots and orders the registered handlers.
    pub(crate) fn new(registered: &[Arc<dyn SoapHandler>]) -> Self {
        let mut handlers = registered.to_vec();
        handlers.sort_by_key(|handler| handler.order());
        Self { handlers }
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) async fn fire_envelope_request(
        &self,
        client: &SoapClient,
        args: &mut EnvelopeRequestArgs<'_>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        trace!(handlers = self.len(), "firing OnEnvelopeRequest");
        for handler in &self.handlers {
            handler.on_envelope_request(client, args, cancel).await?;
        }
        Ok(())
    }

    pub(crate) async fn fire_http_request(
        &self,
        client: &SoapClient,
        args: &mut HttpRequestArgs<'_>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        trace!(handlers = self.len(), "firing OnHttpRequest");
        for handler in &self.handlers {
            handler.on_http_request(client, args, cancel).await?;
        }
        Ok(())
    }

    pub(crate) async fn fire_http_response(
        &self,
        client: &SoapClient,
        args: &mut HttpResponseArgs<'_>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        trace!(handlers = self.len(), "firing OnHttpResponse");
        for handler in &self.handlers {
            handler.on_http_response(client, args, cancel).await?;
        }
        Ok(())
    }

    pub(crate) async fn fire_envelope_response(
        &self,
        client: &SoapClient,
        args: &mut EnvelopeResponseArgs<'_>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        trace!(handlers = self.len(), "firing OnEnvelopeResponse");
        for handler in &self.handlers {
            handler.on_envelope_response(client, args, cancel).await?;
        }
        Ok(())
    }
}
