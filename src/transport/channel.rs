use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::transport::message::{MessageHandler, Request};

/// Request/response link to one serving context.
pub trait Channel {
    /// Send `request` and wait at most `timeout` for the reply.
    fn request(&mut self, request: &Request, timeout: Duration) -> Result<Value, TransportError>;
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn request(&mut self, request: &Request, timeout: Duration) -> Result<Value, TransportError> {
        (**self).request(request, timeout)
    }
}

/// In-process channel: the handler runs on the caller's thread, and a reply
/// that took longer than the deadline is reported as a timeout.
pub struct LocalChannel<H: MessageHandler> {
    pub name: String,
    handler: H,
}

impl<H: MessageHandler> LocalChannel<H> {
    pub fn new(name: &str, handler: H) -> Self {
        LocalChannel {
            name: name.to_string(),
            handler,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }
}

impl<H: MessageHandler> Channel for LocalChannel<H> {
    fn request(&mut self, request: &Request, timeout: Duration) -> Result<Value, TransportError> {
        let started = Instant::now();
        debug!(channel = %self.name, kind = request.kind(), "dispatching request");

        let reply = self.handler.handle(request.clone());

        let elapsed = started.elapsed();
        if elapsed > timeout {
            warn!(channel = %self.name, kind = request.kind(), elapsed_ms = elapsed.as_millis() as u64, "reply arrived after deadline");
            return Err(TransportError::Timeout {
                context: request.kind().to_string(),
                timeout,
            });
        }

        reply.ok_or_else(|| TransportError::NoResponse(self.name.clone()))
    }
}
