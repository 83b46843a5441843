//! Server-Sent Events (SSE) client for receiving new-message events.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::types::{ChannelRef, Message};

/// SSE event type carrying a new message.
const MESSAGE_EVENT: &str = "message.new";

/// A stream of new messages on a single watched channel.
pub struct EventStream {
    event_source: EventSource,
}

impl EventStream {
    /// Open an SSE connection for the given channel.
    pub fn open(config: &BackendConfig, channel: &ChannelRef) -> Result<Self, BackendError> {
        let url = config.events_url(channel);
        info!("Opening SSE connection to {}", url);

        // SSE connections are long-lived; build a client without the
        // request timeout used for plain calls.
        let sse_client = reqwest::Client::builder()
            .build()
            .map_err(BackendError::Http)?;

        let mut request = sse_client.get(&url);
        if let Some(key) = &config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let event_source = request
            .eventsource()
            .map_err(|e| BackendError::Sse(e.to_string()))?;

        Ok(Self { event_source })
    }
}

impl Stream for EventStream {
    type Item = Result<Message, BackendError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.event_source).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => match event {
                    Event::Open => {
                        debug!("SSE connection opened");
                        continue;
                    }
                    Event::Message(msg) => {
                        if msg.event == MESSAGE_EVENT {
                            match serde_json::from_str::<Message>(&msg.data) {
                                Ok(message) => return Poll::Ready(Some(Ok(message))),
                                Err(e) => {
                                    warn!("Failed to parse SSE event data: {}", e);
                                    debug!("Raw data: {}", msg.data);
                                    continue;
                                }
                            }
                        } else {
                            debug!("Ignoring SSE event type: {}", msg.event);
                            continue;
                        }
                    }
                },
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(BackendError::Sse(e.to_string()))));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
