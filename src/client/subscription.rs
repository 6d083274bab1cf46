//! Push-channel subscriptions.
//!
//! A subscription is a long-lived server-sent-event connection driven by a
//! background task. The task owns the whole lifecycle:
//!
//! 1. Open the stream URL with `Accept: text/event-stream` (and
//!    `Last-Event-ID` when resuming).
//! 2. Parse frames incrementally and invoke the caller's callback once per
//!    message, in arrival order, with the JSON-decoded payload.
//! 3. On transport failure or stream end, wait the current retry delay and
//!    reconnect - unless reconnection was disabled.
//!
//! The retry delay starts at 3 seconds and follows the stream's `retry:`
//! field when the server adjusts it, matching native event-source behavior.
//! Reconnection is suppressed entirely with [`SubscribeOptions::reconnect`]
//! set to `false`; in that mode the task also watches for the server's
//! end-of-stream marker and shuts the channel down when it arrives.
//!
//! Message payloads are trusted as the server's own event format: a frame
//! that is not valid JSON is a server bug and fails the task loudly instead
//! of being swallowed.

use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::events::EventParser;

/// Reconnection delay until the stream's `retry:` field adjusts it.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Frame type the server uses for out-of-band channel signals.
const ERROR_EVENT: &str = "error";

/// Payload of the end-of-stream signal.
///
/// Best-effort heuristic: the signal rides on an `error`-typed frame whose
/// data is this marker, which is how the server's termination signal shows
/// up on an event-source transport. The exact shape is transport-dependent
/// and not a guaranteed contract.
const END_OF_STREAM: &str = "eof";

/// Options for [`crate::ApiClient::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Re-open the channel after transient failures. Defaults to `true`.
    ///
    /// Disable for streams with a natural end, like per-step logs, where
    /// the server signals completion instead of holding the channel open.
    pub reconnect: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        SubscribeOptions { reconnect: true }
    }
}

/// Why one connection attempt stopped draining.
enum ChannelEnd {
    /// The channel is done: end-of-stream marker seen, or the server
    /// rejected the subscription outright. Never reconnect.
    Closed,
    /// Transient interruption: transport error or the server dropped the
    /// connection. Reconnect if enabled.
    Interrupted,
}

/// Live handle to an open push channel.
///
/// Closing is the only cancellation primitive: it tears down the underlying
/// connection with no grace period or acknowledgment. Dropping the handle
/// leaves the channel running, like any detached background task.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Close the channel, cancelling the connection task.
    ///
    /// No further callback invocations happen after this returns.
    pub fn close(&self) {
        self.task.abort();
    }

    /// Whether the channel has stopped, either via [`close`](Self::close)
    /// or because the connection task finished on its own.
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the connection task for a subscription URL.
pub(crate) fn open<F>(
    http: reqwest::Client,
    url: String,
    mut on_message: F,
    opts: SubscribeOptions,
) -> Subscription
where
    F: FnMut(Value) + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut retry_delay = DEFAULT_RETRY_DELAY;
        let mut last_event_id: Option<String> = None;

        loop {
            let end = drain_channel(
                &http,
                &url,
                &mut on_message,
                &opts,
                &mut retry_delay,
                &mut last_event_id,
            )
            .await;

            match end {
                ChannelEnd::Closed => break,
                ChannelEnd::Interrupted if !opts.reconnect => break,
                ChannelEnd::Interrupted => {
                    warn!(%url, delay = ?retry_delay, "push channel interrupted, reconnecting");
                    sleep(retry_delay).await;
                }
            }
        }
    });

    Subscription { task }
}

/// Run a single connection attempt to completion.
async fn drain_channel<F>(
    http: &reqwest::Client,
    url: &str,
    on_message: &mut F,
    opts: &SubscribeOptions,
    retry_delay: &mut Duration,
    last_event_id: &mut Option<String>,
) -> ChannelEnd
where
    F: FnMut(Value) + Send,
{
    let mut request = http.get(url).header(reqwest::header::ACCEPT, "text/event-stream");
    if let Some(id) = last_event_id.as_deref() {
        request = request.header("Last-Event-ID", id);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            warn!(%url, %err, "push channel connect failed");
            return ChannelEnd::Interrupted;
        }
    };

    if !response.status().is_success() {
        // An HTTP-level rejection (auth, missing endpoint) will not heal by
        // retrying with the same URL.
        error!(%url, status = %response.status(), "push channel rejected");
        return ChannelEnd::Closed;
    }

    let mut stream = response.bytes_stream();
    let mut parser = EventParser::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!(%url, %err, "push channel read failed");
                return ChannelEnd::Interrupted;
            }
        };

        let events = parser.feed(&chunk);

        if let Some(id) = parser.last_event_id() {
            *last_event_id = Some(id.to_owned());
        }
        if let Some(retry) = parser.retry() {
            *retry_delay = retry;
        }

        for event in events {
            if event.event == ERROR_EVENT {
                if !opts.reconnect && event.data == END_OF_STREAM {
                    debug!(%url, "push channel reached end of stream");
                    return ChannelEnd::Closed;
                }
                debug!(%url, data = %event.data, "ignoring error frame on push channel");
                continue;
            }

            // Trusted input: the server defines this format, so a malformed
            // payload is its bug and must not be silently dropped.
            let value: Value = serde_json::from_str(&event.data)
                .expect("push channel delivered a malformed JSON payload");
            on_message(value);
        }
    }

    // Server closed the stream without an end marker.
    ChannelEnd::Interrupted
}
