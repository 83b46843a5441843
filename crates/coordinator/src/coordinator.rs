//! The client-side trigger and typing coordinator.

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use chat_backend::{Backend, BackendError, ChannelRef, Message, MessageStream};

use crate::config::CoordinatorConfig;
use crate::dedupe::{RecentKeys, TriggerKey};
use crate::transport::{TransportError, TriggerTransport};

/// Errors that can stop the coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Error from the messaging backend.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Error from the gateway transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The channel watch ended and could not be re-opened.
    #[error("channel watch ended")]
    StreamEnded,
}

/// Notifications surfaced to the embedding UI.
#[derive(Debug)]
pub enum CoordinatorEvent {
    /// The assistant posted a reply into the channel.
    ReplyPosted(Message),
    /// No reply arrived within the composing timeout; the indicator was
    /// cleared.
    ReplyTimedOut,
    /// A fired trigger was rejected by the gateway.
    TriggerFailed(String),
}

/// Watches the user's direct channel with the assistant, fires a trigger
/// for each new message the user sends, and drives the bot's composing
/// indicator.
///
/// Triggering is at-most-once per message: duplicate deliveries of the
/// same message (reconnects, local echo plus acknowledged copy) are
/// deduplicated by text and server timestamp, and provisional local
/// echoes never fire at all. Triggers are fire-and-forget; the reply
/// arrives through the channel watch like any other message.
pub struct TriggerCoordinator<B: Backend, T: TriggerTransport> {
    backend: B,
    transport: Arc<T>,
    config: CoordinatorConfig,
    channel: ChannelRef,
    recent: Mutex<RecentKeys>,
    deadline: Mutex<Option<Instant>>,
    deadline_changed: Notify,
    composing: watch::Sender<bool>,
    events: mpsc::UnboundedSender<CoordinatorEvent>,
}

impl<B, T> TriggerCoordinator<B, T>
where
    B: Backend,
    T: TriggerTransport + 'static,
{
    /// Provision (or resolve) the user's direct channel with the
    /// assistant and build a coordinator for it. Returns the coordinator
    /// plus the receiver for its UI notifications.
    pub async fn open(
        backend: B,
        transport: T,
        config: CoordinatorConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<CoordinatorEvent>), CoordinatorError> {
        let transport = Arc::new(transport);
        let channel = transport
            .provision_direct(&config.user_id, &config.bot_id)
            .await?;
        info!(
            "Coordinator for {} attached to channel {}",
            config.user_id,
            channel.cid()
        );

        let (composing, _) = watch::channel(false);
        let (events, events_rx) = mpsc::unbounded_channel();
        let recent = Mutex::new(RecentKeys::new(config.recent_keys));

        Ok((
            Self {
                backend,
                transport,
                config,
                channel,
                recent,
                deadline: Mutex::new(None),
                deadline_changed: Notify::new(),
                composing,
                events,
            },
            events_rx,
        ))
    }

    /// The channel this coordinator is attached to.
    pub fn channel(&self) -> &ChannelRef {
        &self.channel
    }

    /// Subscribe to the bot's composing indicator.
    pub fn composing(&self) -> watch::Receiver<bool> {
        self.composing.subscribe()
    }

    /// Send a message into the channel as the user. The composing
    /// indicator comes up right away; the trigger itself fires when the
    /// message comes back through the channel watch.
    pub async fn send(&self, text: &str) -> Result<Message, CoordinatorError> {
        let message = self
            .backend
            .send_message(&self.channel, text, &self.config.user_id)
            .await?;
        self.composing.send_replace(true);
        self.arm_deadline().await;
        Ok(message)
    }

    async fn arm_deadline(&self) {
        *self.deadline.lock().await = Some(Instant::now() + self.config.composing_timeout);
        self.deadline_changed.notify_one();
    }

    /// React to one message delivered by the channel watch.
    pub async fn handle_event(&self, message: Message) {
        if message.is_from(&self.config.bot_id) {
            debug!("Assistant replied on {}", self.channel.cid());
            self.composing.send_replace(false);
            *self.deadline.lock().await = None;
            let _ = self.events.send(CoordinatorEvent::ReplyPosted(message));
            return;
        }

        if !message.is_from(&self.config.user_id) {
            return;
        }

        if message.is_provisional() {
            debug!("Skipping provisional echo {}", message.id);
            return;
        }

        let text = message.text.trim();
        if text.is_empty() {
            debug!("Skipping blank message {}", message.id);
            return;
        }

        let Some(key) = TriggerKey::of(&message) else {
            return;
        };

        if !self.recent.lock().await.insert(key) {
            debug!("Skipping duplicate delivery of {}", message.id);
            return;
        }

        self.composing.send_replace(true);
        self.arm_deadline().await;

        // Fire and forget: the reply arrives through the watch, and the
        // composing timeout covers a trigger that never lands.
        let transport = Arc::clone(&self.transport);
        let channel = self.channel.clone();
        let text = text.to_string();
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(e) = transport.trigger(&channel, &text).await {
                warn!("Trigger failed for {}: {}", channel.cid(), e);
                let _ = events.send(CoordinatorEvent::TriggerFailed(e.to_string()));
            }
        });
    }

    /// Run the coordinator until the shutdown future completes.
    ///
    /// Watches the channel, feeding every delivered message through
    /// [`handle_event`](Self::handle_event), and clears a stale composing
    /// indicator when no reply arrives within the configured timeout. A
    /// dropped watch is re-opened once; a second consecutive end stops
    /// the coordinator.
    pub async fn run_with_shutdown<S>(&self, shutdown: S) -> Result<(), CoordinatorError>
    where
        S: std::future::Future<Output = ()> + Send,
    {
        info!(
            "Starting trigger coordinator for {} on {}",
            self.config.user_id,
            self.channel.cid()
        );

        let mut stream: MessageStream = self.watch_with_retry().await?;
        let mut reconnects: u32 = 0;

        tokio::pin!(shutdown);

        loop {
            let deadline = *self.deadline.lock().await;

            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Shutdown signal received, stopping coordinator");
                    return Ok(());
                }

                // The deadline can be re-armed from outside the loop (an
                // optimistic send); wake up and re-read it.
                _ = self.deadline_changed.notified() => {}

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() =>
                {
                    warn!(
                        "No reply within {:?} on {}, clearing composing indicator",
                        self.config.composing_timeout,
                        self.channel.cid()
                    );
                    self.composing.send_replace(false);
                    *self.deadline.lock().await = None;
                    let _ = self.events.send(CoordinatorEvent::ReplyTimedOut);
                }

                item = stream.next() => {
                    match item {
                        Some(Ok(message)) => {
                            reconnects = 0;
                            self.handle_event(message).await;
                        }
                        Some(Err(e)) => {
                            // Watch errors can be transient; keep reading.
                            error!("Watch error on {}: {}", self.channel.cid(), e);
                        }
                        None => {
                            if reconnects >= 1 {
                                warn!("Channel watch ended again, stopping");
                                return Err(CoordinatorError::StreamEnded);
                            }
                            warn!("Channel watch ended, re-opening");
                            reconnects += 1;
                            stream = self.backend.watch(&self.channel).await?;
                        }
                    }
                }
            }
        }
    }

    async fn watch_with_retry(&self) -> Result<MessageStream, CoordinatorError> {
        match self.backend.watch(&self.channel).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                warn!("Channel watch failed, retrying once: {}", e);
                Ok(self.backend.watch(&self.channel).await?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chat_backend::{InMemoryBackend, LOCAL_ID_PREFIX};
    use chrono::Utc;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    const USER: &str = "alice";
    const BOT: &str = "solace-bot";

    /// Transport that hands out a fixed channel and records trigger texts.
    #[derive(Clone)]
    struct RecordingTransport {
        channel: ChannelRef,
        calls: Arc<StdMutex<Vec<String>>>,
        fail: bool,
    }

    impl RecordingTransport {
        fn new(channel: ChannelRef) -> Self {
            Self {
                channel,
                calls: Arc::new(StdMutex::new(Vec::new())),
                fail: false,
            }
        }

        fn failing(channel: ChannelRef) -> Self {
            Self {
                fail: true,
                ..Self::new(channel)
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TriggerTransport for RecordingTransport {
        async fn provision_direct(
            &self,
            _member_a: &str,
            _member_b: &str,
        ) -> Result<ChannelRef, TransportError> {
            Ok(self.channel.clone())
        }

        async fn trigger(
            &self,
            _channel: &ChannelRef,
            message: &str,
        ) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::Gateway {
                    status: 500,
                    message: "injected".to_string(),
                });
            }
            self.calls.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    async fn setup(
        transport_for: fn(ChannelRef) -> RecordingTransport,
    ) -> (
        InMemoryBackend,
        RecordingTransport,
        TriggerCoordinator<InMemoryBackend, RecordingTransport>,
        mpsc::UnboundedReceiver<CoordinatorEvent>,
    ) {
        let backend = InMemoryBackend::new();
        let channel = backend
            .create_distinct_channel(
                "messaging",
                &[USER.to_string(), BOT.to_string()],
                USER,
            )
            .await
            .unwrap();
        let transport = transport_for(channel);
        let config =
            CoordinatorConfig::new(USER, BOT).with_composing_timeout(Duration::from_secs(30));
        let (coordinator, events) =
            TriggerCoordinator::open(backend.clone(), transport.clone(), config)
                .await
                .unwrap();
        (backend, transport, coordinator, events)
    }

    fn user_message(text: &str) -> Message {
        Message {
            id: "msg-1".to_string(),
            user_id: USER.to_string(),
            text: text.to_string(),
            created_at: Some(Utc::now()),
        }
    }

    async fn drain_spawned() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_duplicate_delivery_triggers_once() {
        let (_backend, transport, coordinator, _events) = setup(RecordingTransport::new).await;

        let message = user_message("I failed my exam");
        coordinator.handle_event(message.clone()).await;
        coordinator.handle_event(message).await;
        drain_spawned().await;

        assert_eq!(transport.calls(), vec!["I failed my exam".to_string()]);
    }

    #[tokio::test]
    async fn test_provisional_echo_ignored() {
        let (_backend, transport, coordinator, _events) = setup(RecordingTransport::new).await;
        let mut composing = coordinator.composing();

        let local_echo = Message {
            id: format!("{}7", LOCAL_ID_PREFIX),
            ..user_message("hello")
        };
        coordinator.handle_event(local_echo).await;

        let unacked = Message {
            created_at: None,
            ..user_message("hello")
        };
        coordinator.handle_event(unacked).await;
        drain_spawned().await;

        assert!(transport.calls().is_empty());
        assert!(!*composing.borrow_and_update());
    }

    #[tokio::test]
    async fn test_blank_message_does_not_trigger() {
        let (_backend, transport, coordinator, _events) = setup(RecordingTransport::new).await;
        let mut composing = coordinator.composing();

        coordinator.handle_event(user_message("   \n  ")).await;
        drain_spawned().await;

        assert!(transport.calls().is_empty());
        assert!(!*composing.borrow_and_update());
    }

    #[tokio::test]
    async fn test_trigger_payload_trimmed() {
        let (_backend, transport, coordinator, _events) = setup(RecordingTransport::new).await;

        coordinator
            .handle_event(user_message("  I failed my exam  "))
            .await;
        drain_spawned().await;

        assert_eq!(transport.calls(), vec!["I failed my exam".to_string()]);
    }

    #[tokio::test]
    async fn test_send_raises_composing_immediately() {
        let (_backend, _transport, coordinator, _events) = setup(RecordingTransport::new).await;
        let mut composing = coordinator.composing();

        coordinator.send("I failed my exam").await.unwrap();

        // Up before the echo round-trips through the watch.
        assert!(*composing.borrow_and_update());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_armed_timeout_clears_composing() {
        let (_backend, _transport, coordinator, mut events) =
            setup(RecordingTransport::new).await;
        let coordinator = Arc::new(coordinator);
        let mut composing = coordinator.composing();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move {
                coordinator
                    .run_with_shutdown(async {
                        let _ = stop_rx.await;
                    })
                    .await
            }
        });
        drain_spawned().await;

        coordinator.send("hi").await.unwrap();
        drain_spawned().await;
        assert!(*composing.borrow_and_update());

        tokio::time::advance(Duration::from_secs(31)).await;
        composing.changed().await.unwrap();
        assert!(!*composing.borrow_and_update());
        assert!(matches!(
            events.recv().await.unwrap(),
            CoordinatorEvent::ReplyTimedOut
        ));

        let _ = stop_tx.send(());
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_other_members_do_not_trigger() {
        let (_backend, transport, coordinator, _events) = setup(RecordingTransport::new).await;

        let other = Message {
            user_id: "carol".to_string(),
            ..user_message("how are you")
        };
        coordinator.handle_event(other).await;
        drain_spawned().await;

        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_composing_set_by_user_cleared_by_bot() {
        let (_backend, _transport, coordinator, mut events) =
            setup(RecordingTransport::new).await;
        let mut composing = coordinator.composing();

        coordinator.handle_event(user_message("hi")).await;
        assert!(*composing.borrow_and_update());

        let reply = Message {
            id: "msg-2".to_string(),
            user_id: BOT.to_string(),
            text: "hello".to_string(),
            created_at: Some(Utc::now()),
        };
        coordinator.handle_event(reply).await;
        assert!(!*composing.borrow_and_update());

        drain_spawned().await;
        assert!(matches!(
            events.try_recv().unwrap(),
            CoordinatorEvent::ReplyPosted(_)
        ));
    }

    #[tokio::test]
    async fn test_failed_trigger_reported() {
        let (_backend, _transport, coordinator, mut events) =
            setup(RecordingTransport::failing).await;

        coordinator.handle_event(user_message("hi")).await;
        drain_spawned().await;

        assert!(matches!(
            events.try_recv().unwrap(),
            CoordinatorEvent::TriggerFailed(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_composing_times_out_without_reply() {
        let (backend, _transport, coordinator, mut events) =
            setup(RecordingTransport::new).await;
        let channel = coordinator.channel().clone();
        let mut composing = coordinator.composing();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            coordinator
                .run_with_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });
        drain_spawned().await;

        backend.send_message(&channel, "hi", USER).await.unwrap();
        composing.changed().await.unwrap();
        assert!(*composing.borrow_and_update());

        tokio::time::advance(Duration::from_secs(31)).await;
        composing.changed().await.unwrap();
        assert!(!*composing.borrow_and_update());
        assert!(matches!(
            events.recv().await.unwrap(),
            CoordinatorEvent::ReplyTimedOut
        ));

        let _ = stop_tx.send(());
        handle.await.unwrap().unwrap();
    }
}
