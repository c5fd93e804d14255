//! Transport-agnostic message bus between two execution contexts.
//!
//! A [`Bus`] sends to the opposite context through a [`Transport`] and
//! dispatches inbound messages to listeners filtered by tag and origin.
//! Replies to [`Bus::request`] are routed to the waiting [`PendingReply`]
//! instead of the listeners.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use deck_logging::{deck_debug, deck_trace};
use tokio::sync::{mpsc, oneshot};

use crate::message::{Message, MessageName, Origin, Payload, RequestId};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BusError {
    #[error("receiving context is gone")]
    Disconnected,
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("reply channel closed before a reply arrived")]
    ReplyDropped,
    #[error("{0} is not a request awaiting a reply")]
    NotARequest(MessageName),
    #[error("{reply} is not the reply tag for {request}")]
    MismatchedReply {
        request: MessageName,
        reply: MessageName,
    },
}

/// Carries messages to the opposite context.
pub trait Transport: Send + Sync {
    fn post(&self, message: Message) -> Result<(), BusError>;
}

/// In-process transport backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }
}

impl Transport for ChannelTransport {
    fn post(&self, message: Message) -> Result<(), BusError> {
        self.tx.send(message).map_err(|_| BusError::Disconnected)
    }
}

type Handler = Arc<dyn Fn(&Message) + Send + Sync>;

struct Listener {
    id: u64,
    name: MessageName,
    origin: Origin,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    label: &'static str,
    listeners: Mutex<Vec<Listener>>,
    pending: Mutex<HashMap<RequestId, oneshot::Sender<Message>>>,
    next_listener: AtomicU64,
}

impl Registry {
    fn listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<RequestId, oneshot::Sender<Message>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, message: Message) {
        // The delivering thread may have last run another context's task.
        deck_logging::set_context_label(self.label);
        if message.is_response {
            let waiting = message.request_id.and_then(|id| self.pending().remove(&id));
            if let Some(tx) = waiting {
                if tx.send(message).is_err() {
                    deck_debug!("reply arrived after its requester gave up");
                }
                return;
            }
        }

        // Handlers run outside the lock so they may listen or cancel.
        let matching: Vec<Handler> = self
            .listeners()
            .iter()
            .filter(|l| l.name == message.name() && l.origin == message.origin)
            .map(|l| l.handler.clone())
            .collect();
        deck_trace!(
            "delivering {} from {} to {} listener(s)",
            message.name(),
            message.origin.label(),
            matching.len()
        );
        for handler in matching {
            handler(&message);
        }
    }
}

/// One context's end of a bus connection. Cheap to clone.
#[derive(Clone)]
pub struct Bus {
    origin: Origin,
    transport: Arc<dyn Transport>,
    registry: Arc<Registry>,
}

impl Bus {
    /// Creates a bus for the context `origin`, sending through `transport`.
    pub fn new(origin: Origin, transport: Arc<dyn Transport>) -> Self {
        Self {
            origin,
            transport,
            registry: Arc::new(Registry {
                label: origin.label(),
                ..Registry::default()
            }),
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Sends a prebuilt message. Best-effort: a torn-down receiver is ignored.
    pub fn send(&self, message: Message) {
        let name = message.name();
        if let Err(err) = self.transport.post(message) {
            deck_debug!("dropping {}: {}", name, err);
        }
    }

    /// Sends a fire-and-forget message from this context.
    pub fn notify(&self, payload: Payload) {
        self.send(Message::notification(self.origin, payload));
    }

    /// Sends a request and returns a handle resolving to its reply.
    ///
    /// Fails with [`BusError::NotARequest`] for tags that are never answered.
    /// The bus gives no delivery guarantee; callers should use
    /// [`PendingReply::recv_timeout`].
    pub fn request(&self, payload: Payload) -> Result<PendingReply, BusError> {
        let message = Message::request(self.origin, payload)?;
        let Some(id) = message.request_id else {
            return Err(BusError::NotARequest(message.name()));
        };
        let (tx, rx) = oneshot::channel();
        self.registry.pending().insert(id, tx);
        self.send(message);
        Ok(PendingReply {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        })
    }

    /// Replies to `request` with the paired result payload.
    pub fn respond(&self, request: &Message, payload: Payload) -> Result<(), BusError> {
        let reply = request.reply(payload)?;
        self.transport.post(reply)
    }

    /// Registers `handler` for messages tagged `name` coming from `origin`.
    ///
    /// Handlers for the same tag run in registration order.
    pub fn listen<F>(&self, name: MessageName, origin: Origin, handler: F) -> Subscription
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let id = self.registry.next_listener.fetch_add(1, Ordering::Relaxed);
        self.registry.listeners().push(Listener {
            id,
            name,
            origin,
            handler: Arc::new(handler),
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Dispatches an inbound message as if it arrived from the transport.
    pub fn deliver(&self, message: Message) {
        self.registry.deliver(message);
    }

    fn inbox(&self, rx: mpsc::UnboundedReceiver<Message>) -> Inbox {
        Inbox {
            rx,
            registry: self.registry.clone(),
        }
    }
}

/// Receiving side of a channel-backed bus.
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Message>,
    registry: Arc<Registry>,
}

impl Inbox {
    /// Dispatches inbound messages until the opposite context is dropped.
    pub async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            self.registry.deliver(message);
        }
        deck_debug!("opposite context closed; inbox stopped");
    }

    /// Dispatches whatever is already queued and returns how many messages ran.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.registry.deliver(message);
            count += 1;
        }
        count
    }
}

/// Connects two contexts with in-process channels.
pub fn connect(a: Origin, b: Origin) -> ((Bus, Inbox), (Bus, Inbox)) {
    let (to_b, from_a) = mpsc::unbounded_channel();
    let (to_a, from_b) = mpsc::unbounded_channel();
    let bus_a = Bus::new(a, Arc::new(ChannelTransport { tx: to_b }));
    let bus_b = Bus::new(b, Arc::new(ChannelTransport { tx: to_a }));
    let inbox_a = bus_a.inbox(from_b);
    let inbox_b = bus_b.inbox(from_a);
    ((bus_a, inbox_a), (bus_b, inbox_b))
}

/// Handle for a registered listener.
#[must_use = "dropping a Subscription keeps the listener; call cancel() to remove it"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Removes the listener. No-op if the bus is already gone.
    pub fn cancel(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.listeners().retain(|l| l.id != self.id);
        }
    }
}

/// A reply that has not arrived yet. Dropping it forgets the request.
pub struct PendingReply {
    id: RequestId,
    rx: oneshot::Receiver<Message>,
    registry: Weak<Registry>,
}

impl PendingReply {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub async fn recv(mut self) -> Result<Message, BusError> {
        (&mut self.rx).await.map_err(|_| BusError::ReplyDropped)
    }

    pub async fn recv_timeout(mut self, limit: Duration) -> Result<Message, BusError> {
        match tokio::time::timeout(limit, &mut self.rx).await {
            Ok(reply) => reply.map_err(|_| BusError::ReplyDropped),
            Err(_) => Err(BusError::Timeout(limit)),
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.pending().remove(&self.id);
        }
    }
}
