use std::sync::Arc;

use deck_logging::{deck_debug, deck_error, deck_info, deck_warn};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::bus::{Bus, Subscription};
use crate::fulfill::{GifRequestService, LogRequestSink, RequestSink};
use crate::message::{MessageName, Origin, Payload};

/// Receives thumbnail URLs announced by the content context.
pub trait ThumbnailHandler: Send + Sync {
    fn fetch_thumbnail(&self, url: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogThumbnails;

impl ThumbnailHandler for LogThumbnails {
    fn fetch_thumbnail(&self, url: &str) {
        deck_info!("thumbnail requested for {}", url);
    }
}

/// The privileged side of the bridge: fulfills network requests for the
/// content context and answers on the same bus.
pub struct BackgroundService {
    subscriptions: Vec<Subscription>,
    shutdown: CancellationToken,
}

impl BackgroundService {
    /// Installs the listeners on `bus`. Requests run as tasks on `runtime`.
    pub fn start(
        runtime: Handle,
        bus: Bus,
        service: Arc<GifRequestService>,
        thumbnails: Arc<dyn ThumbnailHandler>,
    ) -> Self {
        Self::start_with_sink(runtime, bus, service, thumbnails, Arc::new(LogRequestSink))
    }

    pub fn start_with_sink(
        runtime: Handle,
        bus: Bus,
        service: Arc<GifRequestService>,
        thumbnails: Arc<dyn ThumbnailHandler>,
        sink: Arc<dyn RequestSink>,
    ) -> Self {
        let shutdown = CancellationToken::new();

        let responder = bus.clone();
        let cancelled = shutdown.clone();
        let requests = bus.listen(MessageName::MakeGifRequest, Origin::Content, move |message| {
            let message = message.clone();
            let bus = responder.clone();
            let service = service.clone();
            let sink = sink.clone();
            let cancelled = cancelled.clone();
            let task = async move {
                tokio::select! {
                    _ = cancelled.cancelled() => {
                        deck_debug!("background stopped; abandoning {}", message.name());
                    }
                    outcome = service.process(&message, sink.as_ref()) => match outcome {
                        Ok(reply) => bus.send(reply),
                        // The requester sees this only as a missing reply.
                        Err(err) => deck_warn!("dropping gif request: {}", err),
                    },
                }
            };
            runtime.spawn(deck_logging::with_context_label(Origin::Background.label(), task));
        });

        let thumbnail_requests =
            bus.listen(MessageName::FetchThumbnail, Origin::Content, move |message| {
                match &message.payload {
                    Payload::FetchThumbnail(request) => thumbnails.fetch_thumbnail(&request.url),
                    other => deck_error!("thumbnail listener got {}", other.name()),
                }
            });

        Self {
            subscriptions: vec![requests, thumbnail_requests],
            shutdown,
        }
    }

    /// Removes the listeners and abandons requests still in flight.
    pub fn shutdown(self) {
        self.shutdown.cancel();
        for subscription in self.subscriptions {
            subscription.cancel();
        }
    }
}
