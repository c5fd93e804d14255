use deck_logging::{deck_debug, deck_error};

use crate::bus::{Bus, Subscription};
use crate::message::{ChirpResult, MessageName, Origin, Payload, ThumbnailRequest};

/// Relays chirp results seen on the page bus to the background context as
/// thumbnail fetches.
pub struct ContentRelay {
    subscription: Subscription,
}

impl ContentRelay {
    /// Listens on `page_bus` for `CHIRP_RESULT` from the injected page and
    /// notifies `background_bus` for each one carrying URLs.
    pub fn install(page_bus: &Bus, background_bus: Bus) -> Self {
        let subscription =
            page_bus.listen(MessageName::ChirpResult, Origin::Inject, move |message| {
                let Payload::ChirpResult(chirp) = &message.payload else {
                    deck_error!("chirp listener got {}", message.name());
                    return;
                };
                if let Some(payload) = thumbnail_notification(chirp) {
                    background_bus.notify(payload);
                }
            });
        Self { subscription }
    }

    pub fn uninstall(self) {
        self.subscription.cancel();
    }
}

/// Only the first URL of a chirp is fetched; the rest are ignored.
pub fn thumbnail_notification(chirp: &ChirpResult) -> Option<Payload> {
    let url = chirp.urls.first()?;
    if chirp.urls.len() > 1 {
        deck_debug!("chirp carried {} urls; fetching the first only", chirp.urls.len());
    }
    Some(Payload::FetchThumbnail(ThumbnailRequest { url: url.clone() }))
}
