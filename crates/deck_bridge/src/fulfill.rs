//! Fulfills `MAKE_GIF_REQUEST` messages on behalf of contexts that cannot
//! reach the network.
//!
//! Each request moves `Received -> Dispatched -> Resolved | Failed`. The
//! reply carries every normalized item or the request fails as a whole;
//! there is no retry and no partial result.

use std::sync::Arc;

use deck_logging::{deck_debug, deck_error, deck_info, deck_warn};

use crate::bus::BusError;
use crate::config::BridgeConfig;
use crate::fetch::{JsonFetcher, ReqwestFetcher};
use crate::message::{GifRequest, GifResults, Message, MessageName, Payload, RequestId};
use crate::providers::ProviderRegistry;
use crate::types::{FetchError, GifResult, GifSource};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FulfillError {
    #[error("{0} is not a gif request")]
    UnexpectedMessage(MessageName),
    #[error("no adapter registered for {0}")]
    UnknownProvider(GifSource),
    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),
    #[error("upstream request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Bus(#[from] BusError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Dispatched(GifSource),
    Resolved { count: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEvent {
    pub request_id: RequestId,
    pub stage: RequestStage,
}

pub trait RequestSink: Send + Sync {
    fn emit(&self, event: RequestEvent);
}

/// Writes every transition to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRequestSink;

impl RequestSink for LogRequestSink {
    fn emit(&self, event: RequestEvent) {
        match &event.stage {
            RequestStage::Failed { reason } => {
                deck_warn!("gif request {} failed: {}", event.request_id, reason)
            }
            stage => deck_debug!("gif request {} {:?}", event.request_id, stage),
        }
    }
}

pub struct GifRequestService {
    providers: ProviderRegistry,
    fetcher: Arc<dyn JsonFetcher>,
}

impl GifRequestService {
    pub fn new(providers: ProviderRegistry, fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self { providers, fetcher }
    }

    /// Service with the built-in adapters and an HTTP fetcher built from `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(config.fetch.clone())?;
        Ok(Self::new(
            ProviderRegistry::from_config(config),
            Arc::new(fetcher),
        ))
    }

    /// Runs one request to completion and returns the correlated result message.
    pub async fn process(
        &self,
        message: &Message,
        sink: &dyn RequestSink,
    ) -> Result<Message, FulfillError> {
        let request = match &message.payload {
            Payload::MakeGifRequest(request) => request,
            other => {
                deck_error!("gif service handed a {} message", other.name());
                return Err(FulfillError::UnexpectedMessage(other.name()));
            }
        };
        let request_id = match message.request_id {
            Some(id) if !message.is_response => id,
            _ => return Err(BusError::NotARequest(message.name()).into()),
        };

        sink.emit(RequestEvent {
            request_id,
            stage: RequestStage::Received,
        });

        let outcome = self.search(request, request_id, sink).await;
        let stage = match &outcome {
            Ok(gifs) => RequestStage::Resolved { count: gifs.len() },
            Err(err) => RequestStage::Failed {
                reason: err.to_string(),
            },
        };
        sink.emit(RequestEvent { request_id, stage });

        let gifs = outcome?;
        Ok(message.reply(Payload::GifRequestResult(GifResults { gifs }))?)
    }

    async fn search(
        &self,
        request: &GifRequest,
        request_id: RequestId,
        sink: &dyn RequestSink,
    ) -> Result<Vec<GifResult>, FulfillError> {
        let provider = self.providers.get(request.source).ok_or_else(|| {
            deck_error!("no adapter registered for {}", request.source);
            FulfillError::UnknownProvider(request.source)
        })?;
        let url = provider.build_query(&request.endpoint, &request.params)?;

        sink.emit(RequestEvent {
            request_id,
            stage: RequestStage::Dispatched(request.source),
        });
        let body = self.fetcher.get_json(&url).await?;

        let items = provider.result_items(&body);
        let gifs: Vec<GifResult> = items
            .iter()
            .filter_map(|item| provider.normalize(item))
            .collect();
        let dropped = items.len() - gifs.len();
        if dropped > 0 {
            deck_debug!(
                "dropped {} malformed {} item(s) for request {}",
                dropped,
                request.source,
                request_id
            );
        }
        deck_info!(
            "{} {} returned {} gif(s)",
            request.source,
            request.endpoint,
            gifs.len()
        );
        Ok(gifs)
    }
}
