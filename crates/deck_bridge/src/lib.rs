//! Deck bridge: cross-context messaging and request fulfillment.
mod background;
mod bus;
mod config;
mod content;
mod fetch;
mod fulfill;
mod message;
mod persist;
mod providers;
mod settings;
mod types;

pub use background::{BackgroundService, LogThumbnails, ThumbnailHandler};
pub use bus::{connect, Bus, BusError, ChannelTransport, Inbox, PendingReply, Subscription, Transport};
pub use config::{BridgeConfig, ConfigError, ProviderConfig, GIPHY_BASE_URL, TENOR_BASE_URL};
pub use content::{thumbnail_notification, ContentRelay};
pub use fetch::{FetchSettings, JsonFetcher, ReqwestFetcher};
pub use fulfill::{
    FulfillError, GifRequestService, LogRequestSink, RequestEvent, RequestSink, RequestStage,
};
pub use message::{
    ChirpResult, GifRequest, GifResults, Message, MessageName, Origin, Payload, RequestId,
    ThumbnailRequest,
};
pub use persist::{
    ensure_dir, write_atomic, JsonFileSettingsStore, PersistError, SettingsStore,
    SETTINGS_FILENAME,
};
pub use providers::{GifProvider, GiphyProvider, ProviderRegistry, TenorProvider};
pub use settings::{HostSettingsOpener, SettingsEffectRunner};
pub use types::{FailureKind, FetchError, GifPreview, GifResult, GifSource, QueryParams};
