//! Typed messages exchanged between execution contexts.
//!
//! On the wire a message is `{name, origin, requestId?, isResponse, payload}`;
//! the payload shape is fixed by `name`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bus::BusError;
use crate::types::{GifResult, GifSource, QueryParams};

/// Execution context a message was produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Content,
    Background,
    Inject,
}

impl Origin {
    /// Label used to tag log lines emitted from this context.
    pub fn label(self) -> &'static str {
        match self {
            Origin::Content => "content",
            Origin::Background => "background",
            Origin::Inject => "inject",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageName {
    MakeGifRequest,
    GifRequestResult,
    FetchThumbnail,
    ChirpResult,
}

impl MessageName {
    /// The tag a reply to this message must carry, if it expects one.
    pub fn result_name(self) -> Option<MessageName> {
        match self {
            MessageName::MakeGifRequest => Some(MessageName::GifRequestResult),
            MessageName::GifRequestResult
            | MessageName::FetchThumbnail
            | MessageName::ChirpResult => None,
        }
    }
}

impl fmt::Display for MessageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageName::MakeGifRequest => "MAKE_GIF_REQUEST",
            MessageName::GifRequestResult => "GIF_REQUEST_RESULT",
            MessageName::FetchThumbnail => "FETCH_THUMBNAIL",
            MessageName::ChirpResult => "CHIRP_RESULT",
        };
        f.write_str(name)
    }
}

/// Correlation token linking a reply to its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifRequest {
    pub endpoint: String,
    pub source: GifSource,
    #[serde(default)]
    pub params: QueryParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GifResults {
    pub gifs: Vec<GifResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChirpResult {
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payload {
    MakeGifRequest(GifRequest),
    GifRequestResult(GifResults),
    FetchThumbnail(ThumbnailRequest),
    ChirpResult(ChirpResult),
}

impl Payload {
    pub fn name(&self) -> MessageName {
        match self {
            Payload::MakeGifRequest(_) => MessageName::MakeGifRequest,
            Payload::GifRequestResult(_) => MessageName::GifRequestResult,
            Payload::FetchThumbnail(_) => MessageName::FetchThumbnail,
            Payload::ChirpResult(_) => MessageName::ChirpResult,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub is_response: bool,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Message {
    /// A fire-and-forget message; no reply is expected.
    pub fn notification(origin: Origin, payload: Payload) -> Self {
        Self {
            origin,
            request_id: None,
            is_response: false,
            payload,
        }
    }

    /// A message expecting exactly one reply, with a fresh correlation id.
    ///
    /// Only tags with a paired result tag can be requests; anything else is
    /// a notification and gets [`BusError::NotARequest`].
    pub fn request(origin: Origin, payload: Payload) -> Result<Self, BusError> {
        if payload.name().result_name().is_none() {
            return Err(BusError::NotARequest(payload.name()));
        }
        Ok(Self {
            origin,
            request_id: Some(RequestId::new()),
            is_response: false,
            payload,
        })
    }

    pub fn name(&self) -> MessageName {
        self.payload.name()
    }

    /// Builds the reply to this request.
    ///
    /// The reply keeps the request's origin and id so it routes back to the
    /// sender, and its tag must be the result tag paired with the request.
    pub fn reply(&self, payload: Payload) -> Result<Message, BusError> {
        let request_id = match self.request_id {
            Some(id) if !self.is_response => id,
            _ => return Err(BusError::NotARequest(self.name())),
        };
        if self.name().result_name() != Some(payload.name()) {
            return Err(BusError::MismatchedReply {
                request: self.name(),
                reply: payload.name(),
            });
        }
        Ok(Message {
            origin: self.origin,
            request_id: Some(request_id),
            is_response: true,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gif_request() -> Payload {
        let mut params = QueryParams::new();
        params.insert("q".to_string(), "cat".to_string());
        Payload::MakeGifRequest(GifRequest {
            endpoint: "search".to_string(),
            source: GifSource::Giphy,
            params,
        })
    }

    #[test]
    fn wire_format_flattens_name_and_payload() {
        let message = Message::notification(
            Origin::Content,
            Payload::FetchThumbnail(ThumbnailRequest {
                url: "https://t.co/a".to_string(),
            }),
        );
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "FETCH_THUMBNAIL",
                "origin": "content",
                "isResponse": false,
                "payload": {"url": "https://t.co/a"}
            })
        );
    }

    #[test]
    fn request_parses_from_wire() {
        let raw = json!({
            "name": "MAKE_GIF_REQUEST",
            "origin": "content",
            "requestId": "6f1c2b8e-31a4-4a43-9d2a-1c0f8f6b9a11",
            "isResponse": false,
            "payload": {"endpoint": "search", "source": "tenor", "params": {"q": "dog", "limit": "10"}}
        });
        let message: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(message.name(), MessageName::MakeGifRequest);
        assert!(message.request_id.is_some());
        match message.payload {
            Payload::MakeGifRequest(req) => {
                assert_eq!(req.source, GifSource::Tenor);
                assert_eq!(req.params.keys().collect::<Vec<_>>(), vec!["q", "limit"]);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn reply_keeps_correlation_and_uses_result_tag() {
        let request = Message::request(Origin::Inject, gif_request()).unwrap();
        let reply = request
            .reply(Payload::GifRequestResult(GifResults::default()))
            .unwrap();
        assert_eq!(reply.request_id, request.request_id);
        assert_eq!(reply.origin, Origin::Inject);
        assert!(reply.is_response);
        assert_eq!(reply.name(), MessageName::GifRequestResult);
    }

    #[test]
    fn reply_rejects_wrong_tag_and_notifications() {
        let request = Message::request(Origin::Content, gif_request()).unwrap();
        let err = request
            .reply(Payload::ChirpResult(ChirpResult::default()))
            .unwrap_err();
        assert_eq!(
            err,
            BusError::MismatchedReply {
                request: MessageName::MakeGifRequest,
                reply: MessageName::ChirpResult,
            }
        );

        let notification = Message::notification(Origin::Content, gif_request());
        assert_eq!(
            notification
                .reply(Payload::GifRequestResult(GifResults::default()))
                .unwrap_err(),
            BusError::NotARequest(MessageName::MakeGifRequest)
        );
    }

    #[test]
    fn notifications_cannot_be_sent_as_requests() {
        for payload in [
            Payload::FetchThumbnail(ThumbnailRequest { url: "a".to_string() }),
            Payload::ChirpResult(ChirpResult::default()),
            Payload::GifRequestResult(GifResults::default()),
        ] {
            let name = payload.name();
            assert_eq!(
                Message::request(Origin::Content, payload).unwrap_err(),
                BusError::NotARequest(name)
            );
        }
    }
}
