use std::sync::{Arc, Mutex};

use deck_bridge::{
    connect, thumbnail_notification, ChirpResult, ContentRelay, Message, MessageName, Origin,
    Payload, ThumbnailRequest,
};

fn chirp(urls: &[&str]) -> Payload {
    Payload::ChirpResult(ChirpResult {
        urls: urls.iter().map(|u| u.to_string()).collect(),
    })
}

#[test]
fn only_first_url_is_forwarded() {
    assert_eq!(
        thumbnail_notification(&ChirpResult {
            urls: vec!["a".to_string(), "b".to_string()],
        }),
        Some(Payload::FetchThumbnail(ThumbnailRequest {
            url: "a".to_string()
        }))
    );
    assert_eq!(thumbnail_notification(&ChirpResult::default()), None);
}

#[test]
fn relay_sends_fire_and_forget_thumbnail_fetch() {
    let ((page, _page_inbox), (content_page_side, mut content_page_inbox)) =
        connect(Origin::Inject, Origin::Content);
    let ((content_bg_side, _content_bg_inbox), (background, mut background_inbox)) =
        connect(Origin::Content, Origin::Background);

    let seen: Arc<Mutex<Vec<Message>>> = Arc::default();
    let recorder = seen.clone();
    let _sub = background.listen(MessageName::FetchThumbnail, Origin::Content, move |msg| {
        recorder.lock().unwrap().push(msg.clone());
    });

    let relay = ContentRelay::install(&content_page_side, content_bg_side);

    page.notify(chirp(&["a", "b"]));
    page.notify(chirp(&[]));
    content_page_inbox.drain();
    background_inbox.drain();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0],
        Message {
            origin: Origin::Content,
            request_id: None,
            is_response: false,
            payload: Payload::FetchThumbnail(ThumbnailRequest {
                url: "a".to_string()
            }),
        }
    );
    drop(seen);

    relay.uninstall();
}

#[test]
fn uninstalled_relay_forwards_nothing() {
    let ((page, _page_inbox), (content_page_side, mut content_page_inbox)) =
        connect(Origin::Inject, Origin::Content);
    let ((content_bg_side, _content_bg_inbox), (_background, mut background_inbox)) =
        connect(Origin::Content, Origin::Background);

    ContentRelay::install(&content_page_side, content_bg_side).uninstall();
    page.notify(chirp(&["a"]));
    content_page_inbox.drain();

    assert_eq!(background_inbox.drain(), 0);
}
