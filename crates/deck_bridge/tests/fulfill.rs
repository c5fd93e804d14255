use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use deck_bridge::{
    connect, BackgroundService, BridgeConfig, FulfillError, GifRequest, GifRequestService,
    GifResult, GifSource, Message, MessageName, Origin, Payload, ProviderConfig, ProviderRegistry,
    QueryParams, ReqwestFetcher, RequestEvent, RequestId, RequestSink, RequestStage,
    ThumbnailHandler, ThumbnailRequest,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(deck_logging::initialize_for_tests);
}

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<RequestEvent>>,
}

impl TestSink {
    fn stages(&self) -> Vec<RequestStage> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.stage.clone())
            .collect()
    }
}

impl RequestSink for TestSink {
    fn emit(&self, event: RequestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn config_for(server: &MockServer) -> BridgeConfig {
    BridgeConfig::from_json_str(&format!(
        r#"{{"giphy": {{"apiKey": "g-key", "baseUrl": "{uri}/giphy/"}},
            "tenor": {{"apiKey": "t-key", "baseUrl": "{uri}/tenor/"}}}}"#,
        uri = server.uri()
    ))
    .unwrap()
}

fn gif_request(source: GifSource, endpoint: &str, params: &[(&str, &str)]) -> Message {
    let params: QueryParams = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Message::request(
        Origin::Content,
        Payload::MakeGifRequest(GifRequest {
            endpoint: endpoint.to_string(),
            source,
            params,
        }),
    )
    .unwrap()
}

fn gifs_of(message: &Message) -> &[GifResult] {
    match &message.payload {
        Payload::GifRequestResult(results) => &results.gifs,
        other => panic!("expected a result payload, got {other:?}"),
    }
}

fn giphy_item(preview: &str, original: &str) -> serde_json::Value {
    json!({
        "images": {
            "preview_gif": {"url": preview, "width": "100", "height": "80"},
            "original": {"url": original}
        }
    })
}

#[tokio::test]
async fn giphy_search_sends_key_then_params_and_correlates_reply() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/giphy/search"))
        .and(query_param("api_key", "g-key"))
        .and(query_param("q", "cat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                giphy_item("https://media.giphy.com/1p.gif", "https://media.giphy.com/1.gif"),
                {"images": {"original": {"url": "https://media.giphy.com/2.gif"}}},
                giphy_item("https://media.giphy.com/3p.gif", "https://media.giphy.com/3.gif"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = GifRequestService::from_config(&config_for(&server)).unwrap();
    let sink = TestSink::default();
    let request = gif_request(GifSource::Giphy, "search", &[("q", "cat")]);

    let reply = service.process(&request, &sink).await.expect("request resolves");

    assert_eq!(reply.request_id, request.request_id);
    assert_eq!(reply.origin, request.origin);
    assert_eq!(reply.name(), MessageName::GifRequestResult);
    assert!(reply.is_response);
    let urls: Vec<&str> = gifs_of(&reply).iter().map(|g| g.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://media.giphy.com/1.gif", "https://media.giphy.com/3.gif"]
    );

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), Some("api_key=g-key&q=cat"));

    assert_eq!(
        sink.stages(),
        vec![
            RequestStage::Received,
            RequestStage::Dispatched(GifSource::Giphy),
            RequestStage::Resolved { count: 2 },
        ]
    );
}

#[tokio::test]
async fn tenor_results_are_normalized() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tenor/trending"))
        .and(query_param("key", "t-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "media": [{
                    "tinygif": {"url": "https://media.tenor.com/t.gif", "dims": [220, 160]},
                    "gif": {"url": "https://media.tenor.com/g.gif"}
                }]
            }]
        })))
        .mount(&server)
        .await;

    let service = GifRequestService::from_config(&config_for(&server)).unwrap();
    let request = gif_request(GifSource::Tenor, "trending", &[("limit", "1")]);

    let reply = service.process(&request, &TestSink::default()).await.unwrap();

    assert_eq!(reply.request_id, request.request_id);
    assert_eq!(reply.name(), MessageName::GifRequestResult);
    assert!(reply.is_response);
    let gifs = gifs_of(&reply);
    assert_eq!(gifs.len(), 1);
    assert_eq!(gifs[0].source, GifSource::Tenor);
    assert_eq!(gifs[0].preview.url, "https://media.tenor.com/t.gif");
    assert_eq!((gifs[0].preview.width, gifs[0].preview.height), (220, 160));
}

#[tokio::test]
async fn absent_or_null_results_resolve_empty() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/giphy/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tenor/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"next": "0"})))
        .mount(&server)
        .await;

    let service = GifRequestService::from_config(&config_for(&server)).unwrap();
    for source in [GifSource::Giphy, GifSource::Tenor] {
        let sink = TestSink::default();
        let reply = service
            .process(&gif_request(source, "search", &[("q", "x")]), &sink)
            .await
            .expect("empty is success");
        assert!(gifs_of(&reply).is_empty());
        assert_eq!(sink.stages().last(), Some(&RequestStage::Resolved { count: 0 }));
    }
}

#[tokio::test]
async fn upstream_failure_rejects_whole_request() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/giphy/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = GifRequestService::from_config(&config_for(&server)).unwrap();
    let sink = TestSink::default();
    let err = service
        .process(&gif_request(GifSource::Giphy, "search", &[]), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, FulfillError::Fetch(_)));
    assert!(matches!(
        sink.stages().last(),
        Some(RequestStage::Failed { .. })
    ));
}

#[tokio::test]
async fn unregistered_source_is_a_configuration_error() {
    init_logging();
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(deck_bridge::GiphyProvider::new(
        ProviderConfig::new("http://127.0.0.1:9/", "g").unwrap(),
    )));
    let fetcher = ReqwestFetcher::new(Default::default()).unwrap();
    let service = GifRequestService::new(registry, Arc::new(fetcher));

    let err = service
        .process(&gif_request(GifSource::Tenor, "search", &[]), &TestSink::default())
        .await
        .unwrap_err();
    assert_eq!(err, FulfillError::UnknownProvider(GifSource::Tenor));
}

#[tokio::test]
async fn non_request_messages_are_rejected() {
    init_logging();
    let server = MockServer::start().await;
    let service = GifRequestService::from_config(&config_for(&server)).unwrap();
    let sink = TestSink::default();

    let wrong_tag = Message {
        request_id: Some(RequestId::new()),
        ..Message::notification(
            Origin::Content,
            Payload::FetchThumbnail(ThumbnailRequest { url: "u".into() }),
        )
    };
    assert_eq!(
        service.process(&wrong_tag, &sink).await.unwrap_err(),
        FulfillError::UnexpectedMessage(MessageName::FetchThumbnail)
    );

    let mut uncorrelated = gif_request(GifSource::Giphy, "search", &[]);
    uncorrelated.request_id = None;
    assert!(matches!(
        service.process(&uncorrelated, &sink).await,
        Err(FulfillError::Bus(_))
    ));
    assert!(sink.stages().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[derive(Default)]
struct RecordingThumbnails {
    urls: Mutex<Vec<String>>,
}

impl ThumbnailHandler for RecordingThumbnails {
    fn fetch_thumbnail(&self, url: &str) {
        self.urls.lock().unwrap().push(url.to_string());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_service_answers_over_the_bus() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/giphy/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [giphy_item("https://m.giphy.com/p.gif", "https://m.giphy.com/o.gif")]
        })))
        .mount(&server)
        .await;

    let ((content, content_inbox), (background, background_inbox)) =
        connect(Origin::Content, Origin::Background);
    tokio::spawn(content_inbox.run());
    tokio::spawn(background_inbox.run());

    let service = Arc::new(GifRequestService::from_config(&config_for(&server)).unwrap());
    let thumbnails = Arc::new(RecordingThumbnails::default());
    let running = BackgroundService::start(
        tokio::runtime::Handle::current(),
        background,
        service,
        thumbnails.clone(),
    );

    let mut params = QueryParams::new();
    params.insert("q".into(), "cat".into());
    let pending = content
        .request(Payload::MakeGifRequest(GifRequest {
            endpoint: "search".into(),
            source: GifSource::Giphy,
            params,
        }))
        .unwrap();
    let id = pending.id();
    let reply = pending
        .recv_timeout(Duration::from_secs(5))
        .await
        .expect("reply arrives");
    assert_eq!(reply.request_id, Some(id));
    assert_eq!(gifs_of(&reply).len(), 1);

    content.notify(Payload::FetchThumbnail(ThumbnailRequest {
        url: "https://t.co/a".into(),
    }));
    tokio::time::timeout(Duration::from_secs(5), async {
        while thumbnails.urls.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("thumbnail handled");
    assert_eq!(*thumbnails.urls.lock().unwrap(), vec!["https://t.co/a"]);

    running.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_request_surfaces_only_as_timeout() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let ((content, content_inbox), (background, background_inbox)) =
        connect(Origin::Content, Origin::Background);
    tokio::spawn(content_inbox.run());
    tokio::spawn(background_inbox.run());

    let service = Arc::new(GifRequestService::from_config(&config_for(&server)).unwrap());
    let running = BackgroundService::start(
        tokio::runtime::Handle::current(),
        background,
        service,
        Arc::new(deck_bridge::LogThumbnails),
    );

    let pending = content
        .request(Payload::MakeGifRequest(GifRequest {
            endpoint: "search".into(),
            source: GifSource::Tenor,
            params: QueryParams::new(),
        }))
        .unwrap();
    let err = pending
        .recv_timeout(Duration::from_millis(300))
        .await
        .unwrap_err();
    assert_eq!(err, deck_bridge::BusError::Timeout(Duration::from_millis(300)));

    running.shutdown();
}
