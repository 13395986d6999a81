//! WebSocket transport against a local tungstenite server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::accept_hdr_async;
use url::Url;

use jetvisor::{
    ConnectionError, ConnectionState, Dispatcher, Firehose, SubscriptionOptions, topic,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// What the relay does after the handshake.
enum Script {
    /// Sends the frames, then closes with `code`.
    SendThenClose(Vec<Message>, CloseCode),
    /// Sends the frames, then waits for the client to close.
    SendThenWait(Vec<Message>),
}

struct Relay {
    service: String,
    uri: oneshot::Receiver<String>,
    client_closed: oneshot::Receiver<bool>,
}

/// Boots a one-connection relay on an ephemeral port.
async fn boot_relay(script: Script) -> Relay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (uri_tx, uri_rx) = oneshot::channel();
    let (closed_tx, closed_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let _ = uri_tx.send(req.uri().to_string());
            Ok(resp)
        };
        let mut ws = accept_hdr_async(stream, callback).await.unwrap();

        match script {
            Script::SendThenClose(frames, code) => {
                for frame in frames {
                    ws.send(frame).await.unwrap();
                }
                let _ = ws
                    .close(Some(CloseFrame {
                        code,
                        reason: "bye".into(),
                    }))
                    .await;
                while ws.next().await.is_some() {}
                let _ = closed_tx.send(false);
            }
            Script::SendThenWait(frames) => {
                for frame in frames {
                    ws.send(frame).await.unwrap();
                }
                let mut saw_close = false;
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_close() {
                        saw_close = true;
                    }
                }
                let _ = closed_tx.send(saw_close);
            }
        }
    });

    Relay {
        service: addr.to_string(),
        uri: uri_rx,
        client_closed: closed_rx,
    }
}

fn post(time_us: u64, rkey: &str) -> Message {
    Message::text(
        json!({
            "did": "did:plc:alice",
            "time_us": time_us,
            "kind": "commit",
            "commit": {
                "operation": "create",
                "rev": "3l3qo2vutsw2b",
                "collection": "app.bsky.feed.post",
                "rkey": rkey,
                "cid": "bafyreidwaivazkwu67xztlmuobx35hs2lnfh3kolmgfmucldvhd3sgzcqi",
                "record": { "text": "hi" }
            }
        })
        .to_string(),
    )
}

fn counting_dispatcher() -> (Arc<Dispatcher>, Arc<Mutex<Vec<String>>>) {
    let dispatcher = Arc::new(Dispatcher::new());
    let rkeys = Arc::new(Mutex::new(Vec::new()));
    let r = Arc::clone(&rkeys);
    dispatcher.on::<topic::Create>(move |ev| r.lock().push(ev.commit.rkey.clone()));
    (dispatcher, rkeys)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sends_filters_and_delivers_text_frames() {
    let relay = boot_relay(Script::SendThenClose(
        vec![
            post(100, "a"),
            Message::Ping(vec![1, 2, 3].into()),
            Message::Binary(vec![0u8; 8].into()),
            post(101, "b"),
        ],
        CloseCode::Normal,
    ))
    .await;

    let opts = SubscriptionOptions::builder(relay.service.as_str())
        .collection("app.bsky.feed.post")
        .collection("app.bsky.graph.*")
        .repo("did:plc:alice")
        .cursor(42)
        .secure(false)
        .build();
    let (dispatcher, rkeys) = counting_dispatcher();
    let firehose = Firehose::builder(opts)
        .with_dispatcher(dispatcher)
        .build()
        .unwrap();

    let uri = timeout(TIMEOUT, relay.uri).await.unwrap().unwrap();
    let requested = Url::parse(&format!("ws://relay{uri}")).unwrap();
    let pairs: Vec<(String, String)> = requested.query_pairs().into_owned().collect();
    assert_eq!(requested.path(), "/subscribe");
    assert_eq!(
        pairs,
        [
            ("cursor".to_owned(), "42".to_owned()),
            ("wantedCollections".to_owned(), "app.bsky.feed.post".to_owned()),
            ("wantedCollections".to_owned(), "app.bsky.graph.*".to_owned()),
            ("wantedDids".to_owned(), "did:plc:alice".to_owned()),
        ]
    );

    let err = timeout(TIMEOUT, firehose.closed()).await.unwrap();
    assert_eq!(err, None);
    assert_eq!(*rkeys.lock(), ["a", "b"]);
    assert_eq!(firehose.cursor(), Some(101));
}

#[tokio::test]
async fn abnormal_close_is_an_error() {
    let relay = boot_relay(Script::SendThenClose(
        vec![post(200, "a")],
        CloseCode::Policy,
    ))
    .await;

    let opts = SubscriptionOptions::new(relay.service.as_str()).with_secure(false);
    let (dispatcher, rkeys) = counting_dispatcher();
    let firehose = Firehose::builder(opts)
        .with_dispatcher(dispatcher)
        .build()
        .unwrap();

    let err = timeout(TIMEOUT, firehose.closed()).await.unwrap();
    assert_eq!(
        err,
        Some(ConnectionError::Closed {
            code: 1008,
            reason: "bye".into(),
        })
    );
    assert_eq!(*rkeys.lock(), ["a"]);
}

#[tokio::test]
async fn client_close_sends_close_frame() {
    let relay = boot_relay(Script::SendThenWait(vec![post(300, "a")])).await;

    let opts = SubscriptionOptions::new(relay.service.as_str()).with_secure(false);
    let dispatcher = Arc::new(Dispatcher::new());
    let hits = Arc::new(AtomicUsize::new(0));
    let (first_tx, first_rx) = oneshot::channel::<()>();
    let first_tx = Mutex::new(Some(first_tx));
    let h = Arc::clone(&hits);
    dispatcher.on::<topic::Create>(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = first_tx.lock().take() {
            let _ = tx.send(());
        }
    });

    let firehose = Firehose::builder(opts)
        .with_dispatcher(dispatcher)
        .build()
        .unwrap();
    timeout(TIMEOUT, first_rx).await.unwrap().unwrap();
    assert_eq!(firehose.state(), ConnectionState::Open);

    firehose.close();
    assert_eq!(timeout(TIMEOUT, firehose.closed()).await.unwrap(), None);
    assert!(timeout(TIMEOUT, relay.client_closed).await.unwrap().unwrap());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
