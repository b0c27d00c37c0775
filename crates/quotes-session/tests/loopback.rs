//! Drives the TCP session against an in-test terminal on a loopback port.

use quotes_core::error::SessionError;
use quotes_core::traits::{QuoteSession, SessionConnector};
use quotes_core::types::{MarketDataClass, SessionEvent, Subscription, TickKind, TickValue};
use quotes_core::SecurityResolver;
use quotes_session::tws::codec;
use quotes_session::{TwsConfig, TwsConnector};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Accept one client, complete the handshake, and answer market data requests.
///
/// Returns every frame the client sent after the start-API message.
async fn serve_one(listener: TcpListener, refuse: bool) -> Vec<Vec<String>> {
    let (mut stream, _) = listener.accept().await.unwrap();
    handshake(&mut stream, refuse).await;
    if refuse {
        return Vec::new();
    }

    let mut received = Vec::new();
    while let Ok(Some(fields)) = codec::read_frame(&mut stream).await {
        if fields[0] == "1" {
            let req_id = fields[2].clone();
            let req_id = req_id.as_str();
            codec::write_frame(&mut stream, &["1", "6", req_id, "68", "445.21", "100", "0"])
                .await
                .unwrap();
            codec::write_frame(&mut stream, &["46", "6", req_id, "47", "0.30"])
                .await
                .unwrap();
            codec::write_frame(&mut stream, &["2", "6", req_id, "69", "300"])
                .await
                .unwrap();
        }
        received.push(fields);
    }
    received
}

async fn handshake(stream: &mut TcpStream, refuse: bool) {
    let mut prefix = [0u8; 4];
    stream.read_exact(&mut prefix).await.unwrap();
    assert_eq!(&prefix, codec::API_PREFIX);
    let versions = codec::read_frame(stream).await.unwrap().unwrap();
    assert_eq!(versions, vec!["v100..176"]);

    codec::write_frame(stream, &["176", "20240117 10:00:00 EST"])
        .await
        .unwrap();
    let start = codec::read_frame(stream).await.unwrap().unwrap();
    assert_eq!(start[0], "71");

    if refuse {
        codec::write_frame(stream, &["4", "2", "-1", "326", "client id is already in use"])
            .await
            .unwrap();
        return;
    }
    codec::write_frame(stream, &["4", "2", "-1", "2104", "Market data farm connection is OK"])
        .await
        .unwrap();
    codec::write_frame(stream, &["9", "1", "1"]).await.unwrap();
}

async fn bind() -> (TcpListener, TwsConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = TwsConfig::paper_trading()
        .with_port(port)
        .with_connect_timeout(Duration::from_secs(2));
    (listener, config)
}

#[tokio::test]
async fn test_session_receives_classified_ticks() {
    let (listener, config) = bind().await;
    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(async move {
        let frames = serve_one(listener, false).await;
        let _ = done_tx.send(frames);
    });

    let connector = TwsConnector::new(config);
    let mut session = connector.connect(10).await.unwrap();
    assert_eq!(session.server_version(), 176);

    session.set_data_class(MarketDataClass::Delayed).await.unwrap();
    let sub = Subscription::new(1, SecurityResolver::default().resolve("SPY"));
    session.subscribe(&sub, "233").await.unwrap();

    let mut kinds = Vec::new();
    while kinds.len() < 2 {
        let event = tokio::time::timeout(Duration::from_secs(2), session.events().recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            SessionEvent::Notice(notice) => assert!(notice.is_informational()),
            SessionEvent::Tick(tick) => {
                assert_eq!(tick.request_id, 1);
                match tick.kind {
                    TickKind::LastPrice => assert_eq!(tick.value, TickValue::Price(445.21)),
                    TickKind::ShortFee => assert_eq!(tick.value.as_number(), Some(0.30)),
                    TickKind::Other(code) => panic!("size ticks are not forwarded ({})", code),
                }
                kinds.push(tick.kind);
            }
            SessionEvent::Closed => panic!("closed early"),
        }
    }

    session.disconnect().await.unwrap();
    assert!(!session.is_connected());

    let frames = done_rx.await.unwrap();
    assert_eq!(frames[0], vec!["59", "1", "3"]);
    assert_eq!(frames[1][0], "1");
    assert_eq!(frames[1][4], "SPY");
    assert_eq!(frames[1][10], "ARCA");
}

#[tokio::test]
async fn test_session_rejected_client_id() {
    let (listener, config) = bind().await;
    tokio::spawn(serve_one(listener, true));

    let connector = TwsConnector::new(config);
    match connector.connect(10).await {
        Err(SessionError::Rejected { code, .. }) => assert_eq!(code, 326),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("connection should be rejected"),
    }
}

#[tokio::test]
async fn test_malformed_frame_skipped_and_hangup_closes_session() {
    let (listener, config) = bind().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut prefix = [0u8; 4];
        stream.read_exact(&mut prefix).await.unwrap();
        codec::read_frame(&mut stream).await.unwrap();
        codec::write_frame(&mut stream, &["176", "20240117 10:00:00 EST"])
            .await
            .unwrap();
        codec::read_frame(&mut stream).await.unwrap();
        codec::write_frame(&mut stream, &["1", "6", "not-a-request-id"])
            .await
            .unwrap();
        codec::write_frame(&mut stream, &["9", "1", "1"]).await.unwrap();
        // Dropping the stream hangs up.
    });

    let connector = TwsConnector::new(config);
    let mut session = connector.connect(10).await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), session.events().recv())
        .await
        .unwrap();
    assert_eq!(event, Some(SessionEvent::Closed));
    session.disconnect().await.unwrap();
}
