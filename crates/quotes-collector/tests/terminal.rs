//! End-to-end collection against a loopback terminal speaking the wire framing.

use quotes_collector::{Collector, CollectorConfig, WaitPolicy};
use quotes_core::error::CollectorError;
use quotes_core::SecurityResolver;
use quotes_session::tws::codec;
use quotes_session::{TwsConfig, TwsConnector};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

/// Terminal that quotes SPY and GLD, adds a fee for GLD and a stray tick.
async fn run_terminal(listener: TcpListener) {
    let (mut stream, _) = listener.accept().await.unwrap();
    let mut prefix = [0u8; 4];
    stream.read_exact(&mut prefix).await.unwrap();
    codec::read_frame(&mut stream).await.unwrap();
    codec::write_frame(&mut stream, &["176", "20240117 10:00:00 EST"])
        .await
        .unwrap();
    codec::read_frame(&mut stream).await.unwrap();
    codec::write_frame(&mut stream, &["9", "1", "1"]).await.unwrap();

    while let Ok(Some(fields)) = codec::read_frame(&mut stream).await {
        if fields[0] != "1" {
            continue;
        }
        let req_id = fields[2].as_str();
        match fields[4].as_str() {
            "SPY" => {
                codec::write_frame(&mut stream, &["1", "6", req_id, "68", "445.21", "1", "0"])
                    .await
                    .unwrap();
            }
            "GLD" => {
                codec::write_frame(&mut stream, &["46", "6", req_id, "47", "0.45"])
                    .await
                    .unwrap();
                codec::write_frame(&mut stream, &["1", "6", "77", "68", "1.00", "1", "0"])
                    .await
                    .unwrap();
                codec::write_frame(&mut stream, &["1", "6", req_id, "68", "180.55", "1", "0"])
                    .await
                    .unwrap();
            }
            _ => {}
        }
    }
}

fn config(timeout: Duration) -> CollectorConfig {
    CollectorConfig {
        client_ids: vec![10],
        wait: WaitPolicy {
            per_symbol_hint: Duration::ZERO,
            overall_timeout: timeout,
            poll_interval: Duration::from_millis(20),
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_collect_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let terminal = tokio::spawn(run_terminal(listener));

    let connector = TwsConnector::new(
        TwsConfig::paper_trading()
            .with_port(port)
            .with_connect_timeout(Duration::from_secs(2)),
    );
    let collector = Collector::new(
        connector,
        SecurityResolver::default(),
        config(Duration::from_millis(500)),
    );

    let symbols: Vec<String> = ["SPY", "GLD", "IAU"].iter().map(|s| s.to_string()).collect();
    let table = collector.collect(&symbols).await.unwrap();

    let rows = table.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].price, Some(445.21));
    assert_eq!(rows[0].short_fee, None);
    assert_eq!(rows[1].price, Some(180.55));
    assert_eq!(rows[1].short_fee, Some(0.45));
    assert!(rows[2].is_empty());

    // The terminal task ends once the collector has disconnected.
    tokio::time::timeout(Duration::from_secs(2), terminal)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_collect_without_terminal_fails_to_connect() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let connector = TwsConnector::new(
        TwsConfig::paper_trading()
            .with_port(port)
            .with_connect_timeout(Duration::from_millis(500)),
    );
    let mut cfg = config(Duration::from_millis(200));
    cfg.client_ids = vec![10, 20, 30, 40, 50];
    let collector = Collector::new(connector, SecurityResolver::default(), cfg);

    match collector.collect(&["SPY".to_string()]).await {
        Err(CollectorError::Connection { attempts, .. }) => assert_eq!(attempts.len(), 5),
        other => panic!("expected connection error, got {:?}", other.map(|t| t.len())),
    }
}
