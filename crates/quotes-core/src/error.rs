//! Error types for the quote collector.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a terminal session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Rejected by terminal ({code}): {message}")]
    Rejected { code: i32, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Session closed")]
    Closed,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single failed connection attempt.
#[derive(Debug, Clone)]
pub struct ConnectAttempt {
    pub client_id: i32,
    pub reason: String,
}

/// Errors raised by the collector.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Could not connect to {endpoint} with any client id ({})", format_attempts(.attempts))]
    Connection {
        endpoint: String,
        attempts: Vec<ConnectAttempt>,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

fn format_attempts(attempts: &[ConnectAttempt]) -> String {
    if attempts.is_empty() {
        return "no client ids configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.client_id, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Table persistence errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Write error: {0}")]
    WriteError(String),

    #[error("Table is empty")]
    EmptyTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_lists_attempts() {
        let err = CollectorError::Connection {
            endpoint: "127.0.0.1:7497".to_string(),
            attempts: vec![
                ConnectAttempt {
                    client_id: 10,
                    reason: "refused".to_string(),
                },
                ConnectAttempt {
                    client_id: 20,
                    reason: "timed out".to_string(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("127.0.0.1:7497"));
        assert!(text.contains("10: refused"));
        assert!(text.contains("20: timed out"));
    }
}
