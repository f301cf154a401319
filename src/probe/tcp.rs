//! Single TCP connect attempt
//!
//! One attempt per call, no retries; retry policy lives in the scheduler.
//! The elapsed wall-clock time of the handshake is the reported RTT; there
//! is no payload exchange.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::{TcpSocket, TcpStream};

use crate::state::ProbeOutcome;

/// Attempt one TCP connection to `addr`, bounded by `timeout`.
///
/// `source` optionally pins the local endpoint (port 0, kernel-chosen). The
/// connection is closed immediately after the handshake to minimize
/// target-side resource use. The per-probe timeout is independent of the
/// scheduler's overall run timeout and should stay below the tick interval.
pub async fn attempt(addr: SocketAddr, timeout: Duration, source: Option<IpAddr>) -> ProbeOutcome {
    let started = Instant::now();
    match tokio::time::timeout(timeout, connect(addr, source)).await {
        Ok(Ok(stream)) => {
            let elapsed = started.elapsed();
            drop(stream);
            ProbeOutcome::Success { elapsed }
        }
        Ok(Err(_)) | Err(_) => ProbeOutcome::Failure,
    }
}

async fn connect(addr: SocketAddr, source: Option<IpAddr>) -> io::Result<TcpStream> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    if let Some(ip) = source {
        socket.bind(SocketAddr::new(ip, 0))?;
    }

    socket.connect(addr).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_attempt_succeeds_against_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let outcome = attempt(addr, Duration::from_secs(1), None).await;
        match outcome {
            ProbeOutcome::Success { elapsed } => {
                assert!(elapsed < Duration::from_secs(1));
            }
            ProbeOutcome::Failure => panic!("connect to live listener failed"),
        }
    }

    #[tokio::test]
    async fn test_attempt_fails_against_closed_port() {
        // Bind-then-drop to get a port with nothing listening on it
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = attempt(addr, Duration::from_secs(1), None).await;
        assert_eq!(outcome, ProbeOutcome::Failure);
    }

    #[tokio::test]
    async fn test_attempt_with_loopback_source_binding() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let source = Some(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let outcome = attempt(addr, Duration::from_secs(1), source).await;
        assert!(outcome.is_success());
    }
}
