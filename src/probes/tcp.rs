//! TCP dial probe.

use std::time::Duration;

use tokio::net::TcpStream;

use crate::health::{CheckContext, CheckError, Checker};
use crate::resilience::check_with_backoff;

/// Checker that succeeds when a TCP connection to `address` can be opened.
///
/// Each attempt is bounded by the check context; failed attempts are retried
/// with backoff derived from `base_interval`.
pub fn tcp_checker(address: impl Into<String>, base_interval: Duration) -> impl Checker {
    let address = address.into();
    move |ctx: CheckContext| {
        let address = address.clone();
        async move {
            check_with_backoff(&ctx, base_interval, || dial(&ctx, &address)).await
        }
    }
}

/// Open and immediately drop one connection to `address`.
pub async fn dial(ctx: &CheckContext, address: &str) -> Result<(), CheckError> {
    let stream = ctx.run(TcpStream::connect(address)).await??;
    tracing::trace!(address, peer = ?stream.peer_addr().ok(), "Dial probe connected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_dial_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let ctx = CheckContext::background().with_timeout(Duration::from_secs(1));
        let result = tcp_checker(address, Duration::from_millis(100)).check(ctx).await;
        assert!(result.is_up());
    }

    #[tokio::test]
    async fn test_dial_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let ctx = CheckContext::background().with_timeout(Duration::from_millis(200));
        let result = tcp_checker(address, Duration::from_millis(100)).check(ctx).await;
        assert!(!result.is_up());
        assert!(matches!(result.error, Some(CheckError::Probe(_))));
    }
}
