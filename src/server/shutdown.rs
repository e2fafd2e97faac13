use tokio::select;
use tokio_util::sync::CancellationToken;

/// Cancels `cancelation` once the process receives Ctrl-C. Returns early if somebody else cancels
/// the token first.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::detect_shutdown;

    #[tokio::test]
    async fn test_returns_once_cancelled_elsewhere() {
        let token = CancellationToken::new();
        token.cancel();
        detect_shutdown(token.clone()).await;
        assert!(token.is_cancelled());
    }
}
