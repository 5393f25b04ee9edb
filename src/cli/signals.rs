//! Shutdown signal handling

use crate::application::CancelToken;

/// Shutdown request from Ctrl+C (or SIGTERM on Unix)
pub struct ShutdownSignal {
    token: CancelToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            token: CancelToken::new(),
        }
    }

    /// Token that fires once shutdown is requested
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Wait until shutdown is requested
    pub async fn wait(&self) {
        self.token.cancelled().await
    }

    /// Start listening for OS signals
    pub async fn setup(&self) -> Result<(), std::io::Error> {
        let token = self.token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Received SIGINT");
                token.cancel();
            }
        });

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let token = self.token.clone();
            let mut sigterm = signal(SignalKind::terminate())?;
            tokio::spawn(async move {
                sigterm.recv().await;
                tracing::debug!("Received SIGTERM");
                token.cancel();
            });
        }

        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_signal_default_is_false() {
        let signal = ShutdownSignal::new();
        assert!(!signal.token().is_cancelled());
    }

    #[tokio::test]
    async fn token_triggers_shutdown() {
        let signal = ShutdownSignal::new();
        signal.token().cancel();
        signal.wait().await;
    }
}
