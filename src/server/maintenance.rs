use super::ChatServer;

impl ChatServer {
    /// Start the periodic sweep of expired credentials.
    ///
    /// Returns the `JoinHandle` so callers can abort the task during shutdown.
    pub fn start_credential_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let interval = self.config.credential_sweep_interval;
        tracing::debug!(
            interval_ms = interval.as_millis() as u64,
            "Starting credential sweeper"
        );
        self.credentials.clone().start_sweep_task(interval)
    }
}
