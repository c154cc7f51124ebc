//! In-memory one-time credential store with background expiry sweeping.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// A pending one-time credential.
#[derive(Debug, Clone, Copy)]
pub struct Credential {
    /// When the credential was issued
    pub issued_at: Instant,
}

impl Credential {
    /// A credential is usable in `[issued_at, issued_at + retention)`.
    pub fn is_expired(&self, now: Instant, retention: Duration) -> bool {
        now >= self.issued_at + retention
    }
}

/// Single-use, time-bound login tokens.
///
/// Every operation touches one `DashMap` shard under its lock, so a token can
/// be consumed by [`verify`](Self::verify) exactly once even when several
/// connections race with the same value.
pub struct CredentialStore {
    credentials: DashMap<String, Credential>,
    retention: Duration,
}

impl CredentialStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            credentials: DashMap::new(),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Issue a fresh token.
    pub fn issue(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.credentials.insert(
            token.clone(),
            Credential {
                issued_at: Instant::now(),
            },
        );
        tracing::debug!(pending = self.credentials.len(), "Issued one-time credential");
        token
    }

    /// Consume `token`. Returns `true` for exactly one caller per live token.
    pub fn verify(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        // Removal is the linearisation point: whoever takes the entry out of
        // the map owns the outcome, expired or not.
        let Some((_, credential)) = self.credentials.remove(token) else {
            tracing::debug!("Credential verification failed: unknown token");
            return false;
        };

        if credential.is_expired(Instant::now(), self.retention) {
            tracing::debug!("Credential verification failed: token expired");
            return false;
        }

        tracing::debug!("Credential verified and consumed");
        true
    }

    /// Same validity test as [`verify`](Self::verify) without consuming the
    /// token. Expired entries are still evicted.
    pub fn check(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        let now = Instant::now();
        let expired = match self.credentials.get(token) {
            Some(credential) => credential.is_expired(now, self.retention),
            None => return false,
        };

        if expired {
            self.credentials
                .remove_if(token, |_, credential| {
                    credential.is_expired(now, self.retention)
                });
            return false;
        }

        true
    }

    /// Evict every expired credential and return how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        self.credentials.retain(|_, credential| {
            let expired = credential.is_expired(now, self.retention);
            if expired {
                evicted += 1;
            }
            !expired
        });
        evicted
    }

    /// Number of credentials that have been issued and not yet consumed or
    /// swept.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Spawn a background task that periodically sweeps expired credentials so
    /// memory stays bounded by issuance rate times retention.
    ///
    /// Returns the `JoinHandle` so callers can abort the task during shutdown.
    pub fn start_sweep_task(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                let evicted = self.sweep();
                if evicted > 0 {
                    tracing::debug!(evicted, "Swept expired credentials");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_once() {
        let store = CredentialStore::new(Duration::from_secs(30));
        let token = store.issue();
        assert!(store.verify(&token));
        assert!(!store.verify(&token));
        assert!(store.is_empty());
    }

    #[test]
    fn empty_and_unknown_tokens_are_rejected() {
        let store = CredentialStore::new(Duration::from_secs(30));
        assert!(!store.verify(""));
        assert!(!store.check(""));
        assert!(!store.verify("not-a-token"));
        assert!(!store.check("not-a-token"));
    }

    #[test]
    fn check_does_not_consume() {
        let store = CredentialStore::new(Duration::from_secs(30));
        let token = store.issue();
        for _ in 0..5 {
            assert!(store.check(&token));
        }
        assert!(store.verify(&token));
        assert!(!store.check(&token));
    }

    #[test]
    fn tokens_are_unique() {
        let store = CredentialStore::new(Duration::from_secs(30));
        let first = store.issue();
        let second = store.issue();
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn expired_token_fails_verify_and_is_evicted() {
        let store = CredentialStore::new(Duration::from_millis(20));
        let token = store.issue();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!store.verify(&token));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expired_token_fails_check_and_is_evicted() {
        let store = CredentialStore::new(Duration::from_millis(20));
        let token = store.issue();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!store.check(&token));
        assert!(store.is_empty(), "check should evict expired entries");
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let store = CredentialStore::new(Duration::from_millis(30));
        store.issue();
        store.issue();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fresh = store.issue();

        assert_eq!(store.sweep(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.check(&fresh));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sweep_count_ignores_concurrent_issuance() {
        let store = Arc::new(CredentialStore::new(Duration::from_millis(200)));
        for _ in 0..500 {
            store.issue();
        }
        tokio::time::sleep(Duration::from_millis(250)).await;

        let issuer = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..2000 {
                    store.issue();
                }
            })
        };
        let evicted = store.sweep();
        issuer.await.unwrap();

        assert_eq!(evicted, 500);
        assert_eq!(store.len(), 2000);
    }

    #[tokio::test]
    async fn sweep_task_evicts_within_one_interval() {
        let store = Arc::new(CredentialStore::new(Duration::from_millis(20)));
        let handle = store.clone().start_sweep_task(Duration::from_millis(10));
        store.issue();
        store.issue();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.is_empty(), "sweeper should have dropped expired tokens");
        handle.abort();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_verify_has_single_winner() {
        let store = Arc::new(CredentialStore::new(Duration::from_secs(30)));
        let token = store.issue();
        let num_tasks = 32;

        let mut handles = Vec::with_capacity(num_tasks);
        for _ in 0..num_tasks {
            let store = store.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move { store.verify(&token) }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1, "exactly one verify should succeed");
    }
}
