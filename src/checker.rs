//! Batch entry point: fetch, reconcile, discard stale batches

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::normalize::{ManifestPackages, normalize_identifiers, parse_manifest};
use crate::pacer::RequestPacer;
use crate::reconcile::Reconciler;
use crate::retry::fetch_with_retry;
use crate::sources::{
    ARCHITECTURE_CHECK, ArchitectureReport, DIRECTORY_SNAPSHOT, HttpPackageSource, PackageSource,
    RELEASE_LIST,
};
use crate::types::{BatchId, CheckReport};

/// Session used by [`PackageChecker::check_packages`]
pub const DEFAULT_SESSION: &str = "default";

/// Scope within which a newer batch supersedes an older one
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum SessionKey {
    Named(String),
    /// Batch started without a session; nothing else can supersede it
    Isolated(BatchId),
}

/// Latest batch of one session and its cancellation handle
struct InFlight {
    batch: BatchId,
    token: CancellationToken,
}

/// Checks package lists against the remote sources
///
/// Cloning is cheap and clones share batch tracking. Supersession is scoped
/// to a session: a new batch cancels only the batch in flight for the same
/// session, so independent callers never cancel each other.
#[derive(Clone)]
pub struct PackageChecker {
    config: Arc<Config>,
    source: Arc<dyn PackageSource>,
    reconciler: Reconciler,
    /// Last batch id handed out, across all sessions
    generation: Arc<AtomicU64>,
    in_flight: Arc<Mutex<HashMap<SessionKey, InFlight>>>,
}

impl PackageChecker {
    /// Create a checker that talks to the configured HTTP endpoints
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be created
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let source = Arc::new(HttpPackageSource::new(&config)?);
        Self::with_source(config, source)
    }

    /// Create a checker over any [`PackageSource`]
    pub fn with_source(config: Config, source: Arc<dyn PackageSource>) -> Result<Self> {
        config.validate()?;
        let reconciler = Reconciler::new(
            source.clone(),
            config.sources.clone(),
            RequestPacer::from_config(&config.search),
        );

        Ok(Self {
            config: Arc::new(config),
            source,
            reconciler,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Id of the batch in flight for the default session, if any
    pub fn current_batch(&self) -> Option<BatchId> {
        self.current_batch_for(DEFAULT_SESSION)
    }

    /// Id of the batch in flight for `session`, if any
    pub fn current_batch_for(&self, session: &str) -> Option<BatchId> {
        self.sessions()
            .get(&SessionKey::Named(session.to_string()))
            .map(|slot| slot.batch)
    }

    /// Cancel the default session's batch; it resolves to [`Error::Superseded`]
    pub fn cancel(&self) {
        self.cancel_session(DEFAULT_SESSION);
    }

    /// Cancel the batch in flight for `session`
    ///
    /// Returns whether a batch was cancelled.
    pub fn cancel_session(&self, session: &str) -> bool {
        let removed = self
            .sessions()
            .remove(&SessionKey::Named(session.to_string()));
        match removed {
            Some(slot) => {
                tracing::info!(batch = slot.batch.get(), session, "batch cancelled");
                slot.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel a batch by id, whichever session started it
    ///
    /// Returns whether the batch was still in flight.
    pub fn cancel_batch(&self, batch: BatchId) -> bool {
        let mut sessions = self.sessions();
        let key = sessions
            .iter()
            .find(|(_, slot)| slot.batch == batch)
            .map(|(key, _)| key.clone());
        match key.and_then(|key| sessions.remove(&key)) {
            Some(slot) => {
                tracing::info!(batch = batch.get(), "batch cancelled");
                slot.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Extract checkable identifiers from a package manifest
    ///
    /// Uses the configured ignore list. The content is not retained.
    pub fn parse_manifest(&self, content: &str) -> Result<ManifestPackages> {
        parse_manifest(content, &self.config.ignored_packages)
    }

    /// Check a list of raw identifiers (`name` or `name@version`)
    ///
    /// The report holds exactly one record per distinct bare name. Only a
    /// failure of the directory snapshot or the release list fails the batch;
    /// per-package problems are reported in the records. Runs in the default
    /// session: starting another default-session batch before this one
    /// finishes makes this one return [`Error::Superseded`].
    pub async fn check_packages<S: AsRef<str> + Sync>(
        &self,
        identifiers: &[S],
    ) -> Result<CheckReport> {
        self.check_packages_in(Some(DEFAULT_SESSION), identifiers)
            .await
    }

    /// Check a list of raw identifiers within `session`
    ///
    /// A batch supersedes only the in-flight batch of the same session.
    /// With `None` the batch is isolated and ends early only through
    /// [`cancel_batch`](Self::cancel_batch).
    pub async fn check_packages_in<S: AsRef<str> + Sync>(
        &self,
        session: Option<&str>,
        identifiers: &[S],
    ) -> Result<CheckReport> {
        let identifiers = normalize_identifiers(identifiers);
        let (batch, key, token) = self.begin_batch(session);
        let started = Instant::now();

        tracing::info!(batch = batch.get(), count = identifiers.len(), "checking packages");

        let work = async {
            let retry = &self.config.retry;
            let (snapshot, releases, architecture) = tokio::join!(
                fetch_with_retry(retry, DIRECTORY_SNAPSHOT, || self
                    .source
                    .directory_snapshot()),
                fetch_with_retry(retry, RELEASE_LIST, || self.source.release_versions()),
                fetch_with_retry(retry, ARCHITECTURE_CHECK, || self
                    .source
                    .architecture_check(&identifiers.names)),
            );

            let snapshot = snapshot.inspect_err(|e| {
                tracing::error!(batch = batch.get(), source = DIRECTORY_SNAPSHOT, error = %e, "batch failed");
            })?;
            let releases = releases.inspect_err(|e| {
                tracing::error!(batch = batch.get(), source = RELEASE_LIST, error = %e, "batch failed");
            })?;
            let architecture = architecture.unwrap_or_else(|e| {
                tracing::warn!(
                    batch = batch.get(),
                    source = ARCHITECTURE_CHECK,
                    error = %e,
                    "architecture check unavailable, statuses default to untested"
                );
                ArchitectureReport::default()
            });

            tracing::debug!(
                batch = batch.get(),
                listed = snapshot.len(),
                checked = architecture.len(),
                "sources settled"
            );

            let results = self
                .reconciler
                .reconcile(&identifiers, &snapshot, &architecture)
                .await;
            Ok::<_, Error>((results, releases.into_versions()))
        };

        let outcome = tokio::select! {
            _ = token.cancelled() => Err(Error::Superseded { batch }),
            outcome = work => outcome,
        };

        // a newer batch of the same session may have started while this one
        // was finishing
        if !self.finish_batch(&key, batch) {
            tracing::warn!(batch = batch.get(), "discarding superseded batch");
            return Err(Error::Superseded { batch });
        }

        let (results, release_versions) = outcome.inspect_err(|e| {
            if matches!(e, Error::Superseded { .. }) {
                tracing::warn!(batch = batch.get(), "batch cancelled before completion");
            }
        })?;

        tracing::info!(
            batch = batch.get(),
            count = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "check complete"
        );

        Ok(CheckReport {
            batch_id: batch,
            results,
            release_versions,
        })
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionKey, InFlight>> {
        match self.in_flight.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Allocate the next batch id and cancel the session's batch in flight
    fn begin_batch(&self, session: Option<&str>) -> (BatchId, SessionKey, CancellationToken) {
        let batch = BatchId(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        let key = match session {
            Some(name) => SessionKey::Named(name.to_string()),
            None => SessionKey::Isolated(batch),
        };
        let token = CancellationToken::new();

        let previous = self.sessions().insert(
            key.clone(),
            InFlight {
                batch,
                token: token.clone(),
            },
        );
        if let Some(stale) = previous {
            tracing::info!(
                batch = batch.get(),
                superseded = stale.batch.get(),
                "new batch supersedes the one in flight"
            );
            stale.token.cancel();
        }

        (batch, key, token)
    }

    /// Release the session slot; false when the batch is no longer current
    fn finish_batch(&self, key: &SessionKey, batch: BatchId) -> bool {
        let mut sessions = self.sessions();
        if sessions.get(key).is_some_and(|slot| slot.batch == batch) {
            sessions.remove(key);
            true
        } else {
            false
        }
    }
}
