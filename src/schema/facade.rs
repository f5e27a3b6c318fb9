//! The public schema facade.
//!
//! A [`Schema`] owns a fetcher and a parser and resolves the metadata of one
//! service at most once per successful attempt:
//!
//! ```text
//!                 resolve()
//!   Unresolved ───────────────► Resolving ──── Ok ────► Resolved
//!       ▲                        │   ▲  │
//!       └──── cancelled ─────────┘   │  └─ Err ──► Failed
//!                                    │                │
//!                                    └── retriable ───┘
//! ```
//!
//! Concurrent callers of [`Schema::resolve`] share one in-flight attempt.
//! Structural failures (duplicate names, cycles, dangling references) are
//! permanent; fetch and parse failures are retried by the next `resolve`.
//!
//! Cancellation: the token passed by the caller that *starts* an attempt is
//! bound to that attempt. Firing it cancels the attempt for every waiter and
//! returns the schema to `Unresolved`. A token passed by a caller that joins
//! an attempt already in flight only abandons that caller's wait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use once_cell::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{OptionalLookup, SchemaError, SchemaResult};
use super::model::{Association, Column, EdmComplexType, EdmEntityType, Function, Table};
use super::resolved::ResolvedSchema;
use crate::metadata::{MetadataFetcher, MetadataParser};

/// Observable lifecycle of a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    Unresolved,
    Resolving,
    Resolved,
    Failed,
}

type ResolveFuture = Shared<BoxFuture<'static, SchemaResult<Arc<ResolvedSchema>>>>;

enum Lifecycle {
    Unresolved,
    Resolving { attempt: u64, future: ResolveFuture },
    Resolved(Arc<ResolvedSchema>),
    Failed(SchemaError),
}

impl Lifecycle {
    fn state(&self) -> SchemaState {
        match self {
            Lifecycle::Unresolved => SchemaState::Unresolved,
            Lifecycle::Resolving { .. } => SchemaState::Resolving,
            Lifecycle::Resolved(_) => SchemaState::Resolved,
            Lifecycle::Failed(_) => SchemaState::Failed,
        }
    }
}

/// Lazily resolved, read-only view of a service's schema.
pub struct Schema<F, P> {
    fetcher: Arc<F>,
    parser: Arc<P>,
    lifecycle: Mutex<Lifecycle>,
    /// Set exactly once, on the first successful attempt.
    resolved: OnceCell<Arc<ResolvedSchema>>,
    attempts: AtomicU64,
}

impl<F, P> Schema<F, P>
where
    F: MetadataFetcher + 'static,
    P: MetadataParser + 'static,
{
    pub fn new(fetcher: F, parser: P) -> Self {
        Self::with_shared(Arc::new(fetcher), Arc::new(parser))
    }

    /// Build a schema over collaborators shared with other owners.
    pub fn with_shared(fetcher: Arc<F>, parser: Arc<P>) -> Self {
        Self {
            fetcher,
            parser,
            lifecycle: Mutex::new(Lifecycle::Unresolved),
            resolved: OnceCell::new(),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Resolve the schema, or wait for the resolution already in flight.
    ///
    /// Returns immediately once resolved, and with the stored error once a
    /// structural failure has been recorded.
    #[instrument(level = "debug", skip_all, fields(source = %self.fetcher.source_id()))]
    pub async fn resolve(&self, cancel: &CancellationToken) -> SchemaResult<Arc<ResolvedSchema>> {
        let (attempt, future, initiator) = {
            let mut lifecycle = self.lock();
            match &*lifecycle {
                Lifecycle::Resolved(schema) => return Ok(Arc::clone(schema)),
                Lifecycle::Failed(err) if err.is_structural() => return Err(err.clone()),
                Lifecycle::Resolving { attempt, future } => {
                    debug!(attempt, "joining resolution in flight");
                    (*attempt, future.clone(), false)
                }
                Lifecycle::Unresolved | Lifecycle::Failed(_) => {
                    let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(attempt, "starting resolution");
                    let future = self.start_attempt(cancel.clone());
                    *lifecycle = Lifecycle::Resolving {
                        attempt,
                        future: future.clone(),
                    };
                    (attempt, future, true)
                }
            }
        };

        let result = if initiator {
            future.await
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempt, "caller stopped waiting");
                    return Err(SchemaError::Cancelled);
                }
                result = future => result,
            }
        };

        self.settle(attempt, &result);
        result
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchemaState {
        self.lock().state()
    }

    /// The error of the most recent failed attempt, while in `Failed`.
    pub fn last_error(&self) -> Option<SchemaError> {
        match &*self.lock() {
            Lifecycle::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// The resolved schema graph. Fails with `NotResolved` before resolution.
    pub fn resolved(&self) -> SchemaResult<&ResolvedSchema> {
        self.resolved
            .get()
            .map(|schema| schema.as_ref())
            .ok_or(SchemaError::NotResolved)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// The raw metadata payload the schema was built from.
    pub fn metadata_as_string(&self) -> SchemaResult<&str> {
        Ok(self.resolved()?.metadata_as_string())
    }

    pub fn tables(&self) -> SchemaResult<impl Iterator<Item = &Table> + '_> {
        Ok(self.resolved()?.tables())
    }

    pub fn has_table(&self, name: &str) -> SchemaResult<bool> {
        Ok(self.resolved()?.has_table(name))
    }

    pub fn find_table(&self, name: &str) -> SchemaResult<Option<&Table>> {
        Ok(self.resolved()?.find_table(name))
    }

    /// Resolve `path` and climb to the root of its table's inheritance chain.
    pub fn find_base_table(&self, path: &str) -> SchemaResult<Option<&Table>> {
        self.resolved()?.find_base_table(path).optional()
    }

    /// Resolve `path` to the most specific table it names.
    pub fn find_concrete_table(&self, path: &str) -> SchemaResult<Option<&Table>> {
        self.resolved()?.find_concrete_table(path).optional()
    }

    /// Column `name` on the table `path` resolves to, inherited columns
    /// included.
    pub fn find_column(&self, path: &str, name: &str) -> SchemaResult<Option<&Column>> {
        self.resolved()?.find_column(path, name).optional()
    }

    pub fn has_column(&self, path: &str, name: &str) -> SchemaResult<bool> {
        Ok(self.find_column(path, name)?.is_some())
    }

    pub fn find_association(&self, path: &str, name: &str) -> SchemaResult<Option<&Association>> {
        self.resolved()?.find_association(path, name).optional()
    }

    pub fn has_association(&self, path: &str, name: &str) -> SchemaResult<bool> {
        Ok(self.find_association(path, name)?.is_some())
    }

    pub fn functions(&self) -> SchemaResult<impl Iterator<Item = &Function> + '_> {
        Ok(self.resolved()?.functions())
    }

    pub fn has_function(&self, name: &str) -> SchemaResult<bool> {
        Ok(self.resolved()?.has_function(name))
    }

    pub fn find_function(&self, name: &str) -> SchemaResult<Option<&Function>> {
        Ok(self.resolved()?.find_function(name))
    }

    pub fn entity_types(&self) -> SchemaResult<impl Iterator<Item = &EdmEntityType> + '_> {
        Ok(self.resolved()?.entity_types())
    }

    pub fn find_entity_type(&self, name: &str) -> SchemaResult<Option<&EdmEntityType>> {
        Ok(self.resolved()?.find_entity_type(name))
    }

    pub fn complex_types(&self) -> SchemaResult<impl Iterator<Item = &EdmComplexType> + '_> {
        Ok(self.resolved()?.complex_types())
    }

    pub fn find_complex_type(&self, name: &str) -> SchemaResult<Option<&EdmComplexType>> {
        Ok(self.resolved()?.find_complex_type(name))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_attempt(&self, cancel: CancellationToken) -> ResolveFuture {
        let fetcher = Arc::clone(&self.fetcher);
        let parser = Arc::clone(&self.parser);

        async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(SchemaError::Cancelled),
                result = load(fetcher, parser, cancel.clone()) => result,
            }
        }
        .boxed()
        .shared()
    }

    /// Record the outcome of `attempt`, unless a later attempt superseded it.
    fn settle(&self, attempt: u64, result: &SchemaResult<Arc<ResolvedSchema>>) {
        let mut lifecycle = self.lock();
        match &*lifecycle {
            Lifecycle::Resolving { attempt: current, .. } if *current == attempt => {}
            _ => return,
        }

        *lifecycle = match result {
            Ok(schema) => {
                info!(attempt, tables = schema.table_index().len(), "schema resolved");
                let _ = self.resolved.set(Arc::clone(schema));
                Lifecycle::Resolved(Arc::clone(schema))
            }
            Err(SchemaError::Cancelled) => {
                info!(attempt, "schema resolution cancelled");
                Lifecycle::Unresolved
            }
            Err(err) => {
                warn!(attempt, error = %err, structural = err.is_structural(), "schema resolution failed");
                Lifecycle::Failed(err.clone())
            }
        };
    }
}

impl<F, P> std::fmt::Debug for Schema<F, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self
            .lifecycle
            .lock()
            .map(|l| l.state())
            .unwrap_or_else(|poisoned| poisoned.into_inner().state());
        f.debug_struct("Schema")
            .field("state", &state)
            .field("attempts", &self.attempts.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

async fn load<F, P>(
    fetcher: Arc<F>,
    parser: Arc<P>,
    cancel: CancellationToken,
) -> SchemaResult<Arc<ResolvedSchema>>
where
    F: MetadataFetcher + ?Sized,
    P: MetadataParser + ?Sized,
{
    let payload = fetcher
        .fetch_metadata(&cancel)
        .await
        .map_err(SchemaError::fetch)?;
    debug!(bytes = payload.len(), "metadata fetched");

    let records = parser.parse_metadata(&payload).map_err(SchemaError::parse)?;
    debug!(records = records.len(), "metadata parsed");

    let schema = ResolvedSchema::build(payload, records)?;
    Ok(Arc::new(schema))
}
