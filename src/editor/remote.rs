//! Remote items view for dynamic blocks
//!
//! A dynamic block (Section Process with `dataSource = "posts"`) shows a list
//! fetched from the post store. Fetches are asynchronous; while one is in
//! flight the view is `Loading`. Every fetch gets a ticket carrying a
//! generation number, and only the completion of the latest ticket is
//! applied: a superseded fetch is discarded when it arrives
//! (last-request-wins).
//!
//! Every non-idle state remembers the query it belongs to, so a renderer can
//! tell whether the records answer the query of the block it is rendering.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::core::posts::{PostQuery, PostRecord, PostStore};

/// State of a remote items view
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    /// No fetch started yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading(PostQuery),
    /// The latest fetch returned these records (possibly none)
    Loaded {
        query: PostQuery,
        records: Vec<PostRecord>,
    },
    /// The latest fetch failed
    Failed { query: PostQuery, error: String },
}

impl FetchState {
    /// Whether records are not yet available
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchState::Idle | FetchState::Loading(_))
    }

    /// Query the state belongs to; `None` while idle
    pub fn query(&self) -> Option<&PostQuery> {
        match self {
            FetchState::Idle => None,
            FetchState::Loading(query)
            | FetchState::Loaded { query, .. }
            | FetchState::Failed { query, .. } => Some(query),
        }
    }
}

/// Handle identifying one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    query: PostQuery,
}

impl FetchTicket {
    /// Generation number; later fetches have larger numbers
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Query this fetch was started for
    pub fn query(&self) -> &PostQuery {
        &self.query
    }
}

#[derive(Debug, Default)]
struct Inner {
    generation: u64,
    state: FetchState,
    discarded: u64,
}

/// Cached remote items, shared between the editor and fetch tasks
#[derive(Debug, Clone, Default)]
pub struct RemoteItems {
    inner: Arc<Mutex<Inner>>,
}

impl RemoteItems {
    /// Create an idle view
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> FetchState {
        self.inner.lock().state.clone()
    }

    /// Number of completions dropped because a newer fetch superseded them
    pub fn discarded(&self) -> u64 {
        self.inner.lock().discarded
    }

    /// Start a fetch; any fetch still in flight is superseded
    pub fn begin(&self, query: PostQuery) -> FetchTicket {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = FetchState::Loading(query.clone());
        FetchTicket {
            generation: inner.generation,
            query,
        }
    }

    /// Apply a fetch result; returns `false` if the ticket was superseded
    pub fn complete<E: std::fmt::Display>(
        &self,
        ticket: &FetchTicket,
        result: Result<Vec<PostRecord>, E>,
    ) -> bool {
        let mut inner = self.inner.lock();
        if ticket.generation != inner.generation {
            inner.discarded += 1;
            tracing::debug!(
                ticket = ticket.generation,
                latest = inner.generation,
                "Discarding superseded fetch result"
            );
            return false;
        }
        let query = ticket.query.clone();
        inner.state = match result {
            Ok(records) => FetchState::Loaded { query, records },
            Err(e) => {
                tracing::warn!(error = %e, "Remote items fetch failed");
                FetchState::Failed {
                    query,
                    error: e.to_string(),
                }
            }
        };
        true
    }

    /// Fetch `query` from `store` and apply the result if still current
    pub async fn refresh(&self, store: &dyn PostStore, query: PostQuery) -> bool {
        let ticket = self.begin(query);
        let result = store.query(ticket.query()).await;
        self.complete(&ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::posts::StoreError;

    #[test]
    fn test_latest_ticket_wins() {
        let remote = RemoteItems::new();
        assert_eq!(remote.state(), FetchState::Idle);

        let first = remote.begin(PostQuery::process_steps(4));
        let second = remote.begin(PostQuery::process_steps(8));
        assert_eq!(remote.state(), FetchState::Loading(PostQuery::process_steps(8)));

        assert!(remote.complete::<StoreError>(&second, Ok(vec![])));
        assert!(!remote.complete::<StoreError>(&first, Err(StoreError::Unavailable("late".into()))));

        assert_eq!(
            remote.state(),
            FetchState::Loaded {
                query: PostQuery::process_steps(8),
                records: vec![],
            }
        );
        assert_eq!(remote.state().query().map(|q| q.per_page), Some(8));
        assert_eq!(remote.discarded(), 1);
    }

    #[test]
    fn test_failure_is_distinct_from_empty() {
        let remote = RemoteItems::new();
        let ticket = remote.begin(PostQuery::process_steps(4));
        remote.complete(&ticket, Err(StoreError::Unavailable("down".into())));
        assert!(matches!(remote.state(), FetchState::Failed { .. }));
        assert!(!remote.state().is_pending());
    }
}
