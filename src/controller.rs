//! Search form state machine.
//!
//! [`SearchController`] owns the query text and the [`SearchState`] for the
//! lifetime of a page view. It never touches the network itself: `submit`
//! hands out a [`Ticket`] describing the request to make, and whoever runs
//! the request reports back through `resolve`. That split keeps every state
//! transition synchronous and directly testable.
//!
//! # States
//!
//! ```text
//! Idle ──submit(empty)──────▶ Failed
//! Idle ──submit(non-empty)──▶ Loading ──ok──▶ Success
//!                                 └────err──▶ Failed
//! Success / Failed ──submit──▶ Loading
//! ```
//!
//! # Sequencing
//!
//! Every submission attempt, valid or not, takes the next sequence number.
//! Under [`OverlapPolicy::LatestWins`] and [`OverlapPolicy::Queue`] a
//! resolution is applied only if its ticket carries the newest number, so a
//! slow response for an old query can never overwrite a newer result.
//! [`OverlapPolicy::Unordered`] applies every resolution as it arrives.

use crate::config::OverlapPolicy;
use crate::error::{FetchError, ValidationError};
use crate::models::DisplayItem;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// The current search lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    #[default]
    Idle,
    Loading,
    Success(Vec<DisplayItem>),
    Failed(String),
}

/// A request the controller wants made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub query: String,
}

/// Owner of the query text and search state.
#[derive(Debug)]
pub struct SearchController {
    query: String,
    state: SearchState,
    policy: OverlapPolicy,
    /// Sequence number of the most recent submission attempt.
    current: u64,
    /// Tickets handed out and not yet resolved or discarded.
    outstanding: BTreeSet<u64>,
}

impl SearchController {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            query: String::new(),
            state: SearchState::Idle,
            policy,
            current: 0,
            outstanding: BTreeSet::new(),
        }
    }

    /// Replace the query text. No validation happens here.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SearchState::Loading)
    }

    /// Sequence numbers of tickets still awaiting resolution, oldest first.
    #[cfg(test)]
    pub fn outstanding(&self) -> impl Iterator<Item = u64> + '_ {
        self.outstanding.iter().copied()
    }

    /// Submit the current query.
    ///
    /// A blank query moves straight to `Failed` and returns the validation
    /// error; no ticket is issued. Otherwise the state becomes `Loading`, any
    /// previous results or error are cleared, and the returned ticket
    /// carries the query exactly as typed.
    pub fn submit(&mut self) -> Result<Ticket, ValidationError> {
        self.current += 1;

        if self.query.trim().is_empty() {
            let err = ValidationError::EmptyQuery;
            info!(seq = self.current, "Rejected empty query");
            self.state = SearchState::Failed(err.to_string());
            return Err(err);
        }

        let ticket = Ticket {
            seq: self.current,
            query: self.query.clone(),
        };
        self.outstanding.insert(ticket.seq);
        self.state = SearchState::Loading;
        info!(seq = ticket.seq, query = %ticket.query, "Search submitted");
        Ok(ticket)
    }

    /// Report the outcome of a ticket.
    ///
    /// # Returns
    ///
    /// `true` if the outcome changed the state, `false` if it was stale (a
    /// newer submission exists and the policy sequences responses) or the
    /// ticket was unknown or already settled.
    pub fn resolve(
        &mut self,
        ticket: &Ticket,
        outcome: Result<Vec<DisplayItem>, FetchError>,
    ) -> bool {
        if !self.outstanding.remove(&ticket.seq) {
            debug!(seq = ticket.seq, "Ignoring resolution for unknown ticket");
            return false;
        }

        let sequenced = !matches!(self.policy, OverlapPolicy::Unordered);
        if sequenced && ticket.seq != self.current {
            debug!(
                seq = ticket.seq,
                current = self.current,
                ok = outcome.is_ok(),
                "Discarding superseded response"
            );
            return false;
        }

        self.state = match outcome {
            Ok(items) => {
                info!(seq = ticket.seq, count = items.len(), "Search succeeded");
                SearchState::Success(items)
            }
            Err(e) => {
                warn!(seq = ticket.seq, error = %e, "Search failed");
                SearchState::Failed(e.to_string())
            }
        };
        true
    }

    /// Forget a ticket whose request was abandoned.
    ///
    /// The state is left alone; a newer submission owns it.
    pub fn discard(&mut self, seq: u64) {
        if self.outstanding.remove(&seq) {
            debug!(seq, "Discarded ticket");
        }
    }
}
