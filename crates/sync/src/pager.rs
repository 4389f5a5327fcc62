// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Backward history paging.
//!
//! The offset of the next page is the number of confirmed messages already
//! loaded, so messages pushed in the meantime shift it naturally. At most one
//! page request per conversation is in flight. Every request carries the
//! generation it was issued under; a selection change or a refresh starts a
//! new one, and an answer from an older generation is dropped without
//! touching the store.

use std::collections::HashMap;

use commz_core::{ConversationStore, Merge, Message};
use tracing::debug;

use crate::pull::{PullError, PullResult};

/// Messages per page when not configured.
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// A history request as issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub chat_id: String,
    pub offset: usize,
    pub limit: usize,
    /// Generation the request belongs to.
    pub generation: u64,
}

/// What an answered page did.
#[derive(Debug, PartialEq)]
pub enum PageOutcome {
    Loaded {
        inserted: usize,
        exhausted: bool,
    },
    /// The answer belongs to an earlier generation and was dropped.
    Stale,
    Failed(PullError),
}

#[derive(Debug, Default, Clone, Copy)]
struct PageState {
    busy: bool,
    exhausted: bool,
}

/// Per-conversation paging state.
#[derive(Debug)]
pub struct HistoryPager {
    page_size: usize,
    generation: u64,
    states: HashMap<String, PageState>,
}

impl Default for HistoryPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl HistoryPager {
    pub fn new(page_size: usize) -> Self {
        HistoryPager {
            page_size: page_size.max(1),
            generation: 0,
            states: HashMap::new(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new generation and forgets all paging state.
    ///
    /// Requests still in flight become stale. Called on a selection change
    /// and whenever a refresh replaces the stored conversations, which then
    /// hold only their newest messages again.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.states.clear();
    }

    /// Returns true while a page for `chat_id` is in flight.
    pub fn is_busy(&self, chat_id: &str) -> bool {
        self.states.get(chat_id).is_some_and(|s| s.busy)
    }

    /// Returns true once the server has no older messages for `chat_id`.
    pub fn is_exhausted(&self, chat_id: &str) -> bool {
        self.states.get(chat_id).is_some_and(|s| s.exhausted)
    }

    /// Builds the request for the next older page of `chat_id`.
    ///
    /// Returns `None` if a page is already in flight, history is exhausted or
    /// the conversation is unknown.
    pub fn load_older(&mut self, store: &ConversationStore, chat_id: &str) -> Option<PageRequest> {
        let conv = store.get(chat_id)?;
        let state = self.states.entry(chat_id.to_string()).or_default();
        if state.busy || state.exhausted {
            return None;
        }
        state.busy = true;
        Some(PageRequest {
            chat_id: chat_id.to_string(),
            offset: conv.confirmed_count(),
            limit: self.page_size,
            generation: self.generation,
        })
    }

    /// Applies the answer to `request`.
    pub fn on_page(
        &mut self,
        store: &mut ConversationStore,
        request: &PageRequest,
        result: PullResult<Vec<Message>>,
    ) -> PageOutcome {
        if request.generation != self.generation {
            debug!(chat_id = %request.chat_id, "dropping stale history page");
            return PageOutcome::Stale;
        }
        let state = self.states.entry(request.chat_id.clone()).or_default();
        state.busy = false;

        match result {
            Ok(page) => {
                let exhausted = page.len() < request.limit;
                state.exhausted = exhausted;
                let inserted = store.merge_page(&request.chat_id, page).unwrap_or(0);
                PageOutcome::Loaded {
                    inserted,
                    exhausted,
                }
            }
            Err(e) => PageOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
#[path = "pager_tests.rs"]
mod tests;
