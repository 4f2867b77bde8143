//! Incremental card materialization
//!
//! The scheduler walks a [`CatalogView`] in batches. Its [`RenderWindow`] is a
//! prefix cursor: everything before it has a materialized card, nothing after
//! it does. The cursor only moves forward until the next [`reset`].
//!
//! `advance` is not re-entrant. A trigger that arrives while a batch is being
//! materialized is dropped, not queued; the next scroll or query event will
//! trigger again.
//!
//! [`reset`]: RenderScheduler::reset

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use shapehub_domain::ShapeRecord;

use crate::query::CatalogView;

/// Prefix cursor into the current view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderWindow {
    cursor: usize,
}

impl RenderWindow {
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

/// Scroll position of the rendered list, in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    pub fn distance_to_bottom(&self) -> f64 {
        (self.scroll_height - (self.scroll_top + self.client_height)).max(0.0)
    }

    /// Whether the viewport is within `threshold` of the end of the list
    pub fn near_bottom(&self, threshold: f64) -> bool {
        self.distance_to_bottom() <= threshold
    }
}

struct SchedulerState<T> {
    view: CatalogView,
    window: RenderWindow,
    cards: Vec<T>,
    /// Bumped by every reset so a batch started before it is dropped
    epoch: u64,
}

pub struct RenderScheduler<T> {
    state: Mutex<SchedulerState<T>>,
    advancing: AtomicBool,
}

/// Clears the in-progress flag even if materialization panics
struct AdvanceGuard<'a>(&'a AtomicBool);

impl Drop for AdvanceGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Clone> RenderScheduler<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                view: CatalogView::default(),
                window: RenderWindow::default(),
                cards: Vec::new(),
                epoch: 0,
            }),
            advancing: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adopt a new view: window back to zero, materialized cards dropped
    pub fn reset(&self, view: CatalogView) {
        let mut state = self.lock();
        state.view = view;
        state.window = RenderWindow::default();
        state.cards.clear();
        state.epoch += 1;
        tracing::debug!(view_len = state.view.len(), "Render window reset");
    }

    /// Materialize the next `min(batch, remaining)` entries.
    ///
    /// Returns the newly materialized cards. Returns nothing when the window
    /// already covers the view, when `batch` is zero, or when another advance
    /// is in progress.
    pub fn advance<F>(&self, batch: usize, mut materialize: F) -> Vec<T>
    where
        F: FnMut(&Arc<ShapeRecord>) -> T,
    {
        if self
            .advancing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            tracing::debug!("Advance already in progress; trigger dropped");
            return Vec::new();
        }
        let _guard = AdvanceGuard(&self.advancing);

        let (records, start, epoch) = {
            let state = self.lock();
            let start = state.window.cursor;
            let records = state.view.slice(start..start.saturating_add(batch)).to_vec();
            (records, start, state.epoch)
        };
        if records.is_empty() {
            return Vec::new();
        }

        // Materialize without holding the lock; the callback may call back in.
        let fresh: Vec<T> = records.iter().map(&mut materialize).collect();

        let mut state = self.lock();
        if state.epoch != epoch || state.window.cursor != start {
            tracing::debug!("View changed during advance; batch dropped");
            return Vec::new();
        }
        state.window.cursor += fresh.len();
        state.cards.extend(fresh.iter().cloned());
        tracing::debug!(
            added = fresh.len(),
            cursor = state.window.cursor,
            view_len = state.view.len(),
            "Render window advanced"
        );
        fresh
    }

    pub fn window(&self) -> RenderWindow {
        self.lock().window
    }

    /// Entries of the view not yet materialized
    pub fn remaining(&self) -> usize {
        let state = self.lock();
        state.view.len() - state.window.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn is_advancing(&self) -> bool {
        self.advancing.load(Ordering::Acquire)
    }

    /// Materialized cards in view order
    pub fn cards(&self) -> Vec<T> {
        self.lock().cards.clone()
    }

    pub fn card_count(&self) -> usize {
        self.lock().cards.len()
    }

    pub fn view(&self) -> CatalogView {
        self.lock().view.clone()
    }
}

impl<T: Clone> Default for RenderScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
