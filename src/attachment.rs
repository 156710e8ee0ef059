//! Single-slot holder for the latest compression of a form field.
//!
//! A new selection does not cancel a compression already in flight. Each
//! call to [`AttachmentSlot::begin`] hands out a [`Ticket`]; only the newest
//! ticket may store its report, so a slow earlier run that finishes late is
//! discarded instead of overwriting the newer selection.

use crate::compress::CompressionReport;
use std::sync::{Mutex, PoisonError};

/// Tag for one compression invocation against a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct SlotState {
    newest: u64,
    report: Option<CompressionReport>,
}

#[derive(Debug, Default)]
pub struct AttachmentSlot {
    state: Mutex<SlotState>,
}

impl AttachmentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new invocation. Outstanding tickets become stale.
    pub fn begin(&self) -> Ticket {
        let mut state = self.lock();
        state.newest += 1;
        Ticket(state.newest)
    }

    /// Store `report` if `ticket` is still the newest. Returns whether it was kept.
    pub fn complete(&self, ticket: Ticket, report: CompressionReport) -> bool {
        let mut state = self.lock();
        if ticket.0 != state.newest {
            log::debug!("discarding stale result for ticket {}", ticket.0);
            return false;
        }
        state.report = Some(report);
        true
    }

    pub fn current(&self) -> Option<CompressionReport> {
        self.lock().report.clone()
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.lock().newest == ticket.0
    }

    /// Remove the attachment and invalidate every outstanding ticket.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.newest += 1;
        state.report = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
