use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::warn;

use crate::errors::Error;
use crate::request::{ApiRequest, ApiResponse};

pub(crate) type Reply = oneshot::Sender<Result<ApiResponse, Error>>;

/// A request that hit a 401 while a refresh was already in flight. Its reply is sent exactly once,
/// when that refresh settles.
pub(crate) struct PendingRequest {
    pub request: ApiRequest,
    pub reply: Reply,
}

#[derive(Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing { pending: VecDeque<PendingRequest> },
}

/// Refresh flag plus pending queue. The lock is never held across an await point, so the
/// check-and-set in [`RefreshCell::admit`] is atomic on any runtime.
#[derive(Default)]
pub(crate) struct RefreshCell {
    state: Mutex<RefreshState>,
}

pub(crate) enum Admission<'a> {
    /// The caller owns the refresh and must settle the ticket.
    Initiator {
        ticket: RefreshTicket<'a>,
        request: ApiRequest,
    },
    /// A refresh was already running; the request was queued at `position` (1-based).
    Queued {
        reply: oneshot::Receiver<Result<ApiResponse, Error>>,
        position: usize,
    },
}

impl RefreshCell {
    pub fn admit(&self, request: ApiRequest) -> Admission<'_> {
        let mut state = self.lock();
        if let RefreshState::Refreshing { pending } = &mut *state {
            let (tx, rx) = oneshot::channel();
            pending.push_back(PendingRequest { request, reply: tx });
            return Admission::Queued {
                reply: rx,
                position: pending.len(),
            };
        }
        *state = RefreshState::Refreshing {
            pending: VecDeque::new(),
        };
        Admission::Initiator {
            ticket: RefreshTicket {
                cell: self,
                settled: false,
            },
            request,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), RefreshState::Refreshing { .. })
    }

    pub fn pending_len(&self) -> usize {
        match &*self.lock() {
            RefreshState::Refreshing { pending } => pending.len(),
            RefreshState::Idle => 0,
        }
    }

    /// Back to `Idle`, handing over everything queued, oldest first.
    fn drain(&self) -> VecDeque<PendingRequest> {
        match std::mem::take(&mut *self.lock()) {
            RefreshState::Refreshing { pending } => pending,
            RefreshState::Idle => VecDeque::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Ownership of the in-flight refresh. Dropping it unsettled (the initiating task was cancelled)
/// returns the cell to `Idle` and rejects everything queued.
pub(crate) struct RefreshTicket<'a> {
    cell: &'a RefreshCell,
    settled: bool,
}

impl RefreshTicket<'_> {
    pub fn settle(mut self) -> VecDeque<PendingRequest> {
        self.settled = true;
        self.cell.drain()
    }
}

impl Drop for RefreshTicket<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let pending = self.cell.drain();
        warn!("refresh abandoned: rejecting {} queued request(s)", pending.len());
        for p in pending {
            let _ = p.reply.send(Err(Error::RefreshAbandoned));
        }
    }
}
