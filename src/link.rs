//! Per-connection state shared by a connection, its prepared statements and
//! its result streams.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bindings::ConnectionId;
use crate::error::{Error, Result};

pub(crate) struct Link {
    id: ConnectionId,
    active: AtomicBool,
    closed: AtomicBool,
    broken: AtomicBool,
}

impl Link {
    pub(crate) fn new(id: ConnectionId) -> Arc<Self> {
        Arc::new(Self {
            id,
            active: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            broken: AtomicBool::new(false),
        })
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }

    /// Mark the link closed. Returns false if it was already closed.
    pub(crate) fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }

    /// Claim the link for one query. Fails while another query or result
    /// stream on the same connection is unfinished.
    pub(crate) fn begin(self: &Arc<Self>) -> Result<ActiveQuery> {
        self.ensure_open()?;
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::InvalidUsage(format!(
                "{} already has an unfinished query; drain or drop its result stream first",
                self.id
            )));
        }
        Ok(ActiveQuery {
            link: Some(Arc::clone(self)),
        })
    }

    /// Normalize an error coming back from the bindings and remember
    /// whether it broke the link.
    pub(crate) fn check<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| self.fail(e))
    }

    /// Same as [`check`](Self::check) for an error raised by the client itself.
    pub(crate) fn fail(&self, err: Error) -> Error {
        let err = err.normalize();
        if err.is_link_lost() {
            tracing::warn!(conn = %self.id, error = %err, "link lost");
            self.broken.store(true, Ordering::Release);
        }
        err
    }
}

/// Exclusive claim on a link, released on drop.
pub(crate) struct ActiveQuery {
    link: Option<Arc<Link>>,
}

impl ActiveQuery {
    pub(crate) fn release(&mut self) {
        if let Some(link) = self.link.take() {
            link.active.store(false, Ordering::Release);
        }
    }
}

impl Drop for ActiveQuery {
    fn drop(&mut self) {
        self.release();
    }
}
