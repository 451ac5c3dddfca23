//! Per-operation "already running" flags.

use std::sync::atomic::{AtomicBool, Ordering};

use super::Operation;

/// One flag per [`Operation`].
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    flags: [AtomicBool; Operation::ALL.len()],
}

impl InFlight {
    /// Mark `operation` as running, or return `None` if it already is.
    pub(crate) fn try_begin(&self, operation: Operation) -> Option<InFlightGuard<'_>> {
        let flag = self.flags.get(operation.index())?;
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag })
    }

    pub(crate) fn is_running(&self, operation: Operation) -> bool {
        self.flags
            .get(operation.index())
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }
}

/// Clears its flag when dropped, including when the future holding it is
/// cancelled.
#[derive(Debug)]
pub(crate) struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
