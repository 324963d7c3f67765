//! Copy-on-write publication of shared state.
//!
//! Readers `load` an immutable snapshot without locking. Writers clone the current
//! snapshot, modify the copy and publish it with compare-and-swap, retrying when another
//! writer won the race. A reader therefore never observes a half-updated structure.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Publish a new snapshot derived from the current one.
///
/// `update` receives the current snapshot and returns the replacement, or `None` if no
/// change is needed. It may run several times under contention and must be free of side
/// effects.
///
/// Returns the snapshot that is current after the call: the published replacement, or
/// the unchanged snapshot when `update` declined.
pub(crate) fn publish<T, F>(slot: &ArcSwap<T>, mut update: F) -> Arc<T>
where
    F: FnMut(&T) -> Option<T>,
{
    loop {
        let old = slot.load_full();
        let Some(new) = update(old.as_ref()) else {
            return old;
        };

        let new = Arc::new(new);
        let prev = slot.compare_and_swap(&old, Arc::clone(&new));
        if Arc::ptr_eq(&prev, &old) {
            return new;
        }
    }
}
