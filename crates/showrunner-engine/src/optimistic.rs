//! Optimistic local updates with revert-on-failure.
//!
//! The controller applies local state changes (progress cursor, mirrored
//! counters) before the matching remote call returns, for immediate
//! feedback. Each change carries an undo closure; if the remote call fails
//! the change is reverted, and an update dropped without `commit` reverts
//! itself.

/// A locally-applied state change that can still be undone.
#[must_use = "commit or revert the update; dropping it reverts"]
pub struct OptimisticUpdate<U: FnOnce()> {
    undo: Option<U>,
}

impl<U: FnOnce()> OptimisticUpdate<U> {
    /// Applies a change now. `apply` performs the change and returns the
    /// closure that undoes it.
    pub fn apply<A: FnOnce() -> U>(apply: A) -> Self {
        Self { undo: Some(apply()) }
    }

    /// Keeps the change: the remote side confirmed it.
    pub fn commit(mut self) {
        self.undo = None;
    }

    /// Undoes the change now.
    pub fn revert(mut self) {
        if let Some(undo) = self.undo.take() {
            undo();
        }
    }
}

impl<U: FnOnce()> Drop for OptimisticUpdate<U> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            undo();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_commit_keeps_the_change() {
        let cell = Cell::new(1);
        let value = &cell;

        let update = OptimisticUpdate::apply(|| {
            let previous = value.replace(2);
            move || value.set(previous)
        });
        update.commit();

        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn test_revert_restores_the_previous_value() {
        let cell = Cell::new(1);
        let value = &cell;

        let update = OptimisticUpdate::apply(|| {
            let previous = value.replace(2);
            move || value.set(previous)
        });
        update.revert();

        assert_eq!(cell.get(), 1);
    }

    #[test]
    fn test_drop_without_commit_reverts() {
        let cell = Cell::new(1);
        let value = &cell;

        {
            let _update = OptimisticUpdate::apply(|| {
                let previous = value.replace(2);
                move || value.set(previous)
            });
        }

        assert_eq!(cell.get(), 1);
    }
}
