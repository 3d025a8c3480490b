//! Run-once guard
//!
//! Wraps an initializer so that however many times it is invoked, it runs
//! only the first time. Later calls return the first call's result.

use once_cell::sync::OnceCell;

/// Executes its initializer at most once
///
/// # Example
///
/// ```rust
/// use test_utils::RunOnce;
///
/// let guard: RunOnce = RunOnce::new();
/// let mut calls = 0;
/// guard.call(|| calls += 1);
/// guard.call(|| calls += 1);
/// assert_eq!(calls, 1);
/// ```
#[derive(Debug)]
pub struct RunOnce<T = ()> {
    cell: OnceCell<T>,
}

impl<T> RunOnce<T> {
    /// Creates a guard that has not run yet
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Runs `f` if this is the first call, otherwise does nothing
    ///
    /// Returns the value produced by the call that did run.
    pub fn call<F>(&self, f: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.cell.get_or_init(f)
    }

    /// Returns true once the initializer has completed
    pub fn has_run(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Value produced by the initializer, if it has run
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }
}

impl<T> Default for RunOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}
