//! Structured two-task concurrency.

use crate::error::{HarnessError, Result};
use std::thread;

/// Both results of a [`join2`] call. Only exists once both tasks finished.
#[derive(Debug)]
pub struct Joined<L, R> {
    pub left: L,
    pub right: R,
}

/// Runs two named tasks on scoped threads and waits for both.
///
/// Neither task outlives the call, so both may borrow from the caller. A
/// panic in either task is reported as `TaskPanicked` with its name, after
/// the other task has also been joined.
pub fn join2<L, R, FL, FR>(left: (&'static str, FL), right: (&'static str, FR)) -> Result<Joined<L, R>>
where
    FL: FnOnce() -> L + Send,
    FR: FnOnce() -> R + Send,
    L: Send,
    R: Send,
{
    let (left_name, left_task) = left;
    let (right_name, right_task) = right;

    thread::scope(|scope| {
        let left_handle = thread::Builder::new()
            .name(left_name.to_string())
            .spawn_scoped(scope, left_task)?;
        let right_handle = thread::Builder::new()
            .name(right_name.to_string())
            .spawn_scoped(scope, right_task)?;

        let left = left_handle.join();
        let right = right_handle.join();
        Ok(Joined {
            left: left.map_err(|_| HarnessError::TaskPanicked(left_name))?,
            right: right.map_err(|_| HarnessError::TaskPanicked(right_name))?,
        })
    })
}
