//! Liveness tokens for in-flight calls
//!
//! A UI consumer that starts a page load or a transition owns a
//! [`Liveness`]. Each in-flight call carries a [`LivenessToken`] and checks
//! it once the transport settles: if the owner was cancelled or dropped in
//! the meantime, the result is discarded instead of committed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owner side of a liveness flag
///
/// Dropping the owner cancels every token handed out.
#[derive(Debug)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    /// Create a live owner
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Hand out a token tied to this owner
    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            alive: Some(Arc::clone(&self.alive)),
        }
    }

    /// Mark every token dead
    pub fn cancel(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Check if the owner is still live
    pub fn is_live(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Liveness {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Shared view of a liveness flag
#[derive(Debug, Clone, Default)]
pub struct LivenessToken {
    alive: Option<Arc<AtomicBool>>,
}

impl LivenessToken {
    /// A token with no owner; always live
    pub fn detached() -> Self {
        Self { alive: None }
    }

    /// Check if the owner is still live
    pub fn is_live(&self) -> bool {
        self.alive
            .as_ref()
            .map_or(true, |alive| alive.load(Ordering::Acquire))
    }
}
