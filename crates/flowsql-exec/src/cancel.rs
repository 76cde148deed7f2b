//! Cooperative cancellation with linked child tokens.
//!
//! A query obtains one root token; stages that need their own scope (such as a
//! distributed write) derive a child with `child_token`. Cancelling a token
//! cancels every token derived from it, never its parent. Workers poll
//! `is_cancelled` between rows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Node {
    flag: AtomicBool,
    parent: Option<Arc<Node>>,
}

impl Node {
    fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Acquire) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.is_cancelled(),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    node: Arc<Node>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token cancelled when either it or `self` (or any ancestor) is cancelled.
    pub fn child_token(&self) -> Self {
        Self {
            node: Arc::new(Node {
                flag: AtomicBool::new(false),
                parent: Some(Arc::clone(&self.node)),
            }),
        }
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.node.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.node.is_cancelled()
    }
}
