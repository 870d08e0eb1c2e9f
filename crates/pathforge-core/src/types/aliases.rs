//! Type aliases for commonly used shared-state types.
//!
//! PathForge has two execution domains: the single mutation thread that
//! drives ticks, and the worker threads that compute extrusions. The
//! aliases below name the wrapper used in each domain so the split stays
//! visible in signatures.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pathforge_core::types::*;
//!
//! // Mutation-thread state: Rc<RefCell<HistoryStore>>
//! let history: Shared<HistoryStore> = shared(HistoryStore::new());
//!
//! // Hand-off slot written by a worker, read by a tick task
//! let slot: ThreadSafeOption<Vec<u32>> = thread_safe_none();
//! ```

use parking_lot::Mutex;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

// =============================================================================
// MUTATION-THREAD SHARED TYPES (Rc<RefCell<T>>)
// =============================================================================

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
///
/// Used for state that must only ever be touched from the tick thread
/// (placement queue, history). `Rc` is `!Send`, so the compiler keeps it
/// there.
pub type Shared<T> = Rc<RefCell<T>>;

// =============================================================================
// THREAD-SAFE SHARED TYPES (Arc<Mutex<Option<T>>>)
// =============================================================================

/// A thread-safe optional wrapper, used as a one-shot result slot between
/// a background computation and the tick thread.
///
/// Uses `parking_lot::Mutex` for better performance than `std::sync::Mutex`.
pub type ThreadSafeOption<T> = Arc<Mutex<Option<T>>>;

// =============================================================================
// CONSTRUCTOR HELPERS
// =============================================================================

/// Create a new `Shared<T>` from a value.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Create a new `ThreadSafeOption<T>` initialized to `None`.
pub fn thread_safe_none<T>() -> ThreadSafeOption<T> {
    Arc::new(Mutex::new(None))
}
