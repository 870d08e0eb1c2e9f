//! Type system utilities and aliases.
//!
//! This module provides type aliases and utilities for the shared-state
//! patterns used across the workspace.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Rc<RefCell<T>>` and `Arc<Mutex<Option<T>>>`.

pub mod aliases;

pub use aliases::*;
