//! Device registry with staged bring-up and exact reverse-order rollback
//!
//! Bring-up walks [`Stage::ALL`] in order:
//!
//! ```text
//! Table -> Buffers[0..n] -> Identities -> Class, Publication[0..n] -> Route[0..n]
//! ```
//!
//! Each acquire that succeeds pushes its [`Release`] onto a [`RollbackStack`].
//! A failure part-way through unwinds the stack; teardown of a live registry
//! unwinds the same stack, so both paths release in the same order.

pub mod config;
pub mod manager;
pub mod rollback;
pub mod stage;


pub use config::RegistryConfig;
pub use manager::DeviceRegistry;
pub use rollback::{Release, RollbackStack};
pub use stage::{RegistryState, Stage};
