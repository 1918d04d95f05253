//! Pooled, size-bounded message lists for tickrep.
//!
//! Every message that crosses the wire flows through one of two containers:
//! a [`PackedSender`] on the way out and a [`PackedReceiver`] on the way in.
//! Both recycle message buffers through a [`Pool`] so steady-state operation
//! allocates nothing.
//!
//! The sender tracks its last batch as indices into the pending list, which
//! makes double-free structurally impossible: a message is owned by exactly
//! one place at all times.

mod list;
mod pool;

pub use list::{EncodeOutcome, PackedReceiver, PackedSender};
pub use pool::{Pool, Poolable};
