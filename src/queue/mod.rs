//! Work queues used by the fine-grained pools.

pub mod mpsc;

pub use mpsc::MpscQueue;
