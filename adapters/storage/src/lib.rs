#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Key-value stores that hold persisted geocache sessions.

mod atomic_io;
mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
