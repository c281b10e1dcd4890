//! sng-runtime: the order-preserving worker pool that fans search
//! problems across OS threads.

pub mod thread_pool;

pub use thread_pool::ThreadPool;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
