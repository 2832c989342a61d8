pub mod handlers;
pub mod metrics;
pub mod server;

pub use server::{init_tracing, run_once_mode, run_serve_mode};
