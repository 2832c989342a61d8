pub mod units;

pub use units::{gigabytes_to_bytes, megabytes_to_bytes, GIGABYTE, MEGABYTE};
