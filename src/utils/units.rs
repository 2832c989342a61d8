//! Unit conversion utilities

/// Bytes in one mebibyte. Nova reports hypervisor memory in MB of this size.
pub const MEGABYTE: i64 = 1024 * 1024;

/// Bytes in one gibibyte. Nova reports local storage in GB of this size.
pub const GIGABYTE: i64 = 1024 * 1024 * 1024;

/// Convert megabytes to bytes
#[inline]
pub fn megabytes_to_bytes(mb: i64) -> i64 {
    mb.saturating_mul(MEGABYTE)
}

/// Convert gigabytes to bytes
#[inline]
pub fn gigabytes_to_bytes(gb: i64) -> i64 {
    gb.saturating_mul(GIGABYTE)
}
