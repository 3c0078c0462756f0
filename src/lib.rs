pub mod digest;
mod emoji;
pub mod error;
pub mod interpolate;
pub mod request;

pub use error::{OutnameError, Result};
pub use digest::{content_hash, hash_digest};
pub use interpolate::{DEFAULT_PATTERN, InterpolateOptions, Resource, TokenOverride, interpolate_name};
pub use request::stringify_request;

/// Compute an md5 hash of the input rendered as lowercase hex, truncated to `length` characters.
pub fn hash(input: impl AsRef<[u8]>, length: usize) -> String {
    digest::content_hash(input, length)
}
