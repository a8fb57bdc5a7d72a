/// API server middleware
///
/// - `security`: Security-related response headers

pub mod security;
