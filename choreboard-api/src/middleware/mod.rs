/// Middleware modules for the API server
///
/// - `security`: security response headers
/// - `session`: session cookie resolution and helpers

pub mod security;
pub mod session;
