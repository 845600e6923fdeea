//! External system integrations.
//!
//! - [`transport`] - Transmission providers (HTTP, HTTPS, MLLP, file drop)
//!   and the protocol registry
//! - [`audit`] - Audit log repositories (in-memory, JSON lines)

pub mod audit;
pub mod transport;
