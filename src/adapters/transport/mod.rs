//! Transmission providers
//!
//! One provider per wire protocol behind the [`TransmissionProvider`] trait,
//! selected at runtime through [`TransmissionProviderFactory`].

pub mod factory;
pub mod file;
pub mod http;
pub mod mllp;
pub mod traits;

pub use factory::{create_transmission_provider, TransmissionProviderFactory};
pub use file::FileProvider;
pub use http::HttpProvider;
pub use mllp::{MllpCodec, MllpProvider};
pub use traits::{measure, DeliveryFailure, SharedProvider, TransmissionProvider};
