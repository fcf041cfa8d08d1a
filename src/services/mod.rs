pub mod error_classifier;
pub mod gateway_client;
pub mod generation_service;
pub mod model_config_service;
pub mod model_registry;
pub mod normalizer;
pub mod polling;
pub mod providers;

pub use gateway_client::*;
pub use generation_service::*;
pub use model_config_service::*;
pub use model_registry::*;
pub use polling::*;
