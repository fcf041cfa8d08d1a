pub mod model_config;
pub mod requests;
pub mod responses;
pub mod task;

pub use model_config::*;
pub use requests::*;
pub use responses::*;
pub use task::*;
