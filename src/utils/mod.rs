pub mod hashing;
pub mod json;
pub mod url;

pub use hashing::*;
pub use json::*;
pub use url::*;
