pub mod credentials;
pub mod errors;

pub use credentials::BasicCredentials;
pub use errors::BasicAuthError;
