pub mod bootstrap;
pub mod credentials;
mod error;
pub mod jwt;
pub mod password;
mod types;

pub use credentials::{CredentialStore, LocalCredentialStore, NewUserProfile};
pub use error::AuthError;
pub use jwt::{AccessToken, TokenIssuer};
pub use types::{ANONYMOUS, AdminRole, Claims, RequiredRole, Role};
