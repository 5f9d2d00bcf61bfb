//! Identity core: the active-user session registry, the request-admission
//! gate, credential issuance and the login/password flows built on them.
//! Keep the public surface thin and split implementation across sub-modules.

mod gate;
mod issuer;
mod provider;
mod registry;

pub use gate::{AuthenticationGate, RequestDescriptor, Whitelist, DEFAULT_WHITELIST};
pub use issuer::{generate_password, generate_username};
pub use provider::{AuthProvider, LocalAuthProvider, LoginRequest};
pub use registry::SessionRegistry;
