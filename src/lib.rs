//! Flow connection library.
//!
//! A thin layer over a ShotGrid-style production tracking toolkit: reuse a
//! running host engine's session, or authenticate as a user or a script
//! (API key from `SCRIPT_KEY_<NAME>`), then find the next available version
//! number for templated file paths.
//!
//! The toolkit itself stays behind the traits in [`toolkit`]; [`testing`]
//! provides mock implementations of the whole surface.

pub mod connector;
pub mod credentials;
pub mod error;
pub mod testing;
pub mod toolkit;
pub mod version;

pub use connector::{Flow, SessionKind, SessionSource};
pub use credentials::{script_key_from_env, script_key_var, SCRIPT_KEY_PREFIX};
pub use error::{AuthError, Error, ToolkitError};
pub use toolkit::{
    Authenticator, Engine, EngineInfo, Fields, Platform, SgConnection, SgUser, Template, Toolkit,
};
pub use version::VERSION_FIELD;

/// Library version for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
