//! The consumed surface of the platform toolkit.
//!
//! Flow does not implement authentication protocols, path templating, or
//! file discovery itself. Host integrations supply those by implementing
//! the traits below; [`crate::testing`] ships configurable mock
//! implementations of the whole surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AuthError, ToolkitError};

/// Field values applied to a template, keyed by field name.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Metrics properties of a host engine (application name, version, ...).
pub type EngineInfo = serde_json::Map<String, serde_json::Value>;

/// Entry points of the platform toolkit.
///
/// Passed explicitly to [`crate::Flow::connect`]; the library never reaches
/// for ambient module state.
pub trait Platform: Send + Sync {
    /// The engine of the host application this process runs inside, if any.
    fn current_engine(&self) -> Option<Arc<dyn Engine>>;

    /// Authenticator used when no host engine provides a session.
    fn authenticator(&self) -> Arc<dyn Authenticator>;

    /// Register `user` as the authenticated identity for subsequent toolkit
    /// calls. Called at most once per connect, and never when a host engine
    /// session is reused.
    fn set_authenticated_user(&self, user: &Arc<dyn SgUser>);

    /// The default toolkit instance.
    fn toolkit(&self) -> Arc<dyn Toolkit>;

    /// Resolve a toolkit instance from a path inside a project.
    fn toolkit_from_path(&self, path: &Path) -> Result<Arc<dyn Toolkit>, ToolkitError>;
}

/// A running host-application engine with an embedded, authenticated session.
pub trait Engine: Send + Sync {
    /// The engine's live API connection.
    fn connection(&self) -> Arc<dyn SgConnection>;

    /// The engine's toolkit instance.
    fn toolkit(&self) -> Arc<dyn Toolkit>;

    /// Metrics properties describing the host application.
    fn metrics_properties(&self) -> EngineInfo;
}

/// Creates user identities from credentials.
pub trait Authenticator: Send + Sync {
    /// Resolve the current human user, interactively if necessary.
    fn get_user(&self) -> Result<Arc<dyn SgUser>, AuthError>;

    /// Create a script identity. `api_key` is handed through even when the
    /// environment held no value; the toolkit decides how an undefined key
    /// fails.
    fn create_script_user(
        &self,
        api_script: &str,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn SgUser>, AuthError>;
}

/// An authenticated identity (human or script) able to open connections.
pub trait SgUser: Send + Sync {
    /// Open an API connection as this identity.
    fn create_connection(&self) -> Result<Arc<dyn SgConnection>, AuthError>;

    /// Login name, when the identity has one. Script users may not.
    fn login(&self) -> Option<String>;
}

/// Handle to an open API connection.
pub trait SgConnection: Send + Sync {
    /// Base URL of the tracking site this connection talks to.
    fn base_url(&self) -> &str;
}

/// A toolkit instance: template registry and path enumeration.
pub trait Toolkit: Send + Sync {
    /// Look up a template by name. Unknown names yield the toolkit's own
    /// lookup error.
    fn template(&self, name: &str) -> Result<Arc<dyn Template>, ToolkitError>;

    /// Existing file paths matching `template` with `fields` applied.
    /// Fields named in `skip_fields` match any value.
    fn paths_from_template(
        &self,
        template: &dyn Template,
        fields: &Fields,
        skip_fields: &[&str],
        skip_missing_optional_keys: bool,
    ) -> Result<Vec<PathBuf>, ToolkitError>;
}

/// A named file-path pattern with typed fields.
pub trait Template: Send + Sync {
    /// Template name as registered with the toolkit.
    fn name(&self) -> &str;

    /// Extract field values from an existing path.
    fn get_fields(&self, path: &Path) -> Result<Fields, ToolkitError>;
}
