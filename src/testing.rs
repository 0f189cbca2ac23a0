//! Testing infrastructure for flow_lib.
//!
//! Provides mock implementations of the toolkit traits so sessions can be
//! exercised without a host application or a production toolkit install:
//! - [`MockPlatform`]: toolkit entry points, with an optional host engine
//! - [`MockEngine`]: a running host application's session handles
//! - [`MockToolkit`] / [`MockTemplate`]: template registry and path store
//! - [`MockUser`] / [`MockConnection`]: identities and connections
//!
//! # Example
//!
//! ```ignore
//! use flow_lib::testing::{MockPlatform, MockTemplate};
//! use flow_lib::Flow;
//!
//! let platform = MockPlatform::new();
//! let template = MockTemplate::new("nuke_shot_work");
//! template.add_path("/proj/sh010/comp/sh010_comp_v001.nk", 1);
//! platform.mock_toolkit().add_template(std::sync::Arc::new(template));
//!
//! let flow = Flow::connect(&platform, None, true, None).unwrap();
//! // ... exercise the session
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::{AuthError, ToolkitError};
use crate::toolkit::{
    Authenticator, Engine, EngineInfo, Fields, Platform, SgConnection, SgUser, Template, Toolkit,
};
use crate::version::VERSION_FIELD;

type ActionLog = Arc<Mutex<Vec<MockAction>>>;

/// Action recorded by [`MockPlatform`] for test assertions.
///
/// Use [`MockPlatform::actions()`] to retrieve the list of actions performed
/// during a test, then assert on the expected sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAction {
    /// Interactive user login was requested.
    GetUser,
    /// Script-user creation was requested with these credentials.
    CreateScriptUser {
        api_script: String,
        api_key: Option<String>,
    },
    /// An identity was registered as the authenticated user.
    SetAuthenticatedUser { login: Option<String> },
    /// A toolkit instance was resolved from a project path.
    ToolkitFromPath { path: PathBuf },
}

/// Mock platform for exercising sessions without a toolkit install.
///
/// Comes wired with a [`MockAuthenticator`] (handing out a default
/// [`MockUser`]) and an empty default [`MockToolkit`]. Configure host state
/// with `set_*` methods, then retrieve recorded actions with
/// [`actions()`](Self::actions).
///
/// # Example
///
/// ```
/// use flow_lib::testing::MockPlatform;
/// use flow_lib::Flow;
///
/// let platform = MockPlatform::new();
/// let flow = Flow::connect(&platform, None, true, None).unwrap();
/// assert!(flow.is_connected());
/// ```
pub struct MockPlatform {
    engine: Mutex<Option<Arc<dyn Engine>>>,
    authenticator: Arc<MockAuthenticator>,
    toolkit: Arc<MockToolkit>,
    path_toolkits: Mutex<HashMap<PathBuf, Arc<dyn Toolkit>>>,
    actions: ActionLog,
}

impl MockPlatform {
    /// Creates a platform with no host engine and a default authenticator.
    pub fn new() -> Self {
        let actions = ActionLog::default();
        Self {
            engine: Mutex::new(None),
            authenticator: Arc::new(MockAuthenticator::with_log(actions.clone())),
            toolkit: Arc::new(MockToolkit::new()),
            path_toolkits: Mutex::new(HashMap::new()),
            actions,
        }
    }

    /// Installs a host engine; subsequent connects reuse its session.
    pub fn set_engine(&self, engine: Arc<MockEngine>) {
        *self.engine.lock().unwrap() = Some(engine);
    }

    /// Returns the authenticator for configuring identities or failures.
    pub fn mock_authenticator(&self) -> &MockAuthenticator {
        &self.authenticator
    }

    /// Returns the default toolkit for registering templates and paths.
    pub fn mock_toolkit(&self) -> &MockToolkit {
        &self.toolkit
    }

    /// Maps `path` to a dedicated toolkit instance for
    /// [`Platform::toolkit_from_path`].
    pub fn set_toolkit_for_path(&self, path: &Path, toolkit: Arc<MockToolkit>) {
        self.path_toolkits
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), toolkit);
    }

    /// Returns all recorded actions (for test assertions).
    pub fn actions(&self) -> Vec<MockAction> {
        self.actions.lock().unwrap().clone()
    }

    /// Clears recorded actions.
    pub fn clear_actions(&self) {
        self.actions.lock().unwrap().clear();
    }

    fn record_action(&self, action: MockAction) {
        self.actions.lock().unwrap().push(action);
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MockPlatform {
    fn current_engine(&self) -> Option<Arc<dyn Engine>> {
        self.engine.lock().unwrap().clone()
    }

    fn authenticator(&self) -> Arc<dyn Authenticator> {
        self.authenticator.clone()
    }

    fn set_authenticated_user(&self, user: &Arc<dyn SgUser>) {
        self.record_action(MockAction::SetAuthenticatedUser {
            login: user.login(),
        });
    }

    fn toolkit(&self) -> Arc<dyn Toolkit> {
        self.toolkit.clone()
    }

    fn toolkit_from_path(&self, path: &Path) -> Result<Arc<dyn Toolkit>, ToolkitError> {
        self.record_action(MockAction::ToolkitFromPath {
            path: path.to_path_buf(),
        });
        match self.path_toolkits.lock().unwrap().get(path).cloned() {
            Some(toolkit) => Ok(toolkit),
            None => Err(ToolkitError::new(
                format!("No toolkit configured for path '{}'", path.display()),
                None,
            )),
        }
    }
}

/// Mock authenticator handing out a configurable [`MockUser`].
///
/// The same identity is returned for user and script authentication; failures
/// are injected per method with the `fail_*` setters.
pub struct MockAuthenticator {
    user: Mutex<Arc<MockUser>>,
    get_user_error: Mutex<Option<String>>,
    script_user_error: Mutex<Option<String>>,
    actions: ActionLog,
}

impl MockAuthenticator {
    fn with_log(actions: ActionLog) -> Self {
        let connection = Arc::new(MockConnection::new("https://tracking.example.com"));
        Self {
            user: Mutex::new(Arc::new(MockUser::new(Some("mock-user"), connection))),
            get_user_error: Mutex::new(None),
            script_user_error: Mutex::new(None),
            actions,
        }
    }

    /// Sets the identity returned by both authentication methods.
    pub fn set_user(&self, user: Arc<MockUser>) {
        *self.user.lock().unwrap() = user;
    }

    /// Makes interactive login fail with `message`.
    pub fn fail_get_user(&self, message: &str) {
        *self.get_user_error.lock().unwrap() = Some(message.to_string());
    }

    /// Makes script-user creation fail with `message`.
    pub fn fail_create_script_user(&self, message: &str) {
        *self.script_user_error.lock().unwrap() = Some(message.to_string());
    }

    fn record_action(&self, action: MockAction) {
        self.actions.lock().unwrap().push(action);
    }
}

impl Authenticator for MockAuthenticator {
    fn get_user(&self) -> Result<Arc<dyn SgUser>, AuthError> {
        self.record_action(MockAction::GetUser);
        if let Some(message) = self.get_user_error.lock().unwrap().clone() {
            return Err(AuthError { message });
        }
        Ok(self.user.lock().unwrap().clone())
    }

    fn create_script_user(
        &self,
        api_script: &str,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn SgUser>, AuthError> {
        self.record_action(MockAction::CreateScriptUser {
            api_script: api_script.to_string(),
            api_key: api_key.map(String::from),
        });
        if let Some(message) = self.script_user_error.lock().unwrap().clone() {
            return Err(AuthError { message });
        }
        Ok(self.user.lock().unwrap().clone())
    }
}

/// Mock identity with a fixed login and connection.
pub struct MockUser {
    login: Option<String>,
    connection: Arc<MockConnection>,
    connect_error: Mutex<Option<String>>,
}

impl MockUser {
    /// Creates an identity opening `connection`.
    pub fn new(login: Option<&str>, connection: Arc<MockConnection>) -> Self {
        Self {
            login: login.map(String::from),
            connection,
            connect_error: Mutex::new(None),
        }
    }

    /// Makes [`SgUser::create_connection`] fail with `message`.
    pub fn fail_connection(&self, message: &str) {
        *self.connect_error.lock().unwrap() = Some(message.to_string());
    }
}

impl SgUser for MockUser {
    fn create_connection(&self) -> Result<Arc<dyn SgConnection>, AuthError> {
        if let Some(message) = self.connect_error.lock().unwrap().clone() {
            return Err(AuthError { message });
        }
        Ok(self.connection.clone())
    }

    fn login(&self) -> Option<String> {
        self.login.clone()
    }
}

/// Mock API connection identified by its base URL.
pub struct MockConnection {
    base_url: String,
}

impl MockConnection {
    /// Creates a connection reporting `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

impl SgConnection for MockConnection {
    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Mock host engine with fixed session handles.
pub struct MockEngine {
    connection: Arc<MockConnection>,
    toolkit: Arc<MockToolkit>,
    metrics: EngineInfo,
}

impl MockEngine {
    /// Creates an engine exposing `connection`, `toolkit` and `metrics`.
    pub fn new(
        connection: Arc<MockConnection>,
        toolkit: Arc<MockToolkit>,
        metrics: EngineInfo,
    ) -> Self {
        Self {
            connection,
            toolkit,
            metrics,
        }
    }
}

impl Engine for MockEngine {
    fn connection(&self) -> Arc<dyn SgConnection> {
        self.connection.clone()
    }

    fn toolkit(&self) -> Arc<dyn Toolkit> {
        self.toolkit.clone()
    }

    fn metrics_properties(&self) -> EngineInfo {
        self.metrics.clone()
    }
}

/// Arguments of a recorded [`Toolkit::paths_from_template`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationCall {
    pub template: String,
    pub skip_fields: Vec<String>,
    pub skip_missing_optional_keys: bool,
}

/// Mock toolkit holding a template registry.
///
/// Path enumeration returns every path registered on the template; the
/// arguments of each call are recorded and available through
/// [`enumerations()`](Self::enumerations).
#[derive(Default)]
pub struct MockToolkit {
    templates: Mutex<HashMap<String, Arc<MockTemplate>>>,
    enumerations: Mutex<Vec<EnumerationCall>>,
}

impl MockToolkit {
    /// Creates a toolkit with an empty template registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template under its own name.
    pub fn add_template(&self, template: Arc<MockTemplate>) {
        self.templates
            .lock()
            .unwrap()
            .insert(template.name.clone(), template);
    }

    /// Returns all recorded path enumeration calls (for test assertions).
    pub fn enumerations(&self) -> Vec<EnumerationCall> {
        self.enumerations.lock().unwrap().clone()
    }
}

impl Toolkit for MockToolkit {
    fn template(&self, name: &str) -> Result<Arc<dyn Template>, ToolkitError> {
        match self.templates.lock().unwrap().get(name).cloned() {
            Some(template) => Ok(template),
            None => Err(ToolkitError::new(
                format!("Template '{}' not found in registry", name),
                None,
            )),
        }
    }

    fn paths_from_template(
        &self,
        template: &dyn Template,
        _fields: &Fields,
        skip_fields: &[&str],
        skip_missing_optional_keys: bool,
    ) -> Result<Vec<PathBuf>, ToolkitError> {
        self.enumerations.lock().unwrap().push(EnumerationCall {
            template: template.name().to_string(),
            skip_fields: skip_fields.iter().map(|s| (*s).to_string()).collect(),
            skip_missing_optional_keys,
        });
        match self.templates.lock().unwrap().get(template.name()).cloned() {
            Some(registered) => Ok(registered.paths.lock().unwrap().clone()),
            None => Err(ToolkitError::new(
                format!("Template '{}' not found in registry", template.name()),
                None,
            )),
        }
    }
}

/// Mock template with registered paths and their extracted fields.
pub struct MockTemplate {
    name: String,
    paths: Mutex<Vec<PathBuf>>,
    fields_by_path: Mutex<HashMap<PathBuf, Fields>>,
}

impl MockTemplate {
    /// Creates an empty template named `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            paths: Mutex::new(Vec::new()),
            fields_by_path: Mutex::new(HashMap::new()),
        }
    }

    /// Registers an existing path carrying `version` in its fields.
    pub fn add_path(&self, path: &str, version: u64) {
        let mut fields = Fields::new();
        fields.insert(VERSION_FIELD.to_string(), Value::from(version));
        self.add_path_with_fields(path, fields);
    }

    /// Registers an existing path with explicit extracted fields.
    pub fn add_path_with_fields(&self, path: &str, fields: Fields) {
        let path = PathBuf::from(path);
        self.paths.lock().unwrap().push(path.clone());
        self.fields_by_path.lock().unwrap().insert(path, fields);
    }
}

impl Template for MockTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_fields(&self, path: &Path) -> Result<Fields, ToolkitError> {
        match self.fields_by_path.lock().unwrap().get(path).cloned() {
            Some(fields) => Ok(fields),
            None => Err(ToolkitError::new(
                format!("No fields recorded for '{}'", path.display()),
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_platform_defaults() {
        let platform = MockPlatform::new();
        assert!(platform.current_engine().is_none());

        let user = platform.authenticator().get_user().unwrap();
        assert_eq!(user.login().as_deref(), Some("mock-user"));
        assert_eq!(platform.actions(), vec![MockAction::GetUser]);
    }

    #[test]
    fn mock_authenticator_failure() {
        let platform = MockPlatform::new();
        platform.mock_authenticator().fail_get_user("no backend");

        let err = platform.authenticator().get_user().err().unwrap();
        assert_eq!(err.to_string(), "no backend");
    }

    #[test]
    fn mock_toolkit_template_lookup() {
        let toolkit = MockToolkit::new();
        let err = toolkit.template("missing").err().unwrap();
        assert!(err.to_string().contains("missing"));

        toolkit.add_template(Arc::new(MockTemplate::new("shot_work")));
        let template = toolkit.template("shot_work").unwrap();
        assert_eq!(template.name(), "shot_work");
    }

    #[test]
    fn mock_template_fields() {
        let template = MockTemplate::new("shot_work");
        template.add_path("/proj/sh010_v003.nk", 3);

        let fields = template.get_fields(Path::new("/proj/sh010_v003.nk")).unwrap();
        assert_eq!(fields.get(VERSION_FIELD), Some(&Value::from(3u64)));

        assert!(template.get_fields(Path::new("/proj/other.nk")).is_err());
    }

    #[test]
    fn mock_toolkit_records_enumerations() {
        let toolkit = MockToolkit::new();
        let template = MockTemplate::new("shot_work");
        template.add_path("/proj/sh010_v001.nk", 1);
        toolkit.add_template(Arc::new(template));

        let template = toolkit.template("shot_work").unwrap();
        let paths = toolkit
            .paths_from_template(template.as_ref(), &Fields::new(), &["version"], true)
            .unwrap();
        assert_eq!(paths, vec![PathBuf::from("/proj/sh010_v001.nk")]);

        let calls = toolkit.enumerations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].template, "shot_work");
        assert_eq!(calls[0].skip_fields, vec!["version".to_string()]);
        assert!(calls[0].skip_missing_optional_keys);
    }

    #[test]
    fn mock_platform_toolkit_from_path() {
        let platform = MockPlatform::new();
        assert!(platform.toolkit_from_path(Path::new("/nowhere")).is_err());

        platform.set_toolkit_for_path(Path::new("/proj"), Arc::new(MockToolkit::new()));
        assert!(platform.toolkit_from_path(Path::new("/proj")).is_ok());

        let actions = platform.actions();
        assert_eq!(
            actions,
            vec![
                MockAction::ToolkitFromPath {
                    path: PathBuf::from("/nowhere"),
                },
                MockAction::ToolkitFromPath {
                    path: PathBuf::from("/proj"),
                },
            ]
        );
    }
}
