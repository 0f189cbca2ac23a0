//! Session handling: host engine reuse or fresh authentication.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::credentials::script_key_from_env;
use crate::error::Error;
use crate::toolkit::{Engine, EngineInfo, Platform, SgConnection, SgUser, Toolkit};

/// How a [`Flow`] session obtained its connection.
///
/// Resolved once while connecting and never mutated afterwards.
pub enum SessionSource {
    /// Reusing the session of a running host-application engine.
    Host { engine: Arc<dyn Engine> },
    /// Fresh interactive user authentication.
    User { user: Arc<dyn SgUser> },
    /// Script authentication with a key read from the environment.
    Script {
        user: Arc<dyn SgUser>,
        /// Environment variable the key was read from.
        key_var: String,
    },
    /// No credentials were available; the session holds no API connection.
    Unauthenticated,
}

impl SessionSource {
    /// The tag of this source, without its handles.
    pub fn kind(&self) -> SessionKind {
        match self {
            SessionSource::Host { .. } => SessionKind::Host,
            SessionSource::User { .. } => SessionKind::User,
            SessionSource::Script { .. } => SessionKind::Script,
            SessionSource::Unauthenticated => SessionKind::Unauthenticated,
        }
    }
}

/// Tag form of [`SessionSource`] (for guards and diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Host,
    User,
    Script,
    Unauthenticated,
}

/// A connection to the production tracking platform.
///
/// Created with [`Flow::connect`], or [`Flow::from_engine`] when a host
/// engine handle is already at hand. Each `Flow` owns its handles; dropping
/// one releases nothing process-wide.
pub struct Flow {
    api: Option<Arc<dyn SgConnection>>,
    toolkit: Arc<dyn Toolkit>,
    engine_info: Option<EngineInfo>,
    source: SessionSource,
}

impl Flow {
    /// Connect to the platform, reusing the host engine's session when one
    /// is active (inside a DCC the engine already holds an authenticated
    /// connection; `script_key`, `as_user` and `path` are ignored there).
    ///
    /// Without a host engine, `as_user` selects interactive user login;
    /// otherwise `script_key` names the `SCRIPT_KEY_<NAME>` environment
    /// variable holding the script's API key. With neither, the session is
    /// left without an API connection ([`Flow::api`] returns `None`) and a
    /// warning is logged.
    pub fn connect(
        platform: &dyn Platform,
        script_key: Option<&str>,
        as_user: bool,
        path: Option<&Path>,
    ) -> Result<Flow, Error> {
        if let Some(engine) = platform.current_engine() {
            debug!("reusing host engine session");
            return Ok(Flow::from_engine(engine));
        }

        let identity = if as_user {
            debug!("authenticating as current user");
            let user = platform.authenticator().get_user()?;
            Some((user, None))
        } else if let Some(name) = script_key {
            let (key_var, api_key) = script_key_from_env(name);
            if api_key.is_none() {
                warn!(var = %key_var, "script key variable is not set");
            }
            debug!(script = %key_var, "authenticating as script user");
            let user = platform
                .authenticator()
                .create_script_user(&key_var, api_key.as_deref())?;
            Some((user, Some(key_var)))
        } else {
            warn!("no script key provided, session will have no API connection");
            None
        };

        let (api, source) = match identity {
            Some((user, key_var)) => {
                platform.set_authenticated_user(&user);
                let api = user.create_connection()?;
                debug!(
                    login = user.login().as_deref().unwrap_or("-"),
                    url = api.base_url(),
                    "connected"
                );
                let source = match key_var {
                    Some(key_var) => SessionSource::Script { user, key_var },
                    None => SessionSource::User { user },
                };
                (Some(api), source)
            }
            None => (None, SessionSource::Unauthenticated),
        };

        let toolkit = match path {
            Some(path) => platform.toolkit_from_path(path)?,
            None => platform.toolkit(),
        };

        Ok(Flow {
            api,
            toolkit,
            engine_info: None,
            source,
        })
    }

    /// Session backed by a running host engine. The engine's connection,
    /// toolkit and metrics properties are adopted as-is; no authentication
    /// happens.
    pub fn from_engine(engine: Arc<dyn Engine>) -> Flow {
        Flow {
            api: Some(engine.connection()),
            toolkit: engine.toolkit(),
            engine_info: Some(engine.metrics_properties()),
            source: SessionSource::Host { engine },
        }
    }

    /// The API connection, or `None` for an unauthenticated session.
    pub fn api(&self) -> Option<&Arc<dyn SgConnection>> {
        self.api.as_ref()
    }

    /// The toolkit instance this session operates through.
    pub fn toolkit(&self) -> &Arc<dyn Toolkit> {
        &self.toolkit
    }

    /// Host engine metrics properties. Present only for host sessions.
    pub fn engine_info(&self) -> Option<&EngineInfo> {
        self.engine_info.as_ref()
    }

    /// How this session obtained its connection.
    pub fn source(&self) -> &SessionSource {
        &self.source
    }

    /// Tag form of [`Flow::source`].
    pub fn kind(&self) -> SessionKind {
        self.source.kind()
    }

    /// The authenticated identity, when this session created one. Host
    /// sessions manage their own identity and report `None`.
    pub fn user(&self) -> Option<&Arc<dyn SgUser>> {
        match &self.source {
            SessionSource::User { user } | SessionSource::Script { user, .. } => Some(user),
            _ => None,
        }
    }

    /// Whether the session holds an API connection. Sessions connected
    /// without credentials do not.
    pub fn is_connected(&self) -> bool {
        self.api.is_some()
    }
}
