//! Script credential lookup from the environment.
//!
//! Script identities authenticate with an API key stored in an environment
//! variable named `SCRIPT_KEY_<NAME>`, where `<NAME>` is the uppercased
//! script identifier (`nuke` reads `SCRIPT_KEY_NUKE`). Keys never appear in
//! code or config files; render farms and CI set them per host.

use std::env;

/// Prefix of script key environment variables.
pub const SCRIPT_KEY_PREFIX: &str = "SCRIPT_KEY_";

/// Environment variable name for a script identifier.
pub fn script_key_var(script: &str) -> String {
    format!("{}{}", SCRIPT_KEY_PREFIX, script.to_uppercase())
}

/// Resolve a script identifier to `(variable name, value)`.
///
/// The value is `None` when the variable is unset. That is not an error at
/// this layer: the undefined key is still handed to the authenticator, which
/// decides how bad credentials fail.
pub fn script_key_from_env(script: &str) -> (String, Option<String>) {
    let var = script_key_var(script);
    let value = env::var(&var).ok();
    (var, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_key_var_uppercases() {
        assert_eq!(script_key_var("nuke"), "SCRIPT_KEY_NUKE");
        assert_eq!(script_key_var("Maya"), "SCRIPT_KEY_MAYA");
        assert_eq!(script_key_var("houdini_render"), "SCRIPT_KEY_HOUDINI_RENDER");
    }

    #[test]
    fn unset_variable_resolves_to_none() {
        let (var, value) = script_key_from_env("flow_test_never_set");
        assert_eq!(var, "SCRIPT_KEY_FLOW_TEST_NEVER_SET");
        assert_eq!(value, None);
    }

    #[test]
    fn set_variable_resolves_to_value() {
        env::set_var("SCRIPT_KEY_FLOW_TEST_SET", "abc123");
        let (_, value) = script_key_from_env("flow_test_set");
        assert_eq!(value.as_deref(), Some("abc123"));
        env::remove_var("SCRIPT_KEY_FLOW_TEST_SET");
    }

    #[test]
    fn empty_value_passes_through() {
        env::set_var("SCRIPT_KEY_FLOW_TEST_EMPTY", "");
        let (_, value) = script_key_from_env("flow_test_empty");
        assert_eq!(value.as_deref(), Some(""));
        env::remove_var("SCRIPT_KEY_FLOW_TEST_EMPTY");
    }
}
