//! Next-available-version lookup over templated file paths.

use serde_json::Value;
use tracing::debug;

use crate::connector::Flow;
use crate::error::Error;
use crate::toolkit::Fields;

/// Template field holding the version number.
pub const VERSION_FIELD: &str = "version";

const DEFAULT_SKIP_FIELDS: &[&str] = &[VERSION_FIELD];

impl Flow {
    /// Next available version number for a templated file path.
    ///
    /// Enumerates existing paths matching `template_name` with `fields`
    /// applied, wildcarding `skip_fields` (default `["version"]`, so files
    /// of every version match), reads each path's version field back, and
    /// returns one greater than the highest found. `1` when nothing matches
    /// yet.
    ///
    /// The answer reflects the files present at call time; two concurrent
    /// callers can be handed the same number.
    pub fn get_next_version_number(
        &self,
        template_name: &str,
        fields: &Fields,
        skip_fields: Option<&[&str]>,
    ) -> Result<u64, Error> {
        let template = self.toolkit().template(template_name)?;
        let skip_fields = skip_fields.unwrap_or(DEFAULT_SKIP_FIELDS);
        let paths = self
            .toolkit()
            .paths_from_template(template.as_ref(), fields, skip_fields, true)?;

        let mut versions = Vec::with_capacity(paths.len());
        for path in &paths {
            let path_fields = template.get_fields(path)?;
            let version = path_fields
                .get(VERSION_FIELD)
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    Error::Other(format!(
                        "Template '{}' matched {} without a numeric '{}' field",
                        template_name,
                        path.display(),
                        VERSION_FIELD
                    ))
                })?;
            versions.push(version);
        }
        debug!(
            template = template_name,
            existing = versions.len(),
            "scanned template versions"
        );

        Ok(next_version(&versions))
    }
}

/// One greater than the highest existing version; `1` when none exist.
/// Saturates at `u64::MAX`.
fn next_version(versions: &[u64]) -> u64 {
    versions.iter().max().map_or(1, |max| max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPlatform, MockTemplate};
    use serde_json::json;
    use std::sync::Arc;

    fn shot_fields(shot: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("shot".to_string(), json!(shot));
        f
    }

    fn connected(platform: &MockPlatform) -> Flow {
        Flow::connect(platform, None, true, None).unwrap()
    }

    #[test]
    fn test_first_version_is_one() {
        let platform = MockPlatform::new();
        platform
            .mock_toolkit()
            .add_template(Arc::new(MockTemplate::new("nuke_shot_work")));

        let flow = connected(&platform);
        let next = flow
            .get_next_version_number("nuke_shot_work", &shot_fields("sh010"), None)
            .unwrap();
        assert_eq!(next, 1);
    }

    #[test]
    fn test_next_version_is_max_plus_one() {
        let platform = MockPlatform::new();
        let template = MockTemplate::new("nuke_shot_work");
        template.add_path("/proj/sh010/comp/sh010_comp_v001.nk", 1);
        template.add_path("/proj/sh010/comp/sh010_comp_v004.nk", 4);
        template.add_path("/proj/sh010/comp/sh010_comp_v002.nk", 2);
        platform.mock_toolkit().add_template(Arc::new(template));

        let flow = connected(&platform);
        let next = flow
            .get_next_version_number("nuke_shot_work", &shot_fields("sh010"), None)
            .unwrap();
        assert_eq!(next, 5);
    }

    #[test]
    fn test_unknown_template_propagates_lookup_error() {
        let platform = MockPlatform::new();
        let flow = connected(&platform);

        let err = flow
            .get_next_version_number("does_not_exist", &shot_fields("sh010"), None)
            .unwrap_err();
        assert!(matches!(err, Error::Toolkit(_)));
        assert!(err.to_string().contains("does_not_exist"));
    }

    #[test]
    fn test_default_skip_fields_wildcard_version() {
        let platform = MockPlatform::new();
        platform
            .mock_toolkit()
            .add_template(Arc::new(MockTemplate::new("maya_asset_work")));

        let flow = connected(&platform);
        flow.get_next_version_number("maya_asset_work", &shot_fields("sh020"), None)
            .unwrap();

        let calls = platform.mock_toolkit().enumerations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].skip_fields, vec!["version".to_string()]);
        assert!(calls[0].skip_missing_optional_keys);
    }

    #[test]
    fn test_custom_skip_fields_forwarded() {
        let platform = MockPlatform::new();
        platform
            .mock_toolkit()
            .add_template(Arc::new(MockTemplate::new("maya_asset_work")));

        let flow = connected(&platform);
        flow.get_next_version_number(
            "maya_asset_work",
            &shot_fields("sh020"),
            Some(&["version", "name"]),
        )
        .unwrap();

        let calls = platform.mock_toolkit().enumerations();
        assert_eq!(
            calls[0].skip_fields,
            vec!["version".to_string(), "name".to_string()]
        );
    }

    #[test]
    fn test_path_without_version_field_errors() {
        let platform = MockPlatform::new();
        let template = MockTemplate::new("nuke_shot_work");
        let mut no_version = Fields::new();
        no_version.insert("shot".to_string(), json!("sh010"));
        template.add_path_with_fields("/proj/sh010/comp/sh010_comp.nk", no_version);
        platform.mock_toolkit().add_template(Arc::new(template));

        let flow = connected(&platform);
        let err = flow
            .get_next_version_number("nuke_shot_work", &shot_fields("sh010"), None)
            .unwrap_err();
        assert!(matches!(err, Error::Other(_)));
        assert!(err.to_string().contains("sh010_comp.nk"));
    }

    #[test]
    fn test_version_number_saturates_at_max() {
        let platform = MockPlatform::new();
        let template = MockTemplate::new("nuke_shot_work");
        template.add_path("/proj/sh010/comp/sh010_comp_vmax.nk", u64::MAX);
        platform.mock_toolkit().add_template(Arc::new(template));

        let flow = connected(&platform);
        let next = flow
            .get_next_version_number("nuke_shot_work", &shot_fields("sh010"), None)
            .unwrap();
        assert_eq!(next, u64::MAX);
    }

    #[test]
    fn test_next_version_empty_and_zero() {
        assert_eq!(next_version(&[]), 1);
        assert_eq!(next_version(&[0]), 1);
        assert_eq!(next_version(&[3, 9, 4]), 10);
    }
}
