//! Construction of the Jumpstarter custom resource.

use serde_json::{json, Value};

use crate::yaml;

/// API group/version of the Jumpstarter CR.
pub const API_VERSION: &str = "jumpstarter.dev/v1alpha1";

/// Kind of the Jumpstarter CR.
pub const KIND: &str = "Jumpstarter";

/// Name of the singleton CR instance.
pub const NAME: &str = "jumpstarter";

/// Namespace the CR is applied into.
pub const NAMESPACE: &str = "default";

/// Deployment parameters submitted by the operator.
///
/// Built fresh per request and discarded after serialization.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JumpstarterSpec {
    /// The base domain the deployment serves under.
    pub base_domain: String,

    /// Full image reference override. Takes precedence over `image_version`.
    pub image: Option<String>,

    /// Image version tag override.
    pub image_version: Option<String>,
}

impl JumpstarterSpec {
    /// Renders the complete CR document as YAML, ready for `kubectl apply`.
    pub fn to_yaml(&self) -> String {
        let mut spec = serde_json::Map::new();
        spec.insert(
            "baseDomain".to_string(),
            Value::String(self.base_domain.clone()),
        );
        if let Some(image) = &self.image {
            spec.insert("image".to_string(), Value::String(image.clone()));
        } else if let Some(version) = &self.image_version {
            spec.insert("imageVersion".to_string(), Value::String(version.clone()));
        }

        let doc = json!({
            "apiVersion": API_VERSION,
            "kind": KIND,
            "metadata": {
                "name": NAME,
                "namespace": NAMESPACE,
            },
            "spec": spec,
        });

        yaml::emit(&doc, 0)
    }
}

#[cfg(test)]
mod test {
    use super::JumpstarterSpec;

    #[test]
    fn minimal_document() {
        let spec = JumpstarterSpec {
            base_domain: "example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(
            spec.to_yaml(),
            "apiVersion: jumpstarter.dev/v1alpha1\n\
             kind: Jumpstarter\n\
             metadata:\n\
             \x20\x20name: jumpstarter\n\
             \x20\x20namespace: default\n\
             spec:\n\
             \x20\x20baseDomain: example.com"
        );
    }

    #[test]
    fn image_version_is_included_when_set() {
        let spec = JumpstarterSpec {
            base_domain: "example.com".to_string(),
            image_version: Some("0.7.0".to_string()),
            ..Default::default()
        };
        assert!(spec.to_yaml().ends_with("  baseDomain: example.com\n  imageVersion: 0.7.0"));
    }

    #[test]
    fn image_takes_precedence_over_image_version() {
        let spec = JumpstarterSpec {
            base_domain: "example.com".to_string(),
            image: Some("quay.io/jumpstarter/controller@sha256-abc".to_string()),
            image_version: Some("0.7.0".to_string()),
        };
        let yaml = spec.to_yaml();
        assert!(yaml.contains("  image: quay.io/jumpstarter/controller@sha256-abc"));
        assert!(!yaml.contains("imageVersion"));
    }
}
