use super::config::{DEFAULT_GROUP, DEFAULT_KIND, DEFAULT_VERSION};
use kube::api::ApiResource;
use kube::core::GroupVersionKind;

/// Identifies the single resource being watched. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceReference {
    /// Reference an `ExternalSecret` (`external-secrets.io/v1beta1`)
    #[must_use]
    pub fn external_secret(namespace: &str, name: &str) -> Self {
        Self::new(DEFAULT_GROUP, DEFAULT_VERSION, DEFAULT_KIND, namespace, name)
    }

    #[must_use]
    pub fn new(group: &str, version: &str, kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Dynamic API description used for the status fetch
    #[must_use]
    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk(&GroupVersionKind {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: self.kind.clone(),
        })
    }

    /// Server-side filter selecting events about this resource. The
    /// namespace is scoped by the namespaced events API instead.
    #[must_use]
    pub fn event_field_selector(&self) -> String {
        format!(
            "involvedObject.kind={},involvedObject.name={}",
            self.kind, self.name
        )
    }
}

impl std::fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_secret_api_resource() {
        let r = ResourceReference::external_secret("apps", "db-creds");
        let ar = r.api_resource();
        assert_eq!(ar.group, "external-secrets.io");
        assert_eq!(ar.version, "v1beta1");
        assert_eq!(ar.api_version, "external-secrets.io/v1beta1");
        assert_eq!(ar.kind, "ExternalSecret");
        assert_eq!(ar.plural, "externalsecrets");
    }

    #[test]
    fn test_event_field_selector_matches_kind_and_name() {
        let r = ResourceReference::external_secret("apps", "db-creds");
        assert_eq!(
            r.event_field_selector(),
            "involvedObject.kind=ExternalSecret,involvedObject.name=db-creds"
        );
    }

    #[test]
    fn test_display() {
        let r = ResourceReference::new("example.io", "v1", "Widget", "ns", "w1");
        assert_eq!(r.to_string(), "Widget ns/w1");
    }
}
