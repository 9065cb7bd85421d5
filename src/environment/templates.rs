//! Templates for the artifacts environments write next to the generated
//! gateway config.
//!
//! Both are rendered with minijinja. File names and document shape are
//! consumed by the apply step, so changing either is a breaking change.

use minijinja::Environment;
use serde::Serialize;

/// Port the discovery component serves xDS on (plaintext).
pub const DISCOVERY_GRPC_PORT: u16 = 15010;

/// Mount point of the generated config inside the discovery container.
pub const CONFIG_MOUNT_PATH: &str = "/var/lib/istio/config/data";

/// Mount point of the mesh config inside both containers.
pub const MESH_CONFIG_MOUNT_PATH: &str = "/etc/istio/config/mesh";

const MESH_CONFIG_TEMPLATE: &str = r#"
enableAutoMtls: false
accessLogFile: /dev/stdout
defaultConfig:
  discoveryAddress: {{ discovery_address }}
  controlPlaneAuthPolicy: NONE
  terminationDrainDuration: 0s
  sds:
    enabled: false
defaultServiceExportTo:
  - '*'
defaultVirtualServiceExportTo:
  - '*'
defaultDestinationRuleExportTo:
  - '*'
configSources:
- address: fs://{{ config_source }}
"#;

const SERVICE_ENTRY_TEMPLATE: &str = r#"
apiVersion: networking.istio.io/v1alpha3
kind: ServiceEntry
metadata:
  name: {{ host }}
spec:
  exportTo:
  - "*"
  hosts:
  - "{{ host }}"
  ports:
  - number: {{ port }}
    name: http
    protocol: HTTP
  resolution: DNS
"#;

#[derive(Debug, Serialize)]
struct MeshConfigContext {
    discovery_address: String,
    config_source: &'static str,
}

/// Host and port the control plane should resolve the backend to.
#[derive(Debug, Serialize)]
pub struct ServiceEntryHost<'a> {
    pub host: &'a str,
    pub port: u16,
}

fn render<S: Serialize>(name: &str, source: &str, ctx: S) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(name, source)?;
    let template = env.get_template(name)?;
    template.render(ctx)
}

/// Mesh config for a discovery component reachable as `discovery_host`.
pub fn render_mesh_config(discovery_host: &str) -> Result<String, minijinja::Error> {
    render(
        "mesh-config",
        MESH_CONFIG_TEMPLATE,
        MeshConfigContext {
            discovery_address: format!("{discovery_host}:{DISCOVERY_GRPC_PORT}"),
            config_source: CONFIG_MOUNT_PATH,
        },
    )
}

pub fn render_service_entry(entry: &ServiceEntryHost<'_>) -> Result<String, minijinja::Error> {
    render("service-entry", SERVICE_ENTRY_TEMPLATE, entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_config_points_at_discovery() {
        let rendered = render_mesh_config("pilot-discovery").unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(
            doc["defaultConfig"]["discoveryAddress"].as_str(),
            Some("pilot-discovery:15010")
        );
        assert_eq!(
            doc["configSources"][0]["address"].as_str(),
            Some("fs:///var/lib/istio/config/data")
        );
        assert_eq!(doc["enableAutoMtls"].as_bool(), Some(false));
    }

    #[test]
    fn test_service_entry_host_and_port() {
        let rendered = render_service_entry(&ServiceEntryHost {
            host: "demo.local",
            port: 9080,
        })
        .unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(doc["kind"].as_str(), Some("ServiceEntry"));
        assert_eq!(doc["metadata"]["name"].as_str(), Some("demo.local"));
        assert_eq!(doc["spec"]["hosts"][0].as_str(), Some("demo.local"));
        assert_eq!(doc["spec"]["ports"][0]["number"].as_u64(), Some(9080));
        assert_eq!(doc["spec"]["resolution"].as_str(), Some("DNS"));
    }
}
