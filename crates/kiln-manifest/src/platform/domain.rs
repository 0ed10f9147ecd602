use kiln_config::KilnConfig;
use serde_json::{Map, Value, json};

use super::{PayloadStrategy, PlatformPayload, is_truthy};
use crate::error::{ManifestError, Result};

pub const DOMAIN_SECTION: &str = "domain";

const LETS_ENCRYPT: &str = "lets_encrypt";
const MTLS_VERIFICATIONS: &[&str] = &["enforce", "permissive"];

pub struct DomainStrategy;

impl PayloadStrategy for DomainStrategy {
    fn name(&self) -> &'static str {
        "domain"
    }

    fn generate(&self, config: &KilnConfig, payload: &mut PlatformPayload) -> Result<()> {
        let Some(domain) = config.get(DOMAIN_SECTION).filter(|v| is_truthy(v)) else {
            return Ok(());
        };
        let name = domain.get("name").and_then(Value::as_str).unwrap_or_default();

        if let Some(certificate) = domain.get("digitalCertificateId").and_then(Value::as_str) {
            if !certificate.is_empty() && certificate != LETS_ENCRYPT {
                return Err(ManifestError::platform(
                    self.name(),
                    format!(
                        "domain {name} has an invalid digital certificate ID: {certificate}. Only '{LETS_ENCRYPT}' or null is supported"
                    ),
                ));
            }
        }

        let mtls = domain.get("mtls").filter(|v| is_truthy(v));
        if let Some(verification) = mtls.and_then(|m| m.get("verification")).filter(|v| is_truthy(v)) {
            let valid = verification.as_str().is_some_and(|v| MTLS_VERIFICATIONS.contains(&v));
            if !valid {
                return Err(ManifestError::platform(
                    self.name(),
                    format!(
                        "domain {name} has an invalid verification value: {verification}. Only 'enforce' or 'permissive' is supported"
                    ),
                ));
            }
        }

        let mut setting = Map::new();
        setting.insert("name".into(), domain.get("name").cloned().unwrap_or(Value::Null));
        setting.insert("cname_access_only".into(), json!(truthy_field(domain, "cnameAccessOnly")));
        setting.insert("cnames".into(), or_default(domain, "cnames", json!([])));
        setting.insert("digital_certificate_id".into(), or_default(domain, "digitalCertificateId", Value::Null));
        setting.insert("edge_application_id".into(), or_default(domain, "edgeApplicationId", Value::Null));
        setting.insert("edge_firewall_id".into(), or_default(domain, "edgeFirewallId", Value::Null));
        setting.insert("active".into(), json!(true));

        match mtls {
            Some(mtls) => {
                setting.insert("is_mtls_enabled".into(), json!(true));
                setting.insert("mtls_verification".into(), mtls.get("verification").cloned().unwrap_or(Value::Null));
                setting.insert(
                    "mtls_trusted_ca_certificate_id".into(),
                    mtls.get("trustedCaCertificateId").cloned().unwrap_or(Value::Null),
                );
                setting.insert("crl_list".into(), or_default(mtls, "crlList", json!([])));
            }
            None => {
                setting.insert("is_mtls_enabled".into(), json!(false));
            }
        }

        payload.domain = setting;
        Ok(())
    }
}

fn truthy_field(node: &Value, key: &str) -> bool {
    node.get(key).is_some_and(is_truthy)
}

fn or_default(node: &Value, key: &str, default: Value) -> Value {
    node.get(key).filter(|v| is_truthy(v)).cloned().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(config: Value) -> Result<PlatformPayload> {
        let mut payload = PlatformPayload::default();
        DomainStrategy.generate(&KilnConfig::from_value(config).unwrap(), &mut payload)?;
        Ok(payload)
    }

    #[test]
    fn missing_domain_leaves_slot_empty() {
        assert!(run(json!({})).unwrap().domain.is_empty());
    }

    #[test]
    fn maps_domain_with_mtls() {
        let payload = run(json!({ "domain": {
            "name": "site",
            "cnames": ["www.example.com"],
            "digitalCertificateId": "lets_encrypt",
            "mtls": { "verification": "enforce", "trustedCaCertificateId": 7 }
        } }))
        .unwrap();

        let domain = Value::Object(payload.domain);
        assert_eq!(domain["cnames"], json!(["www.example.com"]));
        assert_eq!(domain["digital_certificate_id"], "lets_encrypt");
        assert_eq!(domain["is_mtls_enabled"], true);
        assert_eq!(domain["mtls_verification"], "enforce");
        assert_eq!(domain["mtls_trusted_ca_certificate_id"], 7);
        assert_eq!(domain["crl_list"], json!([]));
    }

    #[test]
    fn rejects_foreign_certificates_and_bad_verification() {
        assert!(run(json!({ "domain": { "name": "d", "digitalCertificateId": "custom" } })).is_err());
        assert!(run(json!({ "domain": { "name": "d", "mtls": { "verification": "strict" } } })).is_err());
    }
}
