use crate::config::TenancyConfig;

use super::error::TenancyError;
use super::model::TenantSlug;

/// Maps a request host/authority to the slug the request is *for*.
///
/// This only narrows which tenant is being addressed (branding, login
/// scoping). It is never an authorization input.
#[derive(Debug, Clone)]
pub struct TenantResolver {
    loopback_host: String,
    default_slug: String,
}

impl TenantResolver {
    pub fn new(loopback_host: impl Into<String>, default_slug: impl Into<String>) -> Self {
        Self {
            loopback_host: loopback_host.into().to_ascii_lowercase(),
            default_slug: default_slug.into().to_ascii_lowercase(),
        }
    }

    pub fn from_config(config: &TenancyConfig) -> Self {
        Self::new(&config.loopback_host, &config.default_slug)
    }

    pub fn default_slug(&self) -> &str {
        &self.default_slug
    }

    pub fn resolve(&self, host_authority: &str) -> Result<TenantSlug, TenancyError> {
        let host = strip_port(host_authority.trim()).to_ascii_lowercase();
        if host.is_empty() {
            return Err(TenancyError::MalformedHost("host header is empty".to_string()));
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.iter().any(|label| label.is_empty()) {
            return Err(TenancyError::MalformedHost(host_authority.to_string()));
        }

        // Loopback / direct-domain access carries no tenant subdomain
        if labels.len() <= 2 && labels[0] == self.loopback_host {
            return Ok(TenantSlug::from_label(self.default_slug.clone()));
        }

        Ok(TenantSlug::from_label(labels[0]))
    }
}

fn strip_port(authority: &str) -> &str {
    match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TenantResolver {
        TenantResolver::new("localhost", "default")
    }

    fn slug(host: &str) -> String {
        resolver().resolve(host).unwrap().as_str().to_string()
    }

    #[test]
    fn loopback_hosts_resolve_to_default_slug() {
        assert_eq!(slug("localhost"), "default");
        assert_eq!(slug("localhost:3000"), "default");
        assert_eq!(slug("localhost.localdomain"), "default");
        assert_eq!(slug("LOCALHOST"), "default");
    }

    #[test]
    fn first_label_is_the_candidate_slug() {
        assert_eq!(slug("alnoor.example.com"), "alnoor");
        assert_eq!(slug("madinah.app.example.co.uk"), "madinah");
        assert_eq!(slug("alnoor.example.com:8443"), "alnoor");
        assert_eq!(slug("Alnoor.Example.com"), "alnoor");
    }

    #[test]
    fn loopback_with_many_labels_is_a_tenant_label() {
        assert_eq!(slug("localhost.example.co.uk"), "localhost");
    }

    #[test]
    fn single_non_loopback_label_is_used_directly() {
        assert_eq!(slug("intranet"), "intranet");
    }

    #[test]
    fn empty_host_is_malformed_not_defaulted() {
        for host in ["", "   ", ":3000"] {
            assert!(
                matches!(resolver().resolve(host), Err(TenancyError::MalformedHost(_))),
                "expected '{}' to be malformed",
                host
            );
        }
    }

    #[test]
    fn empty_labels_are_malformed() {
        for host in [".example.com", "alnoor..example.com", "alnoor.example.com."] {
            assert!(matches!(resolver().resolve(host), Err(TenancyError::MalformedHost(_))));
        }
    }

    #[test]
    fn configured_default_slug_is_used() {
        let resolver = TenantResolver::new("dev", "alnoor");
        assert_eq!(resolver.resolve("dev:8080").unwrap().as_str(), "alnoor");
        assert_eq!(resolver.resolve("localhost").unwrap().as_str(), "localhost");
    }
}
