//! Configuration validation.
//!
//! Serde handles the syntax; this module checks semantics. Every problem is
//! reported, not just the first one, so an operator can fix a config file in
//! one pass.

use thiserror::Error;
use url::Url;

use crate::config::schema::Config;
use crate::security::api_key::is_valid_api_key;

/// Largest accepted `service.max_upload_size`, in MB.
pub const MAX_UPLOAD_SIZE_MB: u64 = 4096;

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server's TLS certificate is missing")]
    MissingTlsCertificate,
    #[error("server's TLS key is missing")]
    MissingTlsKey,
    #[error("server's TLS version is invalid; must be 1.2 or 1.3")]
    InvalidTlsVersion,
    #[error("server's address is invalid: {0}")]
    InvalidAddress(String),
    #[error("service's contact information is missing")]
    MissingContact,
    #[error("service's privacy policy is missing")]
    MissingPrivacyPolicy,
    #[error("service's terms of service is missing")]
    MissingTermsOfService,
    #[error("service's API key is missing")]
    MissingApiKey,
    #[error("service's homepage is invalid")]
    InvalidHomepage,
    #[error("service's privacy policy is invalid")]
    InvalidPrivacyPolicy,
    #[error("service's terms of service is invalid")]
    InvalidTermsOfService,
    #[error("service's API key is invalid")]
    InvalidApiKey,
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u64 },
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let tls = &config.server.tls;
    let service = &config.service;

    if tls.certificate.is_empty() {
        errors.push(ValidationError::MissingTlsCertificate);
    }
    if tls.key.is_empty() {
        errors.push(ValidationError::MissingTlsKey);
    }
    if tls.version != "1.2" && tls.version != "1.3" {
        errors.push(ValidationError::InvalidTlsVersion);
    }
    if config.server.address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress(config.server.address.clone()));
    }

    if service.contact.is_empty() {
        errors.push(ValidationError::MissingContact);
    }
    if service.privacy_policy.is_empty() {
        errors.push(ValidationError::MissingPrivacyPolicy);
    } else if Url::parse(&service.privacy_policy).is_err() {
        errors.push(ValidationError::InvalidPrivacyPolicy);
    }
    if service.terms_of_service.is_empty() {
        errors.push(ValidationError::MissingTermsOfService);
    } else if Url::parse(&service.terms_of_service).is_err() {
        errors.push(ValidationError::InvalidTermsOfService);
    }
    if Url::parse(&service.homepage).is_err() {
        errors.push(ValidationError::InvalidHomepage);
    }
    if service.api_key.is_empty() {
        errors.push(ValidationError::MissingApiKey);
    } else if !is_valid_api_key(&service.api_key) {
        errors.push(ValidationError::InvalidApiKey);
    }

    if service.max_upload_size == 0 {
        errors.push(ValidationError::Zero("service.max_upload_size"));
    } else if service.max_upload_size > MAX_UPLOAD_SIZE_MB {
        errors.push(ValidationError::TooLarge {
            field: "service.max_upload_size",
            max: MAX_UPLOAD_SIZE_MB,
        });
    }
    if service.max_allowed_width == 0 {
        errors.push(ValidationError::Zero("service.max_allowed_width"));
    }
    if service.max_allowed_height == 0 {
        errors.push(ValidationError::Zero("service.max_allowed_height"));
    }
    if !(config.fetch.requests_per_second > 0.0) {
        errors.push(ValidationError::Zero("fetch.requests_per_second"));
    }
    if config.fetch.burst == 0 {
        errors.push(ValidationError::Zero("fetch.burst"));
    }
    if config.fetch.cache_capacity == 0 {
        errors.push(ValidationError::Zero("fetch.cache_capacity"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
