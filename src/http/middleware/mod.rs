//! Middleware chain for the protected endpoints.
//!
//! # Data Flow
//! ```text
//! request
//!     → recovery.rs (panic → 500)
//!     → access_control.rs (User-Agent → 400, API key → 401)
//!     → methods.rs (allow-list → 405 + Allow)
//!     → Privacy-Policy / Terms-Of-Service response headers
//!     → handler
//! ```
//!
//! The chain is a plain list of [`Link`]s folded onto the router once, when the
//! server is built. The first link ends up outermost. Every rejection answers
//! with the JSON envelope and stops the request there.

pub mod access_control;
pub mod methods;
pub mod recovery;

use std::sync::Arc;

use axum::{
    http::{header::InvalidHeaderValue, HeaderName, HeaderValue, Method},
    middleware, Router,
};
use tower_http::{catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer};

use crate::config::ServiceConfig;

pub use access_control::{require_api_key, require_user_agent};
pub use methods::{accept_methods, AllowedMethods};
pub use recovery::{handle_panic, handle_timeout};

/// `Privacy-Policy` response header.
pub static PRIVACY_POLICY: HeaderName = HeaderName::from_static("privacy-policy");
/// `Terms-Of-Service` response header.
pub static TERMS_OF_SERVICE: HeaderName = HeaderName::from_static("terms-of-service");

/// One request interceptor.
#[derive(Debug, Clone)]
pub enum Link {
    /// Turn a panic in any inner layer into a 500.
    PanicRecovery,
    /// Reject requests without a `User-Agent`.
    UserAgent,
    /// Require `Authorization: Bearer <key>`.
    Authorization(Arc<str>),
    /// Reject methods outside the list.
    AcceptMethods(Arc<AllowedMethods>),
    /// Always set `Privacy-Policy`.
    PrivacyPolicy(HeaderValue),
    /// Always set `Terms-Of-Service`.
    TermsOfService(HeaderValue),
}

impl Link {
    fn wrap<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        match self {
            Link::PanicRecovery => router.layer(CatchPanicLayer::custom(handle_panic)),
            Link::UserAgent => router.layer(middleware::from_fn(require_user_agent)),
            Link::Authorization(expected) => {
                router.layer(middleware::from_fn_with_state(expected.clone(), require_api_key))
            }
            Link::AcceptMethods(allowed) => {
                router.layer(middleware::from_fn_with_state(allowed.clone(), accept_methods))
            }
            Link::PrivacyPolicy(uri) => router.layer(SetResponseHeaderLayer::overriding(
                PRIVACY_POLICY.clone(),
                uri.clone(),
            )),
            Link::TermsOfService(uri) => router.layer(SetResponseHeaderLayer::overriding(
                TERMS_OF_SERVICE.clone(),
                uri.clone(),
            )),
        }
    }
}

/// Ordered list of links, outermost first.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    links: Vec<Link>,
}

impl Chain {
    pub fn new(links: Vec<Link>) -> Self {
        Self { links }
    }

    /// The standard chain for the protected endpoints.
    pub fn protected(service: &ServiceConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self::new(vec![
            Link::PanicRecovery,
            Link::UserAgent,
            Link::Authorization(bearer(&service.api_key)),
            Link::AcceptMethods(Arc::new(AllowedMethods::new(vec![
                Method::POST,
                Method::GET,
                Method::HEAD,
            ]))),
            Link::PrivacyPolicy(HeaderValue::from_str(&service.privacy_policy)?),
            Link::TermsOfService(HeaderValue::from_str(&service.terms_of_service)?),
        ]))
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Wrap every route currently on `router` in the chain.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        // Layers added later sit outside earlier ones, so fold from the back.
        self.links
            .iter()
            .rev()
            .fold(router, |router, link| link.wrap(router))
    }
}

/// Expected `Authorization` value for an API key.
pub fn bearer(api_key: &str) -> Arc<str> {
    Arc::from(format!("Bearer {api_key}"))
}
