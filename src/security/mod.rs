//! Security subsystem.
//!
//! Request-facing checks (user agent, authorization, method allow-list) live
//! in `http::middleware`; this module owns the key material they rely on.

pub mod api_key;
