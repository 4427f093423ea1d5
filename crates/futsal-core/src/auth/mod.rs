//! Authentication module for the tournament administrator.
//!
//! This module provides:
//! - `AuthProvider`: the identity interface the dashboard consumes
//! - `IdentityToolkitProvider`: email/password sign-in against a hosted identity REST service
//! - `Session`: the signed-in identity, persisted until its token expires
//! - `CredentialStore`: optional keychain slot for the admin password
//!
//! Only the identity's email address matters to the rest of the crate:
//! see [`is_admin`].

pub mod credentials;
pub mod identity_toolkit;
pub mod provider;
pub mod session;

pub use credentials::CredentialStore;
pub use identity_toolkit::IdentityToolkitProvider;
pub use provider::{is_admin, AuthError, AuthProvider, Identity};
pub use session::Session;
