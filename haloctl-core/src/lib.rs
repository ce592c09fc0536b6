//! # haloctl core
//!
//! Client library for the Halo CMS admin API.
//!
//! This crate provides:
//! - [`AuthInterceptor`] - attaches the stored access token to every request
//!   and recovers from 401 with a single-flight refresh-or-login cycle
//! - [`SecretStore`] backends for the access/refresh token pair
//! - [`HaloClient`] - typed calls for posts, journals, attachments
//! - [`ReleasesClient`] - Halo releases from GitHub
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use haloctl_core::{AuthInterceptor, HaloClient, InterceptorConfig, MemoryStore, ReqwestTransport};
//!
//! async fn latest_posts() -> Result<(), haloctl_core::ApiError> {
//!     let transport = ReqwestTransport::new("http://localhost:8090/api/admin", timeout)?;
//!     let interceptor = AuthInterceptor::new(transport, MemoryStore::new(), InterceptorConfig::default());
//!     let client = HaloClient::new(interceptor);
//!     for post in client.list_posts(&Default::default()).await? {
//!         println!("{}", post.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod credentials;
pub mod error;
pub mod interceptor;
pub mod releases;
pub mod store;
pub mod transport;

pub use api::{HaloClient, JournalType, PostQuery};

pub use auth::{AuthEndpoints, LoginCredentials};

pub use credentials::{CredentialKey, Credentials, TokenPair};

pub use error::ApiError;

pub use interceptor::{AuthInterceptor, InterceptorConfig, TokenHeader};

pub use releases::ReleasesClient;

pub use store::{
    Secret,
    SecretStore,
    StoreError,
    MemoryStore,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
