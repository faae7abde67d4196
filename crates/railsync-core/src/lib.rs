//! Railsync Core - Object graph synchronization with Rails-style REST servers
//!
//! This crate keeps local object graphs in sync with remote resources exposed
//! through Rails JSON conventions: pluralized `.json` paths, model-name
//! envelopes on write bodies, `_attributes` nested keys, and 422 per-field
//! validation payloads.
//!
//! # Main Components
//!
//! - **Error Handling**: One taxonomy for precondition, transport, remote,
//!   and mapping failures, using `thiserror` and `anyhow`
//! - **Naming**: Underscore/camelize transforms and pluralization
//! - **Sync Specs**: Per-type property declarations parsed from compact
//!   comma-separated spec strings, with inheritance
//! - **Mapping**: Serialization to wire dictionaries and change-detecting
//!   deserialization back onto objects
//! - **Dispatch**: A `Context` that routes CRUD and custom-method requests
//!   through a pluggable transport, async with optional blocking adapters
//!
//! # Example
//!
//! ```no_run
//! use railsync_core::{Context, Method, ModelType, RemoteConfig, RemoteObject, Result};
//!
//! async fn example() -> Result<()> {
//!     let context = Context::new(RemoteConfig::new("http://localhost:3000"))?;
//!     let article = context.register(ModelType::new("Article").with_sync("title, content"));
//!
//!     let mut post = RemoteObject::new(article.clone());
//!     post.set_scalar("title", "Hello");
//!     post.remote_create(&context).await?;
//!
//!     let all = context.fetch_all(&article).await?;
//!     println!("{} articles, newest id {:?}", all.len(), post.remote_id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod inflect;
pub mod mapping;
pub mod model;
pub mod property;
pub mod remote;

// Re-export main types for convenience
pub use config::{RemoteConfig, ATTRIBUTES_SUFFIX, RAILS_DATE_FORMAT};
pub use error::{Error, Result};
pub use http::{HttpTransport, Method, MockTransport, ReqwestTransport, RestRequest, RestResponse};
pub use inflect::{camelize, underscore, Pluralizer};
pub use model::{FieldValue, ModelType, RemoteObject, TypeRegistry};
pub use property::{PropertyCollection, SyncField};
pub use remote::Context;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
