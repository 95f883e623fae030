//! Client SDK for the contract-management product.
//!
//! The stores here are thin CRUD bindings over two REST backends, a
//! user/identity service and a contract service. Presentation layers
//! never hit the network directly: they call a store action, the
//! action goes through [`executor::RequestExecutor`] with the current
//! token, and the store publishes the normalized result. Composition
//! is leaf-first: executor, then [`session::SessionStore`] (which owns
//! the token), then [`admin::AdminStore`] and
//! [`contracts::ContractService`], which receive the token per call.

pub mod admin;
pub mod config;
pub mod contracts;
pub mod executor;
pub mod prefs;
pub mod session;

pub use admin::AdminStore;
pub use config::{load_settings, Settings};
pub use contracts::{ContractService, UploadFile};
pub use executor::{ApiBody, Payload, RequestExecutor};
pub use prefs::{DurablePrefs, MemoryPrefs, PrefsStore};
pub use session::SessionStore;
pub use shared::error::ApiError;
