//! Local resources for Coffer: files, sandboxed files, bundled assets, and
//! key-value entries.
//!
//! - **`file`**: [`FileResource`], a typed value at an explicit path
//! - **`sandbox`**: [`SandboxResource`], a file under a per-application root
//! - **`bundle`**: [`BundleResource`], read-only assets next to the executable
//! - **`kv`** / **`store`**: [`KeyValueResource`] over a [`KeyValueStore`]
//!
//! All operations are synchronous; each is a single read or write.

#![allow(clippy::missing_errors_doc)]

pub mod bundle;
pub mod file;
pub mod kv;
pub mod sandbox;
pub mod store;

pub use bundle::{Bundle, BundleResource};
pub use file::FileResource;
pub use kv::KeyValueResource;
pub use sandbox::{Sandbox, SandboxLocation, SandboxResource};
pub use store::{
    FileStore, KeyValueStore, MemoryStore, default_store, default_store_installed,
    install_default_store, store_from_config,
};
