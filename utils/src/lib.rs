//! Shared filesystem utilities for Coffer.
//!
//! Kept out of `coffer-types` so that crate stays free of IO:
//!
//! - **`atomic_write`**: crash-safe file persistence (temp + rename)
//! - **`private_dir`**: owner-only directory creation for stored secrets

pub mod atomic_write;
pub mod private_dir;

pub use atomic_write::{
    AtomicWriteOptions, PersistMode, SyncPolicy, atomic_write, atomic_write_with_options,
    recover_bak_file,
};
pub use private_dir::ensure_private_dir;
