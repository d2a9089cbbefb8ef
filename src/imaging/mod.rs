//! Imaging collaborators: codec, metadata reader, and transform ops.
//!
//! The module is split into:
//! - **Backend**: the [`ImageBackend`] trait the pipeline dispatches against
//! - **RustBackend**: the production implementation (`image` crate +
//!   `kamadak-exif`)

pub mod backend;
pub mod rust_backend;

pub use backend::{BackendError, EncodeParams, ImageBackend, ImageMetadata};
pub use rust_backend::RustBackend;
