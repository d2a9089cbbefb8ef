//! # picslice
//!
//! The request-interpretation core of an image delivery service using the
//! IIIF Image API addressing scheme. A compact path spec —
//! `identifier/region/size/rotation/quality.format[?query]` — is parsed
//! into a validated [`Request`], its geometry is resolved against the
//! decoded image's bounds and a maximum-size policy, and a fixed sequence
//! of transforms is dispatched to an imaging backend before encoding.
//!
//! ```text
//! spec string → request (parse) → processor (geometry + transforms) → encoded bytes
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`request`] | Spec-string grammar: region/size/rotation/quality/format segments and query options |
//! | [`geometry`] | Pure dimension math: aspect-preserving fits and size resolution against a maximum |
//! | [`imaging`] | The [`ImageBackend`] capability trait and the pure-Rust production backend |
//! | [`pipeline`] | The ordered transform dispatch for one request |
//!
//! # Design Decisions
//!
//! ## Fail-fast parsing
//!
//! Every segment of the spec is validated before any image byte is read.
//! Malformed input surfaces as [`InvalidSpec`] with a message safe to echo
//! to the caller; it is never retried or partially applied.
//!
//! ## Sum types over kind discriminators
//!
//! [`Region`] and [`Size`] are enums, so a value with (say) an absolute
//! tag and a relative payload cannot be constructed. The format table is a
//! `const` slice — no process-wide mutable state anywhere in the core.
//!
//! ## Injected limits
//!
//! The maximum output size and the border-trim fuzziness are
//! [`ProcessConfig`] fields injected at construction, defaulting to
//! 6000×6000 and 0.1. Tests tighten them without patching constants.
//!
//! ## Backend as a seam
//!
//! The pipeline only talks to the [`ImageBackend`] trait. The production
//! [`RustBackend`] is pure Rust (`image` crate + `kamadak-exif`), so the
//! binary has no system dependencies; tests dispatch against a recording
//! mock and assert on the operation sequence instead of pixels.

pub mod geometry;
pub mod imaging;
pub mod pipeline;
pub mod request;

pub use geometry::{Dimensions, GeometryError, Rect, RelativeRegion};
pub use imaging::{BackendError, EncodeParams, ImageBackend, ImageMetadata, RustBackend};
pub use pipeline::{ProcessConfig, ProcessError, Processor};
pub use request::{Format, InvalidSpec, Region, Request, Size, parse_spec};
