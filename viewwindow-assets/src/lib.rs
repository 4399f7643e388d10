//! On-demand asset loading for `viewwindow` lists.
//!
//! The `viewwindow` crate decides which rows exist; this crate decides when the images inside
//! them are fetched and what each row should paint meanwhile. Like the core crate it does no
//! I/O and owns no timers:
//!
//! - [`AssetCoordinator`] runs the lazy (proximity-gated) and progressive (low then high
//!   resolution) state machines and hands out [`FetchRequest`]s.
//! - [`BatchLoader`] loads a set of identifiers with bounded concurrency.
//! - [`FetchDriver`] is an optional single-threaded executor glue: it runs requests through an
//!   [`AssetResolver`] and feeds the completions back.
//!
//! Every fetch carries a [`RequestToken`]. Completions for superseded records, released slots
//! or an unmounted coordinator are ignored, and created sources are revoked exactly once.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod batch;
mod coordinator;
mod driver;
mod error;
mod id;
mod options;
mod record;
mod request;
mod resolver;
mod source;
mod state;

#[cfg(test)]
mod tests;

pub use batch::BatchLoader;
pub use coordinator::AssetCoordinator;
pub use driver::{Completion, FetchDriver};
pub use error::AssetError;
pub use id::AssetId;
pub use options::{
    DEFAULT_CONCURRENCY_LIMIT, DEFAULT_FALLBACK, DEFAULT_PLACEHOLDER, LoaderOptions,
    OnErrorCallback, OnLoadCallback, OnStateChangeCallback,
};
pub use record::AssetRecord;
pub use request::{FetchRequest, RequestToken, Stage};
pub use resolver::{AssetResolver, FnResolver};
pub use source::{ObjectUrls, OwnedSource, SourceRegistry};
pub use state::{AssetState, LoadPolicy};
