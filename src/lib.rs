//! # Avatar Studio
//!
//! A client for creating avatars. The user picks a photo; it is checked,
//! downscaled, optionally stylized, re-encoded, uploaded to a remote avatar
//! store, and read back so the stored copy can be shown.
//!
//! # Architecture: Two User-Triggered Flows
//!
//! ```text
//! select   file   →  validate  →  transform        →  session slot (Ready)
//! upload   slot   →  store write (deadline race)   →  unwrap  →  read back (Success | Ready | Error)
//! ```
//!
//! Each flow is a run with its own sequence ticket. The session only accepts
//! completions from the newest run, so a slow decode or a late store reply
//! can never overwrite a newer result.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`validate`] | Media type and size checks on a selection, before any processing |
//! | [`imaging`] | Pure-Rust decode, bound, stylize, encode |
//! | [`upload`] | One store write raced against the client-side deadline |
//! | [`outcome`] | Tagged `ok`/`err` store replies → typed values and errors |
//! | [`store`] | The `AvatarStore` trait and its HTTP gateway client |
//! | [`session`] | Single image slot, status line, run tickets, upload trigger |
//! | [`pipeline`] | The select / upload / fetch / list flows wiring it all together |
//! | [`present`] | Status lines for the terminal and the HTML preview page |
//! | [`config`] | `avatar.toml` loading, validation and merging over stock defaults |
//! | [`error`] | The pipeline error taxonomy and user-facing messages |
//! | [`types`] | Values handed between stages (`SelectedFile`, `TransformedImage`) |
//!
//! # Design Decisions
//!
//! ## Transformed Bytes Only
//!
//! The uploader takes a [`types::TransformedImage`], never a
//! [`types::SelectedFile`]. Raw selections cannot reach the store: the type
//! system rules it out rather than a runtime check.
//!
//! ## Deterministic Stylization
//!
//! The cartoon, comic and 3D looks are fixed sequences of pixel passes with
//! constant palettes and parameters. There is no model and no randomness, so
//! the same input always yields byte-identical output, which keeps golden
//! tests meaningful.
//!
//! ## Deadline Is Client-Side
//!
//! The upload deadline (120 s by default) is a `tokio::time::timeout` around
//! the store call. When it fires the in-flight request is dropped and its
//! reply, if one ever comes, is never seen. The HTTP client has its own,
//! longer request timeout; the two are independent.
//!
//! ## Maud Preview Page
//!
//! The preview is generated with [Maud](https://maud.lambda.xyz/): malformed
//! markup is a build error and every interpolated status message is escaped.

pub mod config;
pub mod error;
pub mod imaging;
pub mod outcome;
pub mod pipeline;
pub mod present;
pub mod session;
pub mod store;
pub mod types;
pub mod upload;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
