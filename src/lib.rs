// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Touch and gyroscope driven space scenes rendered with wgpu.
//!
//! Cosmoview shows a switchable set of animated scenes (starfields, a
//! black-hole lensing pass, a pulsar, an Earth globe, a model viewer). The
//! active scene's camera follows either the device attitude or a touch drag.
//!
//! # Key entry points
//!
//! - [`runtime::ViewRuntime`] - owns the views, forwards lifecycle and frame
//!   events to the active one, and performs the switch
//! - [`motion::FusionController`] - fuses orientation samples and touch drags
//!   into a single smoothed yaw/pitch
//! - [`view::View`] - the contract every scene implements
//! - [`surface::RenderSurface`] - the shared drawing surface, implemented on
//!   wgpu by [`gpu::surface::GpuSurface`]
//! - [`options::Options`] - runtime configuration (motion, clock, display,
//!   keybindings)
//!
//! # Frame flow
//!
//! The host calls [`runtime::ViewRuntime::frame`] once per displayed frame.
//! The frame clock turns the host timestamp into a clamped `dt`, the fusion
//! controller integrates it and writes the active camera (when the view
//! accepts motion), then the view updates and draws.

pub mod camera;
pub mod error;
pub mod gpu;
pub mod input;
pub mod motion;
pub mod options;
pub mod runtime;
pub mod scene;
pub mod surface;
pub mod util;
pub mod view;
pub mod views;

#[cfg(feature = "viewer")]
pub mod viewer;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use error::CosmoError;
pub use input::{InputEvent, OrientationSample};
pub use motion::{FusionController, PermissionRequest};
pub use options::Options;
pub use runtime::ViewRuntime;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
