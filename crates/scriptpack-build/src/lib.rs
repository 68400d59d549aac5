//! Dockerfile rendering, build-context assembly, and eject for scriptpack.
//!
//! # Build pipeline
//!
//! ```text
//! scriptpack build
//!   1. Lint        ── DependencyManifest::load() (malformed lines abort)
//!   2. Dockerfile  ── DockerfileGenerator::render(), or .scriptpack/Dockerfile if ejected
//!   3. Context     ── manifest + script + include → .scriptpack-build/
//!   4. Engine      ── docker build -t <name:tag> .scriptpack-build/
//! ```
//!
//! # Stage layout
//!
//! - **multi-stage** (default): a `builder` stage creates `/opt/venv` and
//!   installs the manifest; the final stage copies only `/opt/venv` and the
//!   script on top of the runtime image.
//! - **single-stage**: one unlabelled stage does both.
//!
//! The version-control client and any extra system packages are always
//! installed in the final stage, so they are on the image's `PATH` at run
//! time.

pub mod bundle;
pub mod dockerfile;
pub mod eject;

pub use dockerfile::DockerfileGenerator;
