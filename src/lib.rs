// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # nativeregex
//!
//! A safe, leak-free binding layer between a host that manages UTF-16 strings and a native,
//! handle-based regular-expression engine that works on UTF-8 bytes.
//!
//! ## Features
//!
//! - **Exactly-once release** - every native object is owned by one wrapper and released either
//!   explicitly or, when the owner is dropped, on a background cleanup thread
//! - **UTF-16 indices** - byte offsets reported by the engine are translated to UTF-16 indices,
//!   surrogate pairs included
//! - **Probe-and-retry output** - variable-length native output is retrieved with at most one
//!   retry and never silently truncated
//! - **Closures as callouts** - Rust closures run inside native matching through a C-ABI
//!   trampoline that contains panics
//! - **Typed errors** - every native result code keeps its value and gets a [`NativeErrorKind`]
//!
//! ## Quick Start
//!
//! ```rust
//! use nativeregex::prelude::*;
//! use widestring::u16str;
//!
//! let backend = default_backend();
//! let code = Code::compile(&backend, u16str!("🌐"), CompileOptions::UTF, None)?;
//! let mut match_data = MatchData::from_code(&code)?;
//!
//! let caps = code
//!     .captures(u16str!("Hello 🌐 World"), 0, MatchOptions::empty(), &mut match_data, None)?
//!     .expect("matches");
//! assert_eq!(caps.ovector(), &[6, 10]);
//! assert_eq!(caps.indices(), &[6, 8]);
//! # Ok::<(), nativeregex::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`backend`] - the [`Backend`] trait every native engine is reached through, and the bundled
//!   [`AutomataBackend`]
//! - [`resource`] - handle ownership and the deferred cleanup scheduler
//! - [`pattern`] - the safe wrappers: [`Code`], [`MatchData`], contexts and JIT stacks
//! - [`offsets`] and [`subject`] - UTF-16 / UTF-8 translation
//! - [`probe`] - growable output buffers
//! - [`callout`] - the callback bridge
//! - [`Error`] and [`Result`] - error handling
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger. Deferred releases log
//! at `debug`, failing releases at `warn` and panics inside release actions or callouts at
//! `error`.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use nativeregex::prelude::*;
/// use widestring::u16str;
///
/// let backend = default_backend();
/// let code = Code::compile(&backend, u16str!("a+"), CompileOptions::empty(), None)?;
/// assert!(code.is_match(u16str!("caaat"))?);
/// # Ok::<(), nativeregex::Error>(())
/// ```
pub mod prelude;

/// The foreign-call seam and the bundled engine.
///
/// [`Backend`] lists the raw native entry points: integer handles, signed result codes,
/// caller-owned buffers and C-ABI callouts. [`backend::codes`] holds the shared constants.
pub mod backend;

/// Closures as native callouts.
pub mod callout;

/// Resource limits and compile settings.
pub mod config;

/// Opaque native handles.
pub mod handle;

/// Translation between engine byte offsets and UTF-16 indices.
pub mod offsets;

/// Option bitmasks for compiling, matching, JIT compiling and substituting.
pub mod options;

/// Safe wrappers around native engine objects.
///
/// # Key Components
///
/// - [`Code`] - compiled pattern
/// - [`MatchData`] - output vector storage
/// - [`CompileContext`] and [`MatchContext`] - settings and callouts
/// - [`JitStack`] - JIT matching stack
pub mod pattern;

/// Probe-and-retry retrieval of variable-length native output.
pub mod probe;

/// Ownership of native handles and their deferred release.
///
/// Every native object is wrapped in a [`resource::NativeResource`]. Dropping one without
/// disposing it hands the release to [`CleanupScheduler`], which runs it on a background thread.
pub mod resource;

/// UTF-16 subjects prepared for the engine.
pub mod subject;

/// `nativeregex` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `nativeregex` Error type
///
/// The main error type for all operations in this crate. See [`Error`] for the variants.
pub use error::{Error, NativeError, NativeErrorKind};

pub use backend::{default_backend, AutomataBackend, Backend};
pub use callout::{Callout, CalloutRegistration};
pub use config::{CompileLimits, MatchLimits, Newline};
pub use handle::Handle;
pub use offsets::map_offsets_to_indices;
pub use options::{CompileOptions, JitOptions, MatchOptions, SubstituteOptions};
pub use pattern::{
    deserialize, error_message, serialize, serialized_pattern_count, Captures, Code,
    CompileContext, JitStack, MatchContext, MatchData, Matches, NameEntry, Substitution,
};
pub use resource::CleanupScheduler;
pub use subject::Subject;
