//! # nativeregex Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the nativeregex library. Import this module to get quick access to the essential
//! types for compiling and matching patterns.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all nativeregex operations
pub use crate::Error;

/// The result type used throughout nativeregex
pub use crate::Result;

/// Native result codes and their classification
pub use crate::{NativeError, NativeErrorKind};

/// Message text for a native result code
pub use crate::error_message;

// ================================================================================================
// Backends
// ================================================================================================

/// The native engine seam, the bundled engine and the process-wide default
pub use crate::{default_backend, AutomataBackend, Backend};

// ================================================================================================
// Patterns and Matching
// ================================================================================================

/// Compiled patterns, match data and match results
pub use crate::{Captures, Code, MatchData, Matches, NameEntry, Substitution};

/// Compile and match settings
pub use crate::{CompileContext, JitStack, MatchContext};

/// Option bitmasks
pub use crate::{CompileOptions, JitOptions, MatchOptions, SubstituteOptions};

/// Resource limits and newline conventions
pub use crate::{CompileLimits, MatchLimits, Newline};

// ================================================================================================
// Callouts
// ================================================================================================

/// Closures invoked during matching
pub use crate::{Callout, CalloutRegistration};

// ================================================================================================
// Strings and Offsets
// ================================================================================================

/// Prepared subjects and offset translation
pub use crate::{map_offsets_to_indices, Subject};

// ================================================================================================
// Serialization
// ================================================================================================

/// Persisting compiled patterns
pub use crate::{deserialize, serialize, serialized_pattern_count};
