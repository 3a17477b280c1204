//! # Primitives
//!
//! Hardcoded constants for hashpoint entity resolution.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! The error message format built from [`HASH_ENTITY_DOCS_URL`] is a stable
//! contract: callers may assert on its literal substrings.

/// Entity type prefix handled by the hash reducer.
///
/// Entity ids take the form `hash:<name>`.
pub const HASH_ENTITY_TYPE: &str = "hash";

/// Separator between entity type and entity name.
pub const ENTITY_SEPARATOR: char = ':';

/// Prefix that marks a transform expression as a path lookup.
///
/// `"$"` alone selects the whole value, `"$a.b"` selects a nested key.
pub const PATH_PREFIX: char = '$';

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Documentation link appended to every validation error.
pub const HASH_ENTITY_DOCS_URL: &str = "https://github.com/hashpoint/hashpoint#hash-entity";

/// Suffix appended to the parent id for inline hash configurations.
pub const INLINE_ENTITY_SUFFIX: &str = "#inline";

/// Maximum entity nesting depth during one resolution.
///
/// - Every entity (registered or inline) entered increments the depth.
/// - Self-referencing definitions fail with `DepthExceeded` instead of
///   recursing without bound.
pub const MAX_RESOLVE_DEPTH: usize = 64;

/// Maximum number of stages in a single `compose` list.
///
/// Checked when a configuration is parsed.
pub const MAX_COMPOSE_STAGES: usize = 256;
