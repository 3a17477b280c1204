//! # hashpoint-core
//!
//! Hash entity resolution for hashpoint - THE LOGIC.
//!
//! A hash entity takes a JSON object and applies declarative key-level edits:
//! rename (`mapKeys`), insert literals (`addKeys`), remove (`omitKeys`),
//! select (`pickKeys`), insert computed values (`addValues`) and chain
//! sub-resolutions (`compose`).
//!
//! ## Layout
//!
//! - `reducer` - the resolution algorithm (`HashReducer`)
//! - `resolver` - the injected `ResolveTransform` capability
//! - `registry` / `engine` - entity lookup and the reference resolver
//! - `formats` - TOML/JSON definition documents
//!
//! ## Architectural Constraints
//!
//! - The reducer depends on `ResolveTransform`, never on the engine
//! - No I/O: documents arrive as strings
//! - No shared mutable state: configurations are immutable, accumulators
//!   are per call
//!
//! ## Example
//!
//! ```
//! use hashpoint_core::{formats::registry_from_toml, Engine, EntityId, ResolveOptions};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), hashpoint_core::HashpointError> {
//! let registry = registry_from_toml(r#"
//! [entities."hash:user"]
//! mapKeys = { name = "fullName" }
//! omitKeys = ["password"]
//! "#)?;
//! let engine = Engine::new(registry);
//!
//! let acc = engine
//!     .resolve(
//!         &EntityId::new("hash:user"),
//!         json!({ "name": "Ada", "password": "x" }),
//!         ResolveOptions::default(),
//!     )
//!     .await?;
//! assert_eq!(acc.value, json!({ "fullName": "Ada" }));
//! # Ok(())
//! # }
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod engine;
pub mod entity;
pub mod formats;
pub mod primitives;
pub mod reducer;
pub mod registry;
pub mod resolver;
pub mod transform;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    Accumulator, EntityId, HashpointError, ResolveOptions, ValidationError, json_type_name,
};

// =============================================================================
// RE-EXPORTS: Resolution
// =============================================================================

pub use engine::Engine;
pub use entity::{Entity, ExprMapping, HashConfig, KeyMapping};
pub use reducer::HashReducer;
pub use registry::EntityRegistry;
pub use resolver::ResolveTransform;
pub use transform::{PathExpr, TransformExpr};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{
    DefinitionDocument, DefinitionFormat, registry_from_json, registry_from_str,
    registry_from_toml, registry_to_json,
};
