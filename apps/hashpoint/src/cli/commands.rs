//! # CLI Command Implementations

use crate::api;
use hashpoint_core::{
    Engine, EntityId, EntityRegistry, HashConfig, HashpointError, ResolveOptions,
    formats::{DefinitionFormat, registry_from_str},
};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a definitions file (10 MB).
const MAX_DEFINITIONS_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum size of a resolve input, from a file or stdin (100 MB).
const MAX_INPUT_SIZE: u64 = 100 * 1024 * 1024;

/// Output flags shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json_mode: bool,
    pub verbose: bool,
}

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HashpointError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HashpointError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(HashpointError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize `path` and require it to be a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, HashpointError> {
    let canonical = path.canonicalize().map_err(|e| {
        HashpointError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(HashpointError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate, size-check and read a UTF-8 file.
fn read_file(path: &Path, max_size: u64) -> Result<String, HashpointError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read_to_string(&validated)
        .map_err(|e| HashpointError::IoError(format!("Read '{}': {}", path.display(), e)))
}

fn read_stdin(max_size: u64) -> Result<String, HashpointError> {
    let mut buffer = String::new();
    std::io::stdin()
        .lock()
        .take(max_size.saturating_add(1))
        .read_to_string(&mut buffer)
        .map_err(|e| HashpointError::IoError(format!("Read stdin: {}", e)))?;

    if buffer.len() as u64 > max_size {
        return Err(HashpointError::IoError(format!(
            "Input exceeds maximum allowed {} bytes",
            max_size
        )));
    }
    Ok(buffer)
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Resolve a JSON input through an entity and print the result.
pub async fn cmd_resolve(
    definitions: &Path,
    options: OutputOptions,
    entity: &str,
    input: Option<&Path>,
    locals: Option<&str>,
) -> Result<(), HashpointError> {
    let engine = load_engine(definitions)?;

    let raw = match input {
        Some(path) => read_file(path, MAX_INPUT_SIZE)?,
        None => read_stdin(MAX_INPUT_SIZE)?,
    };
    let value = parse_json(&raw, "input")?;
    let locals = locals.map(|l| parse_json(l, "locals")).transpose()?;

    if options.verbose {
        tracing::info!(entity, "resolving input");
    }

    let resolved = resolve_value(&engine, entity, value, locals).await?;

    if options.json_mode {
        let output = serde_json::json!({
            "success": true,
            "entity": entity,
            "value": resolved,
        });
        println!("{}", output);
    } else {
        println!("{}", to_pretty(&resolved)?);
    }
    Ok(())
}

/// Resolve `value` through `entity` with optional caller locals.
pub async fn resolve_value(
    engine: &Engine,
    entity: &str,
    value: Value,
    locals: Option<Value>,
) -> Result<Value, HashpointError> {
    let options = locals.map(ResolveOptions::with_locals).unwrap_or_default();
    engine
        .resolve(&EntityId::new(entity), value, options)
        .await
        .map(|acc| acc.value)
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Parse the definitions and validate every entity reference.
pub fn cmd_check(definitions: &Path, options: OutputOptions) -> Result<(), HashpointError> {
    let registry = load_registry(definitions)?;
    registry.validate_references()?;

    if options.json_mode {
        let output = serde_json::json!({
            "definitions": definitions.to_string_lossy(),
            "valid": true,
            "count": registry.len(),
        });
        println!("{}", output);
        return Ok(());
    }

    println!(
        "OK: {} entities in {}",
        registry.len(),
        definitions.display()
    );
    Ok(())
}

// =============================================================================
// LIST COMMAND
// =============================================================================

/// List every entity id, with its configured operations in verbose mode.
pub fn cmd_list(definitions: &Path, options: OutputOptions) -> Result<(), HashpointError> {
    let registry = load_registry(definitions)?;

    if options.json_mode {
        let ids: Vec<&str> = registry.ids().map(EntityId::as_str).collect();
        let count = ids.len();
        let output = serde_json::json!({ "entities": ids, "count": count });
        println!("{}", output);
        return Ok(());
    }

    for entity in registry.entities() {
        if options.verbose {
            println!(
                "{}  [{}]",
                entity.id,
                configured_operations(&entity.config).join(", ")
            );
        } else {
            println!("{}", entity.id);
        }
    }
    Ok(())
}

/// Names of the operations a configuration actually sets.
pub fn configured_operations(config: &HashConfig) -> Vec<&'static str> {
    [
        ("value", config.value.is_some()),
        ("mapKeys", config.map_keys.as_ref().is_some_and(|m| !m.is_empty())),
        ("addKeys", config.add_keys.as_ref().is_some_and(|m| !m.is_empty())),
        ("omitKeys", config.omit_keys.as_ref().is_some_and(|k| !k.is_empty())),
        ("pickKeys", config.pick_keys.as_ref().is_some_and(|k| !k.is_empty())),
        ("addValues", config.add_values.as_ref().is_some_and(|m| !m.is_empty())),
        ("compose", config.compose.as_ref().is_some_and(|s| !s.is_empty())),
    ]
    .into_iter()
    .filter_map(|(name, set)| set.then_some(name))
    .collect()
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Print one entity's configuration as JSON.
pub fn cmd_show(definitions: &Path, entity: &str) -> Result<(), HashpointError> {
    let registry = load_registry(definitions)?;
    let id = EntityId::new(entity);
    let found = registry
        .get(&id)
        .ok_or(HashpointError::EntityNotFound(id))?;

    let config = serde_json::to_value(&found.config)
        .map_err(|e| HashpointError::SerializationError(e.to_string()))?;
    println!("{}", to_pretty(&config)?);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(definitions: &Path, host: &str, port: u16) -> Result<(), HashpointError> {
    let registry = load_registry(definitions)?;
    registry.validate_references()?;
    let count = registry.len();
    let engine = Engine::new(registry);

    println!("hashpoint server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:        {}", host);
    println!("  Port:        {}", port);
    println!("  Definitions: {} ({} entities)", definitions.display(), count);
    println!();
    println!("Endpoints:");
    println!("  POST /resolve  - Resolve a value through an entity");
    println!("  GET  /entities - List entity ids");
    println!("  GET  /health   - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, engine).await
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Read a definitions file, choosing TOML or JSON from its extension.
pub fn load_registry(path: &Path) -> Result<EntityRegistry, HashpointError> {
    let text = read_file(path, MAX_DEFINITIONS_FILE_SIZE)?;
    let registry = registry_from_str(&text, DefinitionFormat::from_path(path))?;
    tracing::debug!(
        definitions = %path.display(),
        entities = registry.len(),
        "loaded entity definitions"
    );
    Ok(registry)
}

/// Load definitions into an engine.
pub fn load_engine(path: &Path) -> Result<Engine, HashpointError> {
    load_registry(path).map(Engine::new)
}

fn parse_json(text: &str, what: &str) -> Result<Value, HashpointError> {
    serde_json::from_str(text)
        .map_err(|e| HashpointError::SerializationError(format!("Invalid {} JSON: {}", what, e)))
}

fn to_pretty(value: &Value) -> Result<String, HashpointError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| HashpointError::SerializationError(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const DEFINITIONS: &str = r#"
[entities."hash:user"]
mapKeys = { name = "fullName" }
omitKeys = ["password"]

[entities."hash:user".addValues]
tenant = { constant = "acme" }
"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_toml_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "hashpoint.toml", DEFINITIONS);

        let registry = load_registry(&path).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&EntityId::new("hash:user")));
    }

    #[test]
    fn loads_json_definitions_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "defs.json",
            r#"{ "entities": { "hash:a": { "pickKeys": ["x"] } } }"#,
        );

        let registry = load_registry(&path).unwrap();
        assert!(registry.contains(&EntityId::new("hash:a")));
    }

    #[test]
    fn missing_definitions_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_registry(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, HashpointError::IoError(_)));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_file_path(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "big.json", "0123456789");

        assert!(validate_file_size(&path, 10).is_ok());
        let err = validate_file_size(&path, 9).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn invalid_locals_are_serialization_errors() {
        let err = parse_json("{ nope", "locals").unwrap_err();
        assert!(matches!(err, HashpointError::SerializationError(ref m) if m.contains("locals")));
    }

    #[test]
    fn configured_operations_skip_empty_entries() {
        let config: HashConfig = serde_json::from_value(json!({
            "mapKeys": {},
            "omitKeys": ["a"],
            "compose": ["hash:x"]
        }))
        .unwrap();
        assert_eq!(configured_operations(&config), vec!["omitKeys", "compose"]);
    }

    #[tokio::test]
    async fn resolve_value_through_loaded_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "hashpoint.toml", DEFINITIONS);
        let engine = load_engine(&path).unwrap();

        let out = resolve_value(
            &engine,
            "hash:user",
            json!({ "name": "Ada", "password": "x" }),
            Some(json!({ "request": 1 })),
        )
        .await
        .unwrap();
        assert_eq!(out, json!({ "fullName": "Ada", "tenant": "acme" }));
    }

    #[tokio::test]
    async fn resolve_value_reports_unknown_entity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "hashpoint.toml", DEFINITIONS);
        let engine = load_engine(&path).unwrap();

        let err = resolve_value(&engine, "hash:ghost", json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, HashpointError::EntityNotFound(_)));
    }
}
