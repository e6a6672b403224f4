use std::collections::HashMap;
use std::fs::{File, Metadata};
use std::io::Read;
use std::path::Path;

use framelink_protocol::{message_kind, MessageKind, OutboundMessage, RenderEvent};
use jsonschema::Validator;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::validator::validate_value;

const SCHEMA_SUFFIX: &str = ".schema.json";

// Keywords whose values hold subschemas, grouped by how they nest them.
const SUBSCHEMA_MAPS: [&str; 5] = [
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];
const SUBSCHEMA_VALUES: [&str; 15] = [
    "propertyNames",
    "additionalProperties",
    "unevaluatedProperties",
    "items",
    "contains",
    "additionalItems",
    "unevaluatedItems",
    "not",
    "if",
    "then",
    "else",
    "prefixItems",
    "allOf",
    "anyOf",
    "oneOf",
];
const OBJECT_KEYWORDS: [&str; 8] = [
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
    "required",
    "dependentRequired",
    "dependentSchemas",
    "propertyNames",
];

/// Message-type keyed registry of compiled JSON Schema validators.
///
/// A schema describes the payload of its message type, not the whole record:
/// the `args` object of a render message, the `value` of a component value,
/// and the full record for the ready and frame-height notifications.
pub struct SchemaRegistry {
    validators: HashMap<MessageKind, Validator>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            validators: HashMap::new(),
            config,
        }
    }

    /// Register a schema for a wire message type from a JSON string.
    pub fn register(&mut self, message_type: &str, schema_json: &str) -> Result<()> {
        let kind = message_kind(message_type)
            .ok_or_else(|| SchemaError::UnknownMessageType(message_type.to_string()))?;
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_value(kind, &schema)
    }

    /// Register a schema for a message kind from a JSON value.
    pub fn register_value(&mut self, kind: MessageKind, schema: &Value) -> Result<()> {
        let mut schema_to_compile = schema.clone();
        if self.config.strict_mode {
            close_object_schemas(&mut schema_to_compile);
        }

        let compiled = jsonschema::validator_for(&schema_to_compile)
            .map_err(|err| SchemaError::CompileFailed(err.to_string()))?;

        self.validators.insert(kind, compiled);
        Ok(())
    }

    /// Load schemas from a directory.
    ///
    /// Files are named after the message they describe: `render.schema.json`,
    /// `componentReady.schema.json`, `setFrameHeight.schema.json` and
    /// `setComponentValue.schema.json` (case-insensitive). Other `.schema.json`
    /// files and symlinked schemas are rejected; unrelated files are skipped.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load schemas from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut loaded = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.to_ascii_lowercase().ends_with(SCHEMA_SUFFIX) {
                continue;
            }

            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();
            if file_type.is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !file_type.is_file() {
                continue;
            }

            let kind = kind_from_file_name(&file_name).ok_or_else(|| {
                SchemaError::LoadFailed(format!("unrecognized schema filename: {file_name}"))
            })?;

            loaded = loaded.saturating_add(1);
            if loaded > registry.config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({}): {loaded}",
                    registry.config.max_schemas_from_directory
                )));
            }

            let content = read_limited(
                &entry_path,
                &path_metadata,
                registry.config.max_schema_file_size,
            )?;
            let schema: Value = serde_json::from_str(&content)?;
            registry.register_value(kind, &schema)?;
            debug!(schema = %file_name, message_type = %kind, "schema loaded");
        }

        Ok(registry)
    }

    /// Load from embedded schema strings.
    pub fn from_embedded(schemas: &[(MessageKind, &str)]) -> Result<Self> {
        let mut registry = Self::new();
        for (kind, schema) in schemas {
            let schema: Value = serde_json::from_str(schema)?;
            registry.register_value(*kind, &schema)?;
        }
        Ok(registry)
    }

    /// Validate a payload against the schema registered for `kind`.
    pub fn validate(&self, kind: MessageKind, payload: &Value) -> Result<()> {
        match self.validators.get(&kind) {
            Some(validator) => validate_value(kind.as_str(), payload, validator),
            None if self.config.fail_on_missing_schema => {
                Err(SchemaError::NoSchema(kind.as_str().to_string()))
            }
            None => Ok(()),
        }
    }

    /// Validate a payload given as JSON text.
    pub fn validate_json(&self, kind: MessageKind, payload: &str) -> Result<()> {
        let value: Value = serde_json::from_str(payload)?;
        self.validate(kind, &value)
    }

    /// Validate the render arguments carried by a render event.
    pub fn validate_render(&self, event: &RenderEvent) -> Result<()> {
        self.validate(
            MessageKind::Render,
            validation_target(MessageKind::Render, &event.detail),
        )
    }

    /// Validate the payload of an outbound message.
    pub fn validate_outbound(&self, message: &OutboundMessage) -> Result<()> {
        match message {
            OutboundMessage::SetComponentValue { value } => {
                self.validate(MessageKind::SetComponentValue, value)
            }
            other => {
                let record = serde_json::to_value(other)?;
                self.validate(other.kind(), &record)
            }
        }
    }

    /// Check if a message kind has a registered schema.
    pub fn has_schema(&self, kind: MessageKind) -> bool {
        self.validators.contains_key(&kind)
    }

    /// Message kinds that have registered schemas, in wire-name order.
    pub fn message_kinds(&self) -> Vec<MessageKind> {
        let mut kinds: Vec<MessageKind> = self.validators.keys().copied().collect();
        kinds.sort_unstable_by_key(|kind| kind.as_str());
        kinds
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The part of a wire record a schema for `kind` describes.
///
/// Missing payload fields validate as `null`.
pub fn validation_target(kind: MessageKind, record: &Value) -> &Value {
    match kind {
        MessageKind::Render => record.get("args").unwrap_or(&Value::Null),
        MessageKind::SetComponentValue => record.get("value").unwrap_or(&Value::Null),
        MessageKind::ComponentReady | MessageKind::SetFrameHeight => record,
    }
}

fn kind_from_file_name(file_name: &str) -> Option<MessageKind> {
    let lower = file_name.to_ascii_lowercase();
    let stem = lower.strip_suffix(SCHEMA_SUFFIX)?;
    match stem {
        "render" => Some(MessageKind::Render),
        "componentready" => Some(MessageKind::ComponentReady),
        "setframeheight" => Some(MessageKind::SetFrameHeight),
        "setcomponentvalue" => Some(MessageKind::SetComponentValue),
        _ => None,
    }
}

/// Read a schema file, refusing it if the path was swapped after `path_metadata`
/// was taken.
fn read_limited(path: &Path, path_metadata: &Metadata, max_bytes: usize) -> Result<String> {
    let file = File::open(path).map_err(|err| {
        SchemaError::LoadFailed(format!("failed opening schema {}: {err}", path.display()))
    })?;
    let opened_metadata = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

    #[cfg(unix)]
    {
        if !same_file_identity(path_metadata, &opened_metadata) {
            return Err(SchemaError::LoadFailed(format!(
                "schema file changed during load: {}",
                path.display()
            )));
        }
    }
    #[cfg(not(unix))]
    let _ = path_metadata;

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading schema {}: {err}", path.display()))
        })?;

    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large (max {max_bytes} bytes): {}",
            path.display()
        )));
    }
    Ok(content)
}

#[cfg(unix)]
fn same_file_identity(path_metadata: &Metadata, opened_metadata: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}

/// Strict mode: every object schema without an explicit
/// `additionalProperties` gets `additionalProperties: false`.
fn close_object_schemas(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            if declares_object(map) && !map.contains_key("additionalProperties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }

            for (keyword, child) in map.iter_mut() {
                if SUBSCHEMA_MAPS.contains(&keyword.as_str()) {
                    if let Value::Object(children) = child {
                        children.values_mut().for_each(close_object_schemas);
                    }
                } else if SUBSCHEMA_VALUES.contains(&keyword.as_str()) {
                    close_object_schemas(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(close_object_schemas),
        _ => {}
    }
}

fn declares_object(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(kinds)) => kinds
            .iter()
            .any(|kind| matches!(kind, Value::String(kind) if kind == "object")),
        _ => OBJECT_KEYWORDS
            .iter()
            .any(|keyword| map.contains_key(*keyword)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;

    const ARGS_SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "html": { "type": "string" },
            "content_height": { "type": "integer" }
        },
        "required": ["html"]
    }"#;

    #[test]
    fn register_and_validate_render_args() {
        let mut registry = SchemaRegistry::new();
        registry.register("streamlit:render", ARGS_SCHEMA).unwrap();

        let ok = RenderEvent::new(json!({
            "type": "streamlit:render",
            "args": {"html": "<p/>", "content_height": 1200}
        }));
        let bad = RenderEvent::new(json!({
            "type": "streamlit:render",
            "args": {"content_height": "tall"}
        }));

        assert!(registry.validate_render(&ok).is_ok());
        assert!(matches!(
            registry.validate_render(&bad),
            Err(SchemaError::ValidationFailed { message_type, .. })
                if message_type == "streamlit:render"
        ));
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.register("streamlit:componentReady", ARGS_SCHEMA),
            Err(SchemaError::UnknownMessageType(_))
        ));
    }

    #[test]
    fn outbound_payloads_validate_by_kind() {
        let registry = SchemaRegistry::from_embedded(&[
            (
                MessageKind::SetComponentValue,
                r#"{"type":"object","required":["request_id","action"]}"#,
            ),
            (
                MessageKind::SetFrameHeight,
                r#"{"type":"object","properties":{"height":{"maximum":4000}}}"#,
            ),
        ])
        .unwrap();

        let value =
            OutboundMessage::component_value(json!({"request_id": "1", "action": "send_email"}));
        assert!(registry.validate_outbound(&value).is_ok());
        let value = OutboundMessage::component_value(json!({"action": "send_email"}));
        assert!(registry.validate_outbound(&value).is_err());

        assert!(registry.validate_outbound(&OutboundMessage::frame_height(1200)).is_ok());
        assert!(registry.validate_outbound(&OutboundMessage::frame_height(9000)).is_err());
        assert!(registry.validate_outbound(&OutboundMessage::ready()).is_ok());
    }

    #[test]
    fn missing_schema_permissive_passes() {
        let registry = SchemaRegistry::new();
        assert!(registry.validate(MessageKind::Render, &json!({"any": "thing"})).is_ok());
    }

    #[test]
    fn missing_schema_strict_fails() {
        let registry = SchemaRegistry::with_config(RegistryConfig {
            fail_on_missing_schema: true,
            ..RegistryConfig::default()
        });

        assert!(matches!(
            registry.validate(MessageKind::Render, &json!({})),
            Err(SchemaError::NoSchema(name)) if name == "streamlit:render"
        ));
    }

    #[test]
    fn strict_mode_rejects_additional_properties() {
        let mut permissive = SchemaRegistry::new();
        permissive.register("streamlit:render", ARGS_SCHEMA).unwrap();

        let mut strict = SchemaRegistry::with_config(RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        });
        strict.register("streamlit:render", ARGS_SCHEMA).unwrap();

        let payload = json!({"html": "<p/>", "extra": true});
        assert!(permissive.validate(MessageKind::Render, &payload).is_ok());
        assert!(matches!(
            strict.validate(MessageKind::Render, &payload),
            Err(SchemaError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn strict_mode_reaches_nested_and_keyword_only_objects() {
        let schema = json!({
            "properties": {
                "plan1": {
                    "type": "object",
                    "properties": { "rows": { "type": "array" } }
                }
            }
        });
        let mut strict = SchemaRegistry::with_config(RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        });
        strict
            .register_value(MessageKind::SetComponentValue, &schema)
            .unwrap();

        assert!(strict
            .validate(MessageKind::SetComponentValue, &json!({"plan1": {"rows": []}}))
            .is_ok());
        assert!(strict
            .validate(MessageKind::SetComponentValue, &json!({"plan2": {}}))
            .is_err());
        assert!(strict
            .validate(
                MessageKind::SetComponentValue,
                &json!({"plan1": {"rows": [], "discount": 0.1}})
            )
            .is_err());
    }

    #[test]
    fn invalid_json_text_fails() {
        let mut registry = SchemaRegistry::new();
        registry.register("streamlit:render", ARGS_SCHEMA).unwrap();
        assert!(matches!(
            registry.validate_json(MessageKind::Render, "not-json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn invalid_schema_fails_compile() {
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.register("setComponentValue", r#"{"type":"definitely-not-a-type"}"#),
            Err(SchemaError::CompileFailed(_))
        ));
    }

    #[test]
    fn validation_target_picks_payload_field() {
        let render = json!({"type": "streamlit:render", "args": {"x": 1}});
        assert_eq!(validation_target(MessageKind::Render, &render), &json!({"x": 1}));
        assert_eq!(
            validation_target(MessageKind::SetComponentValue, &render),
            &Value::Null
        );
        assert_eq!(validation_target(MessageKind::SetFrameHeight, &render), &render);
    }

    #[test]
    fn from_directory_loads_named_schemas() {
        let dir = make_temp_schema_dir("from-directory");
        write_schema(&dir, "render.schema.json", ARGS_SCHEMA);
        write_schema(&dir, "setComponentValue.schema.json", r#"{"type":"integer"}"#);
        write_schema(&dir, "notes.txt", "not a schema");

        let registry = SchemaRegistry::from_directory(&dir).unwrap();
        assert_eq!(
            registry.message_kinds(),
            vec![MessageKind::SetComponentValue, MessageKind::Render]
        );
        assert!(registry.validate(MessageKind::SetComponentValue, &json!(3)).is_ok());
        assert!(registry.validate(MessageKind::SetComponentValue, &json!("3")).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_directory_rejects_unknown_schema_names() {
        let dir = make_temp_schema_dir("unknown-name");
        write_schema(&dir, "command.schema.json", ARGS_SCHEMA);
        assert!(matches!(
            SchemaRegistry::from_directory(&dir),
            Err(SchemaError::LoadFailed(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_directory_enforces_limits() {
        let dir = make_temp_schema_dir("limits");
        write_schema(&dir, "render.schema.json", ARGS_SCHEMA);
        write_schema(&dir, "setFrameHeight.schema.json", r#"{"type":"object"}"#);

        let count_limited = RegistryConfig {
            max_schemas_from_directory: 1,
            ..RegistryConfig::default()
        };
        assert!(matches!(
            SchemaRegistry::from_directory_with_config(&dir, count_limited),
            Err(SchemaError::LoadFailed(_))
        ));

        let size_limited = RegistryConfig {
            max_schema_file_size: 8,
            ..RegistryConfig::default()
        };
        assert!(matches!(
            SchemaRegistry::from_directory_with_config(&dir, size_limited),
            Err(SchemaError::LoadFailed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_schema_is_rejected() {
        let dir = make_temp_schema_dir("symlink-schema");
        let target = dir.join("target.json");
        std::fs::write(&target, ARGS_SCHEMA.as_bytes()).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("render.schema.json")).unwrap();

        assert!(matches!(
            SchemaRegistry::from_directory(&dir),
            Err(SchemaError::LoadFailed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn replaced_schema_file_is_rejected() {
        let dir = make_temp_schema_dir("replaced-schema");
        let first = dir.join("render.schema.json");
        let second = dir.join("other.json");
        write_schema(&dir, "render.schema.json", ARGS_SCHEMA);
        write_schema(&dir, "other.json", ARGS_SCHEMA);

        let first_meta = std::fs::symlink_metadata(&first).unwrap();
        assert!(read_limited(&first, &first_meta, 4096).is_ok());
        assert!(matches!(
            read_limited(&second, &first_meta, 4096),
            Err(SchemaError::LoadFailed(message)) if message.contains("changed during load")
        ));

        let opened_second = File::open(&second).unwrap().metadata().unwrap();
        assert!(!same_file_identity(&first_meta, &opened_second));

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn make_temp_schema_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "framelink-schema-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_schema(dir: &Path, file_name: &str, contents: &str) {
        std::fs::write(dir.join(file_name), contents.as_bytes()).unwrap();
    }
}
