//! # Model Lifecycle
//!
//! A [`ModelDefinition`] is the static configuration of a model type: its `name`, how its
//! base path is derived, its computed properties, any extra root-level fields, and its
//! [`Schema`]. Definitions are built once and shared as `Arc<ModelDefinition>`; every
//! [`Model`] instance points back at its definition.
//!
//! ## Identity
//!
//! A model with no `id` (absent, `null`, `""` or `0`) is **new**; anything else is
//! **persisted**. The transition happens implicitly when a server response carrying an
//! `id` is merged (see [`crate::crud`]).
//!
//! ## Derived endpoints
//!
//! | Property   | Value                                                              |
//! |------------|--------------------------------------------------------------------|
//! | `basePath` | computed override, else literal `base_path`, else `name` + `"s"`    |
//! | `urlRoot`  | `basePath/id`, only when an id exists                              |
//! | `url`      | `basePath` while new, `urlRoot` once persisted                     |
//! | `isNew`    | no usable `id`                                                     |
//!
//! Computed properties are plain functions of the model and are evaluated on every read, so
//! they always reflect current state.

use crate::adapter::{Adapted, TypeAdapter};
use crate::config::{ModelConfig, ModelOptions};
use crate::error::ModelError;
use crate::schema::Schema;
use crate::state::{
    assign_field, build_field, build_initial_state, warn_on_unknown_root_key, ApprovedKeys, FieldValue, State,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A derived property evaluated against the current model state.
pub type Computed = Arc<dyn Fn(&Model) -> Value + Send + Sync>;

/// A derived base path.
pub type ComputedPath = Arc<dyn Fn(&Model) -> String + Send + Sync>;

/// Names of the computed properties every model exposes.
pub const BUILTIN_COMPUTED: [&str; 4] = ["basePath", "urlRoot", "url", "isNew"];

/// Naive pluralisation used for default base paths: `user` -> `users`.
pub fn pluralize(name: &str) -> String {
    format!("{name}s")
}

/// Static configuration of a model type.
pub struct ModelDefinition {
    name: String,
    base_path: Option<String>,
    computed_base_path: Option<ComputedPath>,
    computed: BTreeMap<String, Computed>,
    extras: Map<String, Value>,
    schema: Schema,
}

impl ModelDefinition {
    pub fn builder(name: impl Into<String>, schema: Schema) -> ModelDefinitionBuilder {
        ModelDefinitionBuilder {
            definition: ModelDefinition {
                name: name.into(),
                base_path: None,
                computed_base_path: None,
                computed: BTreeMap::new(),
                extras: Map::new(),
                schema,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn extras(&self) -> &Map<String, Value> {
        &self.extras
    }

    pub fn computed_names(&self) -> impl Iterator<Item = &str> {
        self.computed.keys().map(String::as_str)
    }
}

impl fmt::Debug for ModelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDefinition")
            .field("name", &self.name)
            .field("base_path", &self.base_path)
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .field("extras", &self.extras)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Builder for [`ModelDefinition`].
pub struct ModelDefinitionBuilder {
    definition: ModelDefinition,
}

impl ModelDefinitionBuilder {
    /// Literal base path, e.g. `"people"` for a `person` model.
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.definition.base_path = Some(path.into());
        self
    }

    /// Base path derived from state; takes precedence over the literal one.
    pub fn computed_base_path(
        mut self,
        f: impl Fn(&Model) -> String + Send + Sync + 'static,
    ) -> Self {
        self.definition.computed_base_path = Some(Arc::new(f));
        self
    }

    pub fn computed(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Model) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.definition.computed.insert(name.into(), Arc::new(f));
        self
    }

    /// A root-level field outside the schema, set on every new instance.
    pub fn root_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.definition.extras.insert(name.into(), value);
        self
    }

    /// Resolves key collisions (the schema wins) and freezes the definition.
    pub fn build(mut self) -> Arc<ModelDefinition> {
        let definition = &mut self.definition;
        let schema = &definition.schema;
        let model = definition.name.as_str();

        definition.extras.retain(|key, _| {
            let collides = schema.contains(key);
            if collides {
                warn!(model, key = key.as_str(), "Root field shadows a schema field; the schema wins");
            }
            !collides
        });
        definition.computed.retain(|key, _| {
            let collides = schema.contains(key) || BUILTIN_COMPUTED.contains(&key.as_str());
            if collides {
                warn!(model, key = key.as_str(), "Computed property shadows a schema field or built-in; dropped");
            }
            !collides
        });

        Arc::new(self.definition)
    }
}

/// A model instance: schema-governed state plus derived endpoint properties.
#[derive(Clone)]
pub struct Model {
    definition: Arc<ModelDefinition>,
    state: State,
    approved: ApprovedKeys,
    extras: Map<String, Value>,
    persist: bool,
    config: ModelConfig,
}

impl Model {
    /// Builds a model from `data` with the default configuration.
    pub fn new(
        definition: &Arc<ModelDefinition>,
        data: Value,
        options: ModelOptions,
    ) -> Result<Self, ModelError> {
        Self::with_config(definition, data, options, ModelConfig::default())
    }

    /// Builds a model from `data`, consulting `config` for schema warnings.
    pub fn with_config(
        definition: &Arc<ModelDefinition>,
        data: Value,
        options: ModelOptions,
        config: ModelConfig,
    ) -> Result<Self, ModelError> {
        let (state, approved) = build_initial_state(definition.schema(), &data)?;
        let mut model = Self {
            definition: Arc::clone(definition),
            state,
            approved,
            extras: Map::new(),
            persist: options.persist,
            config,
        };

        for (key, value) in definition.extras() {
            model.set_extra(key, value.clone());
        }
        if let Value::Object(supplied) = data {
            for (key, value) in supplied {
                if !model.approved.contains(&key) {
                    model.set_extra(&key, value);
                }
            }
        }

        debug!(model = %model.name(), persist = model.persist, "Model constructed");
        Ok(model)
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &Arc<ModelDefinition> {
        &self.definition
    }

    pub fn config(&self) -> ModelConfig {
        self.config
    }

    /// Whether the owning scope should leave this model's data alone on teardown.
    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn approved_keys(&self) -> &ApprovedKeys {
        &self.approved
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Root-level values outside the schema.
    pub fn extras(&self) -> &Map<String, Value> {
        &self.extras
    }

    /// Reads a schema field, a computed property or an extra, in that order.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(field) = self.state.get(key) {
            return Some(field.to_json());
        }
        self.computed(key).or_else(|| self.extras.get(key).cloned())
    }

    /// String convenience over [`Model::get`].
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Raw field value at a dotted path (`address.city`).
    pub fn field(&self, path: &str) -> Option<&FieldValue> {
        self.state.get_path(path)
    }

    /// Typed access to an adapter field's internal value.
    pub fn adapter<A: TypeAdapter>(&self, path: &str) -> Option<&A::Value> {
        self.field(path)?
            .as_adapter()?
            .as_any()
            .downcast_ref::<Adapted<A>>()?
            .get()
    }

    /// Evaluates a built-in or user-defined computed property.
    pub fn computed(&self, name: &str) -> Option<Value> {
        match name {
            "basePath" => Some(json!(self.base_path())),
            "urlRoot" => Some(self.url_root().map_or(Value::Null, Value::String)),
            "url" => Some(json!(self.url())),
            "isNew" => Some(json!(self.is_new())),
            _ => self.definition.computed.get(name).map(|f| f(self)),
        }
    }

    /// Writes a root-level key.
    ///
    /// Schema fields go through their coercion rule; a rejected value leaves the field as it
    /// was. Computed property names are ignored. Other keys are stored as non-reactive extras
    /// after the unknown-key warning.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ModelError> {
        let definition = Arc::clone(&self.definition);
        match definition.schema().get(key) {
            Some(node) => match self.state.get_mut(key) {
                Some(slot) => assign_field(slot, key, node, &value),
                None => {
                    let field = build_field(key, node, Some(&value))?;
                    self.state.insert(key, field);
                    Ok(())
                }
            },
            None if self.is_computed(key) => {
                debug!(model = %self.name(), key, "Ignoring write to a computed property");
                Ok(())
            }
            None => {
                self.set_extra(key, value);
                Ok(())
            }
        }
    }

    /// Whether `key` names a built-in or user-defined computed property.
    pub fn is_computed(&self, key: &str) -> bool {
        BUILTIN_COMPUTED.contains(&key) || self.definition.computed.contains_key(key)
    }

    fn set_extra(&mut self, key: &str, value: Value) {
        warn_on_unknown_root_key(self.name(), key, &self.config);
        self.extras.insert(key.to_string(), value);
    }

    /// The model's id as a path segment, if it has a usable one.
    pub fn id(&self) -> Option<String> {
        let raw = match self.state.get("id") {
            Some(field) => field.to_json(),
            None => self.extras.get("id").cloned().unwrap_or(Value::Null),
        };
        match raw {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    pub fn base_path(&self) -> String {
        if let Some(f) = &self.definition.computed_base_path {
            return f(self);
        }
        self.definition
            .base_path
            .clone()
            .unwrap_or_else(|| pluralize(self.name()))
    }

    /// `basePath/id`; `None` while the model is new.
    pub fn url_root(&self) -> Option<String> {
        self.id().map(|id| format!("{}/{}", self.base_path(), id))
    }

    /// The endpoint CRUD operations target by default.
    pub fn url(&self) -> String {
        match self.url_root() {
            Some(url_root) => url_root,
            None => self.base_path(),
        }
    }

    /// Rebuilds every schema field from its defaults. Extras and the instance survive.
    pub fn reset(&mut self) -> Result<(), ModelError> {
        let (state, _) = build_initial_state(self.definition.schema(), &Value::Null)?;
        self.state = state;
        debug!(model = %self.name(), "Model reset");
        Ok(())
    }

    /// Serialized output: approved keys, user computed properties and the built-ins.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for key in &self.approved {
            if let Some(field) = self.state.get(key) {
                out.insert(key.clone(), field.to_json());
            }
        }
        for (name, f) in &self.definition.computed {
            out.insert(name.clone(), f(self));
        }
        for name in BUILTIN_COMPUTED {
            if let Some(value) = self.computed(name) {
                out.insert(name.to_string(), value);
            }
        }
        Value::Object(out)
    }

    /// Applies a server body field by field through the coercion rules.
    ///
    /// All schema fields are staged first, so a rejected value leaves the model untouched.
    /// Computed properties echoed back by the server are skipped. Non-object bodies are
    /// ignored.
    pub fn merge(&mut self, body: &Value) -> Result<(), ModelError> {
        let Some(fields) = body.as_object() else {
            debug!(model = %self.name(), "Ignoring non-object response body");
            return Ok(());
        };

        let definition = Arc::clone(&self.definition);
        let mut staged = self.state.clone();
        let mut unknown = Vec::new();
        let mut echoed = 0;
        for (key, value) in fields {
            match (definition.schema().get(key), staged.get_mut(key)) {
                (Some(node), Some(slot)) => assign_field(slot, key, node, value)?,
                _ if self.is_computed(key) => echoed += 1,
                _ => unknown.push((key, value)),
            }
        }
        if echoed > 0 {
            debug!(model = %self.name(), echoed, "Skipped computed properties in body");
        }

        self.state = staged;
        for (key, value) in unknown {
            self.set_extra(key, value.clone());
        }
        Ok(())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field("state", &self.state)
            .field("extras", &self.extras)
            .field("persist", &self.persist)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::capture_warnings;
    use crate::schema::SchemaNode;

    fn person() -> Arc<ModelDefinition> {
        ModelDefinition::builder(
            "user",
            Schema::new()
                .field("id", SchemaNode::string())
                .field("first_name", SchemaNode::string())
                .field("last_name", SchemaNode::string())
                .field("age", SchemaNode::number().with_default(json!(18))),
        )
        .computed("full_name", |m| {
            json!(format!(
                "{} {}",
                m.get_str("first_name").unwrap_or_default(),
                m.get_str("last_name").unwrap_or_default()
            ))
        })
        .build()
    }

    #[test]
    fn computed_full_name() {
        let model = Model::new(
            &person(),
            json!({"first_name": "Jane", "last_name": "Doe"}),
            ModelOptions::default(),
        )
        .unwrap();
        assert_eq!(model.get("full_name"), Some(json!("Jane Doe")));
    }

    #[test]
    fn default_applies_when_not_supplied() {
        let model = Model::new(&person(), json!({}), ModelOptions::default()).unwrap();
        assert_eq!(model.get("age"), Some(json!(18)));
    }

    #[test]
    fn identity_drives_urls() {
        let mut model = Model::new(&person(), json!({}), ModelOptions::default()).unwrap();
        assert!(model.is_new());
        assert_eq!(model.base_path(), "users");
        assert_eq!(model.url(), "users");
        assert_eq!(model.url_root(), None);

        model.set("id", json!("abc")).unwrap();
        assert!(!model.is_new());
        assert_eq!(model.url_root().as_deref(), Some("users/abc"));
        assert_eq!(model.url(), "users/abc");

        model.set("id", json!("")).unwrap();
        assert!(model.is_new());
    }

    #[test]
    fn numeric_id_counts() {
        let def = ModelDefinition::builder("item", Schema::new().field("id", SchemaNode::number()))
            .build();
        let mut model = Model::new(&def, json!({}), ModelOptions::default()).unwrap();
        assert!(model.is_new());
        model.set("id", json!(7)).unwrap();
        assert_eq!(model.url(), "items/7");
    }

    #[test]
    fn literal_and_computed_base_path() {
        let literal = ModelDefinition::builder("person", Schema::new())
            .base_path("people")
            .build();
        let model = Model::new(&literal, json!({}), ModelOptions::default()).unwrap();
        assert_eq!(model.base_path(), "people");

        let derived = ModelDefinition::builder("comment", Schema::new().field("post", SchemaNode::string()))
            .base_path("ignored")
            .computed_base_path(|m| format!("posts/{}/comments", m.get_str("post").unwrap_or_default()))
            .build();
        let model = Model::new(&derived, json!({"post": "9"}), ModelOptions::default()).unwrap();
        assert_eq!(model.base_path(), "posts/9/comments");
    }

    #[test]
    fn to_json_key_set() {
        let model = Model::new(
            &person(),
            json!({"first_name": "A", "nickname": "x"}),
            ModelOptions::default(),
        )
        .unwrap();
        let json = model.to_json();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected = vec![
            "age", "basePath", "first_name", "full_name", "id", "isNew", "last_name", "url", "urlRoot",
        ];
        expected.sort();
        assert_eq!(keys, expected);
        assert_eq!(model.get("nickname"), Some(json!("x")));
        assert_eq!(json["urlRoot"], Value::Null);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut model = Model::new(
            &person(),
            json!({"first_name": "A", "age": 40}),
            ModelOptions::default(),
        )
        .unwrap();
        model.reset().unwrap();
        let once = model.to_json();
        model.reset().unwrap();
        assert_eq!(model.to_json(), once);
        assert_eq!(once["age"], 18);
        assert_eq!(once["first_name"], "");
    }

    #[test]
    fn unknown_key_warns_once_and_stores() {
        let mut model = Model::new(&person(), json!({}), ModelOptions::default()).unwrap();
        let (result, warnings) = capture_warnings(|| model.set("nickname", json!("JD")));
        result.unwrap();
        assert_eq!(warnings, 1);
        assert_eq!(model.get("nickname"), Some(json!("JD")));
        assert!(model.to_json().get("nickname").is_none());
    }

    #[test]
    fn unknown_key_silent_when_disabled() {
        let config = ModelConfig::default().with_schema_warnings(false);
        let mut model =
            Model::with_config(&person(), json!({}), ModelOptions::default(), config).unwrap();
        let (result, warnings) = capture_warnings(|| model.set("nickname", json!("JD")));
        result.unwrap();
        assert_eq!(warnings, 0);
        assert_eq!(model.get("nickname"), Some(json!("JD")));
    }

    #[test]
    fn computed_names_are_not_writable() {
        let mut model = Model::new(&person(), json!({"first_name": "A"}), ModelOptions::default()).unwrap();
        let (result, warnings) = capture_warnings(|| {
            model.set("url", json!("elsewhere"))?;
            model.set("full_name", json!("Z Z"))?;
            model.merge(&json!({"isNew": true, "urlRoot": "users/1", "basePath": "x"}))
        });
        result.unwrap();
        assert_eq!(warnings, 0);
        assert!(model.extras().is_empty());
        assert!(model.is_computed("basePath"));
        assert!(!model.is_computed("first_name"));
        assert_eq!(model.get("url"), Some(json!("users")));
        assert_eq!(model.get("full_name"), Some(json!("A ")));
    }

    #[test]
    fn schema_wins_over_root_field() {
        let (def, warnings) = capture_warnings(|| {
            ModelDefinition::builder("user", Schema::new().field("role", SchemaNode::string()))
                .root_field("role", json!("admin"))
                .root_field("theme", json!("dark"))
                .build()
        });
        assert_eq!(warnings, 1);
        assert!(def.extras().get("role").is_none());

        let model = Model::new(&def, json!({}), ModelOptions::default()).unwrap();
        assert_eq!(model.get("role"), Some(json!("")));
        assert_eq!(model.get("theme"), Some(json!("dark")));
    }

    #[test]
    fn merge_is_all_or_nothing() {
        struct Even;
        impl TypeAdapter for Even {
            type Value = i64;
            const NAME: &'static str = "Even";
            fn coerce(raw: &Value) -> Result<i64, crate::error::AdapterError> {
                raw.as_i64()
                    .filter(|v| v % 2 == 0)
                    .ok_or_else(|| crate::error::AdapterError::new(Self::NAME, raw, "odd"))
            }
            fn render(value: &i64) -> Value {
                json!(value)
            }
        }

        let def = ModelDefinition::builder(
            "counter",
            Schema::new()
                .field("label", SchemaNode::string())
                .field("value", SchemaNode::adapter::<Even>()),
        )
        .build();
        let mut model = Model::new(&def, json!({"label": "a", "value": 2}), ModelOptions::default()).unwrap();

        let err = model.merge(&json!({"label": "b", "value": 3})).unwrap_err();
        assert!(err.is_type_error());
        assert_eq!(model.get("label"), Some(json!("a")));
        assert_eq!(model.adapter::<Even>("value"), Some(&2));

        model.merge(&json!({"label": "b", "value": 4})).unwrap();
        assert_eq!(model.get("label"), Some(json!("b")));
        assert_eq!(model.adapter::<Even>("value"), Some(&4));

        model.merge(&Value::Null).unwrap();
        assert_eq!(model.get("label"), Some(json!("b")));
    }

    #[test]
    fn persist_flag_comes_from_options() {
        let model = Model::new(&person(), json!({}), ModelOptions::persistent()).unwrap();
        assert!(model.persist());
        let model = Model::new(&person(), json!({}), ModelOptions::default()).unwrap();
        assert!(!model.persist());
    }
}
