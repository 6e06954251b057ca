use model_framework::adapter::{AdapterRegistry, AdapterSpec, TypeAdapter};
use model_framework::error::AdapterError;
use model_framework::mock::capture_warnings;
use model_framework::{
    MemoryBackend, Method, Model, ModelDefinition, ModelOptions, ModelsOption, Plugin,
    PluginOptions, SaveOptions, Schema, Transport, TransportError,
};
use serde_json::{json, Value};
use std::sync::Arc;

// --- Test Adapter ---

/// Stores a lowercase slug; accepts `{"$slug": "..."}` envelopes when configured.
struct Slug;

impl TypeAdapter for Slug {
    type Value = String;
    const NAME: &'static str = "Slug";

    fn coerce(raw: &Value) -> Result<String, AdapterError> {
        let s = raw
            .as_str()
            .ok_or_else(|| AdapterError::new(Self::NAME, raw, "expected a string"))?;
        if s.is_empty() || s.contains(char::is_whitespace) {
            return Err(AdapterError::new(Self::NAME, raw, "not a slug"));
        }
        Ok(s.to_lowercase())
    }

    fn render(value: &String) -> Value {
        json!(value)
    }
}

fn article_definition() -> Arc<ModelDefinition> {
    let registry = AdapterRegistry::new()
        .register_spec("Slug", AdapterSpec::of::<Slug>().with_extraction_key("$slug"));
    let schema = Schema::from_json(
        &json!({
            "id": { "type": "String" },
            "title": { "type": "String", "default": "Untitled" },
            "slug": { "type": "Slug" },
            "published": { "type": "Boolean" },
            "meta": {
                "type": "Object",
                "properties": { "views": { "type": "Number" } }
            },
            "tags": { "type": "Array", "items": { "type": "String" } }
        }),
        &registry,
    )
    .unwrap();

    ModelDefinition::builder("article", schema)
        .computed("headline", |m| {
            json!(m.get_str("title").unwrap_or_default().to_uppercase())
        })
        .build()
}

#[tokio::test]
async fn test_article_lifecycle_against_memory_backend() {
    let (backend, transport) = MemoryBackend::new(10);
    let backend_handle = tokio::spawn(backend.run());
    let def = article_definition();

    // 1. Create
    let mut article = Model::new(
        &def,
        json!({"title": "Hello", "slug": {"$slug": "Hello-World"}, "tags": ["rust"]}),
        ModelOptions::default(),
    )
    .unwrap();
    assert!(article.is_new());
    assert_eq!(article.get("slug"), Some(json!("hello-world")));
    assert_eq!(article.get("headline"), Some(json!("HELLO")));

    article
        .save(&transport, None, SaveOptions::default())
        .await
        .unwrap();
    assert_eq!(article.url(), "articles/1");

    // 2. Update
    article.set("published", json!(true)).unwrap();
    article.set("title", json!("Hello again")).unwrap();
    article
        .save(&transport, None, SaveOptions::default())
        .await
        .unwrap();
    assert_eq!(article.get("headline"), Some(json!("HELLO AGAIN")));

    // 3. Fetch into a fresh instance
    let mut copy = Model::new(&def, json!({"id": "1"}), ModelOptions::default()).unwrap();
    copy.fetch(&transport).await.unwrap();
    assert_eq!(copy.get("title"), Some(json!("Hello again")));
    assert_eq!(copy.get("published"), Some(json!(true)));
    assert_eq!(copy.get("tags"), Some(json!(["rust"])));
    assert_eq!(copy.adapter::<Slug>("slug").map(String::as_str), Some("hello-world"));

    // 4. Destroy
    copy.destroy(&transport).await.unwrap();
    let err = article.fetch(&transport).await.unwrap_err();
    assert!(err.is_request_error());

    drop(transport);
    drop(copy);
    backend_handle.await.unwrap();
}

#[tokio::test]
async fn test_server_computed_fields_are_not_stored() {
    let (backend, transport) = MemoryBackend::new(10);
    tokio::spawn(backend.run());
    let def = article_definition();

    let mut article = Model::new(&def, json!({}), ModelOptions::default()).unwrap();
    article
        .save(&transport, None, SaveOptions::default())
        .await
        .unwrap();
    article
        .save(&transport, None, SaveOptions::default())
        .await
        .unwrap();

    // the stored copy carries the computed keys save sent along
    let stored = transport
        .request(Method::Get, &article.url(), None)
        .await
        .unwrap();
    assert_eq!(stored["isNew"], false);
    assert_eq!(stored["headline"], "UNTITLED");

    let (result, warnings) = capture_warnings(|| article.merge(&stored));
    result.unwrap();
    assert_eq!(warnings, 0);
    assert!(article.extras().is_empty());
    assert_eq!(article.get("isNew"), Some(json!(false)));
    assert_eq!(article.url(), "articles/1");
}

#[tokio::test]
async fn test_rejected_adapter_value_in_response_keeps_state() {
    let (backend, transport) = MemoryBackend::new(10);
    tokio::spawn(backend.run());
    let def = article_definition();

    let seeded = transport
        .request(Method::Post, "articles", Some(&json!({"title": "Bad", "slug": "has space"})))
        .await
        .unwrap();
    let id = seeded["id"].as_str().unwrap().to_string();

    let mut article = Model::new(&def, json!({"id": id}), ModelOptions::default()).unwrap();
    let err = article.fetch(&transport).await.unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(article.get("title"), Some(json!("Untitled")));
}

#[tokio::test]
async fn test_scope_teardown_after_save() {
    let (backend, transport) = MemoryBackend::new(10);
    tokio::spawn(backend.run());
    let def = article_definition();

    let plugin = Plugin::install(PluginOptions::default());
    let models = ModelsOption::new().model("article", {
        let def = def.clone();
        move |config| Model::with_config(&def, json!({"title": "Draft"}), ModelOptions::default(), *config)
    });
    let mut scope = plugin.scope(&models).unwrap();

    let article = scope.get_mut("$article").unwrap();
    article
        .save(&transport, None, SaveOptions::default())
        .await
        .unwrap();
    assert!(!article.is_new());

    scope.teardown().unwrap();
    let article = scope.get("$article").unwrap();
    assert!(article.is_new());
    assert_eq!(article.get("title"), Some(json!("Untitled")));

    // the server copy is untouched by teardown
    let stored = transport.request(Method::Get, "articles/1", None).await.unwrap();
    assert_eq!(stored["title"], "Draft");
}

#[tokio::test]
async fn test_transport_error_display() {
    let (backend, transport) = MemoryBackend::new(1);
    tokio::spawn(backend.run());
    let err = transport
        .request(Method::Delete, "articles/42", None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            method: "DELETE".into(),
            url: "articles/42".into(),
            status: 404,
            body: "not found".into(),
        }
    );
}
