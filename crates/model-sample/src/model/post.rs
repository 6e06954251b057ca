use crate::model::AppError;
use crate::types::{self, IsoDate};
use chrono::{DateTime, Utc};
use model_framework::{
    Model, ModelConfig, ModelDefinition, ModelError, ModelOptions, Schema, SchemaNode, TypeAdapter,
    TypedModel,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// The `post` definition, compiled from a JSON description and served under `blog/posts`.
pub fn post_definition() -> Result<Arc<ModelDefinition>, ModelError> {
    let schema = Schema::from_json(
        &json!({
            "id": { "type": "String" },
            "title": { "type": "String", "default": "Untitled" },
            "body": { "type": "String" },
            "author_id": { "type": "ObjectId" },
            "published_at": { "type": "IsoDate" },
            "draft": { "type": "Boolean", "default": true },
            "tags": { "type": "Array", "items": { "type": "String" } }
        }),
        &types::registry(),
    )?;

    Ok(ModelDefinition::builder("post", schema)
        .base_path("blog/posts")
        .computed("summary", |m| {
            let body = m.get_str("body").unwrap_or_default();
            json!(body.chars().take(40).collect::<String>())
        })
        .build())
}

/// Comments live under their post: `blog/posts/{post_id}/comments`.
pub fn comment_definition() -> Arc<ModelDefinition> {
    let schema = Schema::new()
        .field("id", SchemaNode::string())
        .field("post_id", SchemaNode::string())
        .field("text", SchemaNode::string());

    ModelDefinition::builder("comment", schema)
        .computed_base_path(|m| {
            format!(
                "blog/posts/{}/comments",
                m.get_str("post_id").unwrap_or_default()
            )
        })
        .build()
}

/// A blog post.
#[derive(Debug, Clone)]
pub struct Post {
    inner: Model,
}

impl Post {
    pub fn new(
        definition: &Arc<ModelDefinition>,
        data: Value,
        options: ModelOptions,
        config: ModelConfig,
    ) -> Result<Self, AppError> {
        Ok(Self {
            inner: Model::with_config(definition, data, options, config)?,
        })
    }

    pub fn title(&self) -> String {
        self.inner.get_str("title").unwrap_or_default()
    }

    pub fn is_draft(&self) -> bool {
        self.inner.get("draft").and_then(|v| v.as_bool()).unwrap_or(true)
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.inner.adapter::<IsoDate>("published_at").copied()
    }

    /// Marks the post as published at `at`. Only changes local state; call `save` to persist.
    pub fn publish(&mut self, at: DateTime<Utc>) -> Result<(), AppError> {
        if self.inner.get_str("body").unwrap_or_default().trim().is_empty() {
            return Err(AppError::Validation("cannot publish an empty post".into()));
        }
        self.inner.set("published_at", IsoDate::render(&at))?;
        self.inner.set("draft", json!(false))?;
        Ok(())
    }
}

impl TypedModel for Post {
    type Error = AppError;

    fn inner(&self) -> &Model {
        &self.inner
    }

    fn inner_mut(&mut self) -> &mut Model {
        &mut self.inner
    }

    fn map_error(e: ModelError) -> Self::Error {
        AppError::Model(e)
    }
}

/// A comment on a post.
#[derive(Debug, Clone)]
pub struct Comment {
    inner: Model,
}

impl Comment {
    pub fn new(
        definition: &Arc<ModelDefinition>,
        post_id: &str,
        text: &str,
        config: ModelConfig,
    ) -> Result<Self, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("comment text is empty".into()));
        }
        Ok(Self {
            inner: Model::with_config(
                definition,
                json!({"post_id": post_id, "text": text}),
                ModelOptions::default(),
                config,
            )?,
        })
    }

    pub fn text(&self) -> String {
        self.inner.get_str("text").unwrap_or_default()
    }
}

impl TypedModel for Comment {
    type Error = AppError;

    fn inner(&self) -> &Model {
        &self.inner
    }

    fn inner_mut(&mut self) -> &mut Model {
        &mut self.inner
    }

    fn map_error(e: ModelError) -> Self::Error {
        AppError::Model(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(data: Value) -> Post {
        Post::new(
            &post_definition().unwrap(),
            data,
            ModelOptions::default(),
            ModelConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn literal_base_path() {
        let mut p = post(json!({}));
        assert_eq!(p.inner().url(), "blog/posts");
        p.inner_mut().set("id", json!("4")).unwrap();
        assert_eq!(p.inner().url(), "blog/posts/4");
        assert_eq!(p.title(), "Untitled");
        assert!(p.is_draft());
    }

    #[test]
    fn author_reads_oid_envelope() {
        let p = post(json!({"author_id": {"$oid": "507F1F77BCF86CD799439011"}}));
        assert_eq!(
            p.inner().get("author_id"),
            Some(json!("507f1f77bcf86cd799439011"))
        );
    }

    #[test]
    fn publish_requires_body() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut empty = post(json!({}));
        assert!(matches!(empty.publish(at), Err(AppError::Validation(_))));

        let mut p = post(json!({"body": "Hello there"}));
        p.publish(at).unwrap();
        assert!(!p.is_draft());
        assert_eq!(p.published_at(), Some(at));
        assert_eq!(p.inner().to_json()["published_at"], "2024-03-01T09:00:00.000Z");
        assert_eq!(p.inner().get("summary"), Some(json!("Hello there")));
    }

    #[test]
    fn comment_base_path_follows_post() {
        let c = Comment::new(&comment_definition(), "12", "nice", ModelConfig::default()).unwrap();
        assert_eq!(c.inner().url(), "blog/posts/12/comments");
        assert!(Comment::new(&comment_definition(), "12", " ", ModelConfig::default()).is_err());
    }
}
