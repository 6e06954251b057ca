//! # Model Framework Sample
//!
//! A small blog backed by the in-memory REST backend.
//!
//! ## Core Components
//!
//! - **[types]**: custom field types ([`IsoDate`](model_sample::types::IsoDate),
//!   [`ObjectId`](model_sample::types::ObjectId)).
//! - **[model]**: model definitions and typed wrappers ([`User`], [`Post`], [`Comment`]).
//! - **[lifecycle]**: the [`BlogApp`] orchestrator.
//!
//! ## Quick Start
//!
//! The entry point demonstrates:
//! 1.  Setting up the [`BlogApp`].
//! 2.  Saving a [`User`] from a page scope, then tearing the page down.
//! 3.  Publishing a [`Post`] and commenting on it.

use chrono::Utc;
use model_framework::tracing::setup_tracing;
use model_framework::{PluginOptions, SaveOptions, TypedModel};
use model_sample::lifecycle::BlogApp;
use model_sample::model::{Comment, Post, User};
use serde_json::json;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting blog sample");

    let app = BlogApp::new(PluginOptions::default()).map_err(|e| e.to_string())?;

    // A profile page: `$user` is reset on teardown, `$draft` persists
    let mut page = app.profile_page().map_err(|e| e.to_string())?;
    let span = tracing::info_span!("profile_page");
    let user_id = async {
        let model = page
            .get_mut("$user")
            .ok_or_else(|| "profile page has no $user".to_string())?;
        model.set("first_name", json!("Alice")).map_err(|e| e.to_string())?;
        model.set("last_name", json!("Liddell")).map_err(|e| e.to_string())?;
        model
            .set("created_at", json!(Utc::now().to_rfc3339()))
            .map_err(|e| e.to_string())?;

        let mut user = User::from_model(model.clone());
        user.set_email("alice@example.com").map_err(|e| e.to_string())?;
        user.save(&app.transport, None, SaveOptions::default())
            .await
            .map_err(|e| e.to_string())?;
        info!(full_name = %user.full_name(), url = %user.inner().url(), "User saved");

        let id = user.inner().id();
        *model = user.into_model();
        id.ok_or_else(|| "saved user has no id".to_string())
    }
    .instrument(span)
    .await?;

    page.teardown().map_err(|e| e.to_string())?;
    info!(
        user_is_new = page.get("$user").map(|m| m.is_new()).unwrap_or(true),
        "Profile page torn down"
    );

    // Publishing flow
    let span = tracing::info_span!("publishing");
    let result = async {
        let mut post = Post::new(
            &app.definitions.post,
            json!({"title": "Down the rabbit hole", "body": "It was all very curious."}),
            Default::default(),
            *app.plugin.config(),
        )?;
        post.save(&app.transport, None, SaveOptions::default()).await?;
        post.publish(Utc::now())?;
        post.save(&app.transport, None, SaveOptions::default()).await?;

        let post_id = post.inner().id().unwrap_or_default();
        let mut comment = Comment::new(
            &app.definitions.comment,
            &post_id,
            &format!("Welcome back, user {user_id}"),
            *app.plugin.config(),
        )?;
        comment.save(&app.transport, None, SaveOptions::default()).await?;
        info!(post = %post.title(), comment = %comment.inner().url(), "Published");
        Ok::<_, model_sample::model::AppError>(())
    }
    .instrument(span)
    .await;

    if let Err(e) = result {
        error!(error = %e, "Publishing failed");
    }

    drop(page);
    app.shutdown().await?;

    info!("Sample completed successfully");
    Ok(())
}
