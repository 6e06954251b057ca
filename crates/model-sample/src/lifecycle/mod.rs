//! # Application Lifecycle & Orchestration
//!
//! This module wires the pieces of the sample application together and tears them down.
//!
//! ## The BlogApp Pattern
//!
//! [`BlogApp`] is the "conductor":
//!
//! 1. **Backend** - spawn the in-memory REST backend and keep its transport
//! 2. **Plugin** - install the model plugin once with the application's options
//! 3. **Definitions** - build every model definition once and share them as `Arc`s
//! 4. **Components** - hand out [`ModelScope`](model_framework::ModelScope)s per page
//! 5. **Graceful Shutdown** - drop the transport and await the backend task
//!
//! ## Late Binding
//!
//! Models never own a transport. The transport is passed to each CRUD call, so the same
//! model code runs against the memory backend here, an `HttpTransport` in production and
//! a `MockTransport` in tests.
//!
//! ## Graceful Shutdown
//!
//! 1. **Drop the transport** - closes the sender side of the backend channel
//! 2. **Backend detects closure** - `receiver.recv()` returns `None`
//! 3. **Await completion** - wait for the backend task to finish
//!
//! Clones of the transport handed out to callers keep the backend alive, so drop them
//! before calling [`BlogApp::shutdown`].

pub mod blog_app;

pub use blog_app::*;
