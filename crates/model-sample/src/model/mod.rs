//! # Sample Models
//!
//! Concrete model definitions and the typed wrappers the application works with.
//!
//! | Wrapper     | Endpoint                          | Notes                                   |
//! |-------------|-----------------------------------|-----------------------------------------|
//! | [`User`]    | `users` (pluralised name)         | computed `full_name`, nested address    |
//! | [`Post`]    | `blog/posts` (literal base path)  | schema compiled from a JSON description |
//! | [`Comment`] | `blog/posts/{post_id}/comments`   | computed base path                      |

pub mod error;
pub mod post;
pub mod user;

pub use error::AppError;
pub use post::{comment_definition, post_definition, Comment, Post};
pub use user::{user_definition, User};
