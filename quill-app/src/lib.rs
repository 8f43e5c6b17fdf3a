//! Client-side session and post-management workflow.
//!
//! The dashboard of the blogging platform is host-agnostic: it talks to the
//! backend through the [`api::BlogApi`] seam, surfaces transient messages
//! through the [`notify::Notifier`] seam, and persists the logged-in user
//! through the [`session::SessionStore`] seam. Any front-end (the bundled
//! CLI, a future UI) drives the same [`dashboard::DashboardController`].

pub mod api;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod notify;
pub mod posts;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::BlogApi;
pub use dashboard::{DashboardController, Phase};
pub use editor::{EditorForm, EditorMode};
pub use error::AppError;
pub use notify::{Notice, Notifier};
pub use session::{FsSessionStore, Session, SessionStore};
