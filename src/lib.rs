//! EnergyWise customer portal widgets.
//!
//! A utility-company portal page carrying two interactive widgets: a floating
//! chat assistant and a bill upload form. Both are thin clients of an external
//! analysis backend; this crate owns their state, their HTTP exchanges and
//! their HTML.
//!
//! # Architecture
//!
//! - **Server**: Axum, HTML-first. Every gesture is an htmx request answered
//!   with a fragment.
//! - **Widgets**: plain state structs driven by async handles, rendered to
//!   strings.
//! - **Backend**: a trait with a reqwest implementation, so tests can swap in
//!   a double.
//!
//! # Modules
//!
//! - [`backend`]: wire types and the backend client
//! - [`chat`]: chat widget state and the session registry
//! - [`bill`]: bill submission flow and result rendering
//! - [`ui`]: pages and fragments
//! - [`server`]: router and handlers
//! - [`config`]: layered configuration
//! - [`telemetry`]: tracing setup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod backend;
pub mod bill;
pub mod chat;
pub mod config;
pub mod server;
pub mod telemetry;
pub mod ui;

use std::sync::Arc;

use crate::backend::Backend;
use crate::chat::WidgetStore;
use crate::config::AppConfig;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live chat widgets keyed by session id.
    pub widgets: WidgetStore,
    /// Analysis and chatbot backend.
    pub backend: Arc<dyn Backend>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
