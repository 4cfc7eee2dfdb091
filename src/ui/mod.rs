//! HTML rendering.
//!
//! Pages and fragments are plain strings built with `format!`. Every value
//! that did not originate in this module is escaped before it is embedded.
//!
//! # Structure
//!
//! - [`page`]: document shell and the portal page
//! - [`chat_widget`]: launcher, panel, message list and upload preview
//! - [`bill_form`]: bill upload form, previous-bill toggle and alerts
//! - [`icons`]: inline SVG icons

pub mod bill_form;
pub mod chat_widget;
pub mod icons;
pub mod page;
