//! HTML templates for server-side components: markup is parsed once
//! (and cached, in production mode), converted into a live element
//! tree for every instance, and elements carrying an `id` are bound to
//! the component's typed fields.

pub mod trace;
pub mod str_util;
pub mod error;
pub mod config;
pub mod stream;
pub mod resource;
pub mod fragment;
pub mod parser;
pub mod cache;
pub mod convert;
pub mod components;
pub mod binder;
pub mod template;

pub use livedom;

pub use crate::{binder::{BoundElements, IdField},
                cache::{CacheStats, TemplateCache},
                components::{Component, FromElement},
                config::DeploymentConfiguration,
                error::{Result, TemplateError, TemplateErrorKind},
                resource::{ResourceRoot, TemplateOrigin},
                stream::StreamProvider,
                template::{HtmlTemplate, TemplateEngine, TemplateInstance, TemplateSource}};
