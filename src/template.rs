//! Template-backed components: a type declares where its markup comes
//! from and which elements it holds on to, the engine builds it.
//!
//! Instantiating parses the template (or takes it from the cache),
//! converts it into a fresh element tree under the shadow root of a
//! new host element, resolves the type's id fields and finally hands
//! the host and the resolved elements to the type's `bind`. Any
//! failure along the way returns an error and nothing is constructed.

use std::{fmt, sync::Arc};

use kstring::KString;
use livedom::Element;

use crate::{binder::{BoundElements, IdField},
            cache::TemplateCache,
            config::{DeploymentConfiguration, PRODUCTION_MODE_ENV, env_flag},
            convert::{IdMap, convert_into},
            error::Result,
            fragment::ParsedDocument,
            resource::{ResourceRoot, TemplateOrigin},
            stream::StreamProvider,
            time_guard};

/// Where the markup of a template comes from.
#[derive(Clone)]
pub enum TemplateSource {
    /// `<TypeName>.html` next to the type.
    DefaultResource,
    /// A path relative to the type's namespace directory, or to the
    /// resource root when starting with `/`.
    Resource(KString),
    /// Any stream. Without a cache key the template is parsed on every
    /// instantiation.
    Stream {
        cache_key: Option<KString>,
        provider: Arc<dyn StreamProvider>,
    },
}

impl TemplateSource {
    pub fn resource(url: impl Into<KString>) -> Self {
        TemplateSource::Resource(url.into())
    }

    pub fn stream(
        cache_key: Option<&str>,
        provider: impl StreamProvider + 'static
    ) -> Self {
        TemplateSource::Stream {
            cache_key: cache_key.map(KString::from_ref),
            provider: Arc::new(provider),
        }
    }
}

impl fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::DefaultResource => f.write_str("DefaultResource"),
            TemplateSource::Resource(url) =>
                f.debug_tuple("Resource").field(&url.as_str()).finish(),
            TemplateSource::Stream { cache_key, .. } =>
                f.debug_struct("Stream")
                .field("cache_key", &cache_key.as_deref())
                .finish_non_exhaustive(),
        }
    }
}

/// A type built from a template.
pub trait HtmlTemplate: Sized {
    const ORIGIN: TemplateOrigin;

    /// Tag of the host element the template's tree is attached to.
    const HOST_TAG: &'static str = "div";

    /// The fields bound to elements of the template by id.
    const ID_FIELDS: &'static [IdField] = &[];

    fn template_source() -> TemplateSource {
        TemplateSource::DefaultResource
    }

    /// Called once all of `ID_FIELDS` have been found.
    fn bind(host: Element, bound: &BoundElements) -> Result<Self>;
}

/// The result of instantiating a template without binding it to a
/// type.
#[derive(Debug)]
pub struct TemplateInstance {
    /// Holds the converted tree in its shadow root.
    pub host: Element,
    pub ids: IdMap,
}

impl TemplateInstance {
    /// The shadow root holding the converted tree.
    pub fn root(&self) -> Element {
        self.host.attach_shadow()
    }
}

/// Builds template-backed components. Engines sharing a cache share
/// parsed templates; each instantiation gets its own element tree.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    cache: Arc<TemplateCache>,
    config: Option<DeploymentConfiguration>,
    resources: ResourceRoot,
}

impl TemplateEngine {
    /// Using the process-wide cache and no configuration, i.e. in
    /// production mode.
    pub fn new(resources: ResourceRoot) -> Self {
        TemplateEngine {
            cache: TemplateCache::global(),
            config: None,
            resources,
        }
    }

    /// Like `new`, but configured from `HTMLTEMPLATE_PRODUCTION_MODE`
    /// if that is set.
    pub fn from_env(resources: ResourceRoot) -> Result<Self> {
        let config = env_flag(PRODUCTION_MODE_ENV)?.map(
            |production_mode| DeploymentConfiguration { production_mode });
        Ok(TemplateEngine { config, ..Self::new(resources) })
    }

    pub fn with_cache(self, cache: Arc<TemplateCache>) -> Self {
        TemplateEngine { cache, ..self }
    }

    pub fn with_config(self, config: DeploymentConfiguration) -> Self {
        TemplateEngine { config: Some(config), ..self }
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    pub fn config(&self) -> Option<&DeploymentConfiguration> {
        self.config.as_ref()
    }

    pub fn resources(&self) -> &ResourceRoot {
        &self.resources
    }

    fn resource_document(
        &self,
        origin: &TemplateOrigin,
        url: &str
    ) -> Result<Arc<ParsedDocument>> {
        let provider = self.resources.resolve(origin, url)?;
        self.cache.get(Some(self.resources.cache_key(origin, url).as_str()),
                       self.config.as_ref(),
                       &*provider)
    }

    /// The parsed template, from the cache if applicable.
    pub fn document(
        &self,
        origin: &TemplateOrigin,
        source: &TemplateSource
    ) -> Result<Arc<ParsedDocument>> {
        match source {
            TemplateSource::DefaultResource =>
                self.resource_document(origin, &origin.default_url()),
            TemplateSource::Resource(url) =>
                self.resource_document(origin, url),
            TemplateSource::Stream { cache_key, provider } =>
                self.cache.get(cache_key.as_deref(),
                               self.config.as_ref(),
                               &**provider),
        }
    }

    /// A fresh element tree for the template, attached to the shadow
    /// root of a new `host_tag` element.
    pub fn build(
        &self,
        origin: &TemplateOrigin,
        host_tag: &str,
        source: &TemplateSource
    ) -> Result<TemplateInstance> {
        time_guard!(origin.qualified_name());
        let document = self.document(origin, source)?;
        let host = Element::new(host_tag);
        let ids = convert_into(document.body(), &host.attach_shadow())?;
        Ok(TemplateInstance { host, ids })
    }

    pub fn instantiate<T: HtmlTemplate>(&self) -> Result<T> {
        self.instantiate_from(&T::template_source())
    }

    /// Instantiate `T` with markup from `source` instead of its own.
    pub fn instantiate_from<T: HtmlTemplate>(&self, source: &TemplateSource) -> Result<T> {
        let TemplateInstance { host, ids } = self.build(&T::ORIGIN, T::HOST_TAG, source)?;
        let bound = BoundElements::resolve(&T::ORIGIN.qualified_name(),
                                           T::ID_FIELDS,
                                           &ids)?;
        T::bind(host, &bound)
    }
}
