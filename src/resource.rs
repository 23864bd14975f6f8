//! Locating template resources relative to the type that owns them,
//! in the manner of a class path: `Foo` declared in module `app::views`
//! finds its default template at `app/views/Foo.html` below the
//! resource root.

use std::{path::PathBuf, sync::Arc};

use kstring::KString;

use crate::{stream::{StreamProvider, FileStream, StaticStream},
            error::{Result, TemplateErrorKind}};

/// Where a template-backed type is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateOrigin {
    /// Module path, `::` separated.
    pub namespace: &'static str,
    /// Simple name of the type.
    pub type_name: &'static str,
}

/// `template_origin!(DemoView)` gives the origin of `DemoView` as
/// declared in the current module.
#[macro_export]
macro_rules! template_origin {
    ($type:ident) => {
        $crate::resource::TemplateOrigin::new(module_path!(), stringify!($type))
    }
}

impl TemplateOrigin {
    pub const fn new(namespace: &'static str, type_name: &'static str) -> Self {
        TemplateOrigin { namespace, type_name }
    }

    /// `<SimpleTypeName>.html`
    pub fn default_url(&self) -> KString {
        KString::from_string(format!("{}.html", self.type_name))
    }

    /// `<namespace>/<url>`: identifies the template below a given
    /// resource root. See `ResourceRoot::cache_key` for the full key.
    pub fn cache_key(&self, url: &str) -> KString {
        KString::from_string(format!("{}/{}", self.namespace, url))
    }

    pub fn qualified_name(&self) -> KString {
        if self.namespace.is_empty() {
            KString::from_static(self.type_name)
        } else {
            KString::from_string(format!("{}::{}", self.namespace, self.type_name))
        }
    }

    /// The `/` separated path of `url` below the resource root. A url
    /// starting with `/` is taken from the root, otherwise from the
    /// namespace's directory. `.` and `..` segments are resolved, `..`
    /// never leaves the root.
    pub fn resource_path(&self, url: &str) -> String {
        let mut segments: Vec<&str> = Vec::new();
        let relative = match url.strip_prefix('/') {
            Some(absolute) => absolute,
            None => {
                segments.extend(self.namespace.split("::").filter(|s| !s.is_empty()));
                url
            }
        };
        for segment in relative.split('/') {
            match segment {
                "" | "." => (),
                ".." => { segments.pop(); }
                s => segments.push(s),
            }
        }
        segments.join("/")
    }
}

/// Where resources are read from.
#[derive(Debug, Clone)]
pub enum ResourceRoot {
    /// A directory on disk. Files are opened on each read, hence edits
    /// are picked up in development mode.
    Directory(PathBuf),
    /// Resources compiled into the binary, keyed by resource path.
    Embedded(&'static [(&'static str, &'static [u8])]),
}

impl ResourceRoot {
    /// Distinguishes roots in cache keys: the directory path, or the
    /// address of the embedded table.
    pub fn label(&self) -> String {
        match self {
            ResourceRoot::Directory(base) => format!("dir:{}", base.display()),
            ResourceRoot::Embedded(table) => format!("embedded:{:p}", table.as_ptr()),
        }
    }

    /// Cache key of the resource at `url` relative to `origin` below
    /// this root: `<label>!<namespace>/<url>`. Roots holding the same
    /// paths with different contents get different keys.
    pub fn cache_key(&self, origin: &TemplateOrigin, url: &str) -> KString {
        KString::from_string(format!("{}!{}", self.label(), origin.cache_key(url)))
    }

    /// A provider for the resource at `url` relative to `origin`. Does
    /// not open anything yet.
    pub fn resolve(
        &self,
        origin: &TemplateOrigin,
        url: &str
    ) -> Result<Arc<dyn StreamProvider>> {
        let path = origin.resource_path(url);
        match self {
            ResourceRoot::Directory(base) => {
                let mut fullpath = base.clone();
                fullpath.extend(path.split('/'));
                Ok(Arc::new(FileStream {
                    path: fullpath,
                    origin: origin.qualified_name(),
                }))
            }
            ResourceRoot::Embedded(table) => {
                let (_, bytes) = table.iter()
                    .find(|(p, _)| *p == path)
                    .ok_or_else(|| TemplateErrorKind::ResourceNotFound {
                        resource: KString::from_string(path.clone()),
                        origin: origin.qualified_name(),
                    })?;
                Ok(Arc::new(StaticStream(*bytes)))
            }
        }
    }
}
