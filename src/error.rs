//! The error type returned by every fallible operation of this crate.
//!
//! `TemplateError` is a box around `TemplateErrorKind` so that the
//! `Result`s passed around during construction stay one word wide. It
//! derefs to the kind, and `From` is forwarded to the kind, so `?`
//! works for everything the kind converts from.

use std::{io, ops::Deref, fmt};

use kstring::KString;

#[derive(thiserror::Error, Debug)]
pub enum TemplateErrorKind {
    #[error("could not find {:?} relative to {origin}", .resource.as_str())]
    ResourceNotFound {
        resource: KString,
        origin: KString,
    },

    #[error("{context}: {source}")]
    Io {
        context: KString,
        #[source]
        source: io::Error,
    },

    #[error("there is no element with id {:?} to match field {:?} of {component}",
            .id.as_str(), .field.as_str())]
    BindingMismatch {
        id: KString,
        field: KString,
        component: KString,
    },

    #[error("field {:?} is not declared as an id field of {component}", .field.as_str())]
    UndeclaredField {
        field: KString,
        component: KString,
    },

    #[error("cannot parse value {:?} for numeric property {:?}",
            .value.as_str(), .property.as_str())]
    NumericProperty {
        property: KString,
        value: KString,
    },

    #[error("element with id {:?} is {found}, cannot upgrade it to {target} \
             which wraps <{expected}>", .id.as_str())]
    UpgradeMismatch {
        id: KString,
        expected: KString,
        found: KString,
        target: KString,
    },

    #[error("unsupported fragment node kind {kind:?}")]
    UnsupportedNode {
        kind: &'static str,
    },

    #[error("{:?} env var is not unicode", .name.as_str())]
    InvalidEnvVar {
        name: KString,
    },
}

impl From<io::Error> for TemplateErrorKind {
    fn from(source: io::Error) -> Self {
        TemplateErrorKind::Io {
            context: KString::from_static("reading template"),
            source,
        }
    }
}

#[derive(Debug)]
pub struct TemplateError(Box<TemplateErrorKind>);

impl TemplateError {
    pub fn kind(&self) -> &TemplateErrorKind {
        &self.0
    }

    pub fn into_kind(self) -> TemplateErrorKind {
        *self.0
    }

    /// An I/O failure with a description of what was being done.
    pub fn io(context: impl Into<KString>, source: io::Error) -> Self {
        TemplateErrorKind::Io { context: context.into(), source }.into()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(*self.0, TemplateErrorKind::ResourceNotFound { .. })
    }
}

impl Deref for TemplateError {
    type Target = TemplateErrorKind;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> From<E> for TemplateError where TemplateErrorKind: From<E> {
    fn from(err: E) -> Self {
        TemplateError(Box::new(TemplateErrorKind::from(err)))
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

pub type Result<T, E = TemplateError> = std::result::Result<T, E>;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_messages() {
        let e: TemplateError = TemplateErrorKind::BindingMismatch {
            id: "name".into(),
            field: "name".into(),
            component: "DemoView".into(),
        }.into();
        assert_eq!(e.to_string(),
                   "there is no element with id \"name\" to match field \"name\" \
                    of DemoView");

        let e: TemplateError = TemplateErrorKind::NumericProperty {
            property: "count".into(),
            value: "three".into(),
        }.into();
        assert_eq!(e.to_string(),
                   "cannot parse value \"three\" for numeric property \"count\"");
    }

    #[test]
    fn t_messages_quote_every_string_kind() {
        // static, inline and heap allocated strings all print the same
        let long = "a-resource-name-longer-than-the-inline-capacity.html";
        let kinds = [
            KString::from_static("x.html"),
            KString::from_ref("x.html"),
            KString::from_string("x.html".to_string()),
        ];
        for resource in kinds {
            let e: TemplateError = TemplateErrorKind::ResourceNotFound {
                resource,
                origin: "app::views".into(),
            }.into();
            assert_eq!(e.to_string(), "could not find \"x.html\" relative to app::views");
        }
        let e: TemplateError = TemplateErrorKind::UndeclaredField {
            field: KString::from_string(long.to_string()),
            component: "V".into(),
        }.into();
        assert_eq!(e.to_string(),
                   format!("field \"{long}\" is not declared as an id field of V"));
        let e: TemplateError = TemplateErrorKind::UpgradeMismatch {
            id: KString::from_ref("submit"),
            expected: "button".into(),
            found: "<div>".into(),
            target: "Button".into(),
        }.into();
        assert_eq!(e.to_string(),
                   "element with id \"submit\" is <div>, cannot upgrade it to Button \
                    which wraps <button>");
        let e: TemplateError = TemplateErrorKind::InvalidEnvVar {
            name: KString::from_static("HTMLTEMPLATE_TRACE"),
        }.into();
        assert_eq!(e.to_string(), "\"HTMLTEMPLATE_TRACE\" env var is not unicode");
    }

    #[test]
    fn t_io_from() {
        fn fails() -> Result<()> {
            Err::<(), _>(io::Error::new(io::ErrorKind::Other, "boom"))?;
            Ok(())
        }
        let e = fails().unwrap_err();
        assert!(matches!(e.kind(), TemplateErrorKind::Io { .. }));
        assert_eq!(e.to_string(), "reading template: boom");
        assert!(std::error::Error::source(&e).is_some());
        assert!(!e.is_not_found());
    }
}
