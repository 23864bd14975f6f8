//! Resolving a component's id fields against the elements of its
//! instantiated template.
//!
//! A template-backed type declares its fields in a manifest of
//! `IdField`s. All of them are looked up before the type's `bind` gets
//! to see any element, so an out-of-sync template fails construction
//! before anything is wrapped.

use std::any::type_name;

use kstring::KString;
use livedom::Element;

use crate::{components::FromElement,
            convert::IdMap,
            error::{Result, TemplateErrorKind},
            str_util::simple_type_name};

/// One entry of a binding manifest: a field, bound to the element with
/// the field's own name as its id, unless `id` overrides that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdField {
    pub field: &'static str,
    pub id: Option<&'static str>,
}

impl IdField {
    pub const fn new(field: &'static str) -> Self {
        IdField { field, id: None }
    }

    pub const fn with_id(field: &'static str, id: &'static str) -> Self {
        IdField { field, id: Some(id) }
    }

    /// The id to look up; an empty override counts as none.
    pub fn id(&self) -> &'static str {
        match self.id {
            Some(id) if !id.is_empty() => id,
            _ => self.field,
        }
    }
}

/// The elements for all fields of a manifest, found in one
/// instantiation.
#[derive(Debug)]
pub struct BoundElements {
    component: KString,
    elements: Vec<(IdField, Element)>,
}

impl BoundElements {
    /// Looks up every field of the manifest. The first field whose id
    /// has no element fails with `BindingMismatch`.
    pub fn resolve(component: &str, fields: &[IdField], ids: &IdMap) -> Result<Self> {
        let elements = fields.iter().map(|field| -> Result<(IdField, Element)> {
            let id = field.id();
            match ids.get(id) {
                Some(element) => Ok((*field, element.clone())),
                None => Err(TemplateErrorKind::BindingMismatch {
                    id: KString::from_static(id),
                    field: KString::from_static(field.field),
                    component: KString::from_ref(component),
                }.into())
            }
        }).collect::<Result<_>>()?;
        Ok(BoundElements {
            component: KString::from_ref(component),
            elements,
        })
    }

    fn entry(&self, field: &str) -> Result<&(IdField, Element)> {
        self.elements.iter()
            .find(|(f, _)| f.field == field)
            .ok_or_else(|| TemplateErrorKind::UndeclaredField {
                field: KString::from_ref(field),
                component: self.component.clone(),
            }.into())
    }

    /// The raw element bound to `field`.
    pub fn element(&self, field: &str) -> Result<Element> {
        Ok(self.entry(field)?.1.clone())
    }

    /// The element bound to `field`, upgraded to `T`.
    pub fn get<T: FromElement>(&self, field: &str) -> Result<T> {
        let (idfield, element) = self.entry(field)?;
        T::try_upgrade(element.clone()).map_err(|element| {
            let found = match element.tag() {
                Some(tag) => KString::from_string(format!("<{}>", tag.as_str())),
                None => KString::from_static("a text node"),
            };
            TemplateErrorKind::UpgradeMismatch {
                id: KString::from_static(idfield.id()),
                expected: KString::from_static(T::TAG.unwrap_or("*")),
                found,
                target: KString::from_static(simple_type_name(type_name::<T>())),
            }.into()
        })
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
