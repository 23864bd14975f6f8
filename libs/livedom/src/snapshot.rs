//! A serializable copy of a live tree, e.g. for shipping the initial
//! state of a component to a client.

use std::collections::BTreeMap;

use kstring::KString;
use serde::Serialize;

use crate::{element::{Element, NodeKind}, property::PropertyValue};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Snapshot {
    Element {
        tag: KString,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<KString, KString>,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        properties: BTreeMap<KString, PropertyValue>,
        #[serde(rename = "shadowRoot", skip_serializing_if = "Option::is_none")]
        shadow_root: Option<Box<Snapshot>>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        children: Vec<Snapshot>,
    },
    Text {
        text: KString,
    },
    ShadowRoot {
        children: Vec<Snapshot>,
    },
}

impl Snapshot {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("string keys only, can't fail")
    }
}

impl Element {
    pub fn snapshot(&self) -> Snapshot {
        let (kind, attributes, properties, children, shadow_root) = {
            let data = self.data();
            (data.kind.clone(),
             data.attributes.clone(),
             data.properties.clone(),
             data.children.clone(),
             data.shadow_root.clone())
        };
        let children = children.iter().map(Element::snapshot).collect();
        match kind {
            NodeKind::Text(text) => Snapshot::Text { text },
            NodeKind::ShadowRoot => Snapshot::ShadowRoot { children },
            NodeKind::Element(tag) => Snapshot::Element {
                tag,
                attributes: attributes.into_iter().collect(),
                properties: properties.into_iter().collect(),
                shadow_root: shadow_root.map(|s| Box::new(s.snapshot())),
                children,
            }
        }
    }
}
