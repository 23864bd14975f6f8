use std::{sync::{Arc, Mutex, MutexGuard, PoisonError},
          fmt::{self, Debug}};

use kstring::KString;

use crate::{property::PropertyValue, kstr::IntoKString};

pub type Listener = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// Passed to event listeners.
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub name: KString,
    pub target: Element,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Element(KString),
    Text(KString),
    ShadowRoot,
}

pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) attributes: Vec<(KString, KString)>,
    pub(crate) properties: Vec<(KString, PropertyValue)>,
    pub(crate) children: Vec<Element>,
    pub(crate) shadow_root: Option<Element>,
    listeners: Vec<(KString, Listener)>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        NodeData {
            kind,
            attributes: Vec::new(),
            properties: Vec::new(),
            children: Vec::new(),
            shadow_root: None,
            listeners: Vec::new(),
        }
    }
}

/// A handle to a live node: an element, a text node or a shadow
/// root. Cloning the handle does not copy the node, both handles
/// refer to the same node (see `same_node`).
///
/// Children are owned by their parent; there are no back references,
/// hence appending an ancestor to one of its descendants leaks the
/// cycle. Converted templates never do that.
#[derive(Clone)]
pub struct Element(Arc<Mutex<NodeData>>);

impl Element {
    fn from_kind(kind: NodeKind) -> Self {
        Element(Arc::new(Mutex::new(NodeData::new(kind))))
    }

    /// A new element with the given tag name, no attributes, no
    /// children.
    pub fn new(tag: impl IntoKString) -> Self {
        Self::from_kind(NodeKind::Element(tag.into_kstring()))
    }

    /// A text node; the text is kept exactly as given.
    pub fn create_text(text: impl IntoKString) -> Self {
        Self::from_kind(NodeKind::Text(text.into_kstring()))
    }

    // A panicking listener must not make the node unusable for the
    // rest of the component's life, the data itself stays consistent.
    pub(crate) fn data(&self) -> MutexGuard<'_, NodeData> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The tag name, `None` for text nodes and shadow roots.
    pub fn tag(&self) -> Option<KString> {
        match &self.data().kind {
            NodeKind::Element(tag) => Some(tag.clone()),
            _ => None
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data().kind, NodeKind::Text(_))
    }

    pub fn is_shadow_root(&self) -> bool {
        self.data().kind == NodeKind::ShadowRoot
    }

    /// Whether both handles refer to the same node.
    pub fn same_node(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ---- attributes -------------------------------------------------

    /// The attribute value; boolean attributes that are present give
    /// `Some("")`.
    pub fn attribute(&self, name: &str) -> Option<KString> {
        self.data().attributes.iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.data().attributes.iter().any(|(k, _)| k.as_str() == name)
    }

    /// Attributes in the order they were first set.
    pub fn attributes(&self) -> Vec<(KString, KString)> {
        self.data().attributes.clone()
    }

    /// Sets or replaces the attribute, keeping its original position.
    pub fn set_attribute(&self, name: impl IntoKString, value: impl IntoKString) {
        let name = name.into_kstring();
        let value = value.into_kstring();
        let mut data = self.data();
        if let Some(slot) = data.attributes.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            data.attributes.push((name, value));
        }
    }

    /// `true` makes the attribute present without a value, `false`
    /// removes it.
    pub fn set_attribute_bool(&self, name: impl IntoKString, present: bool) {
        let name = name.into_kstring();
        if present {
            self.set_attribute(name, "");
        } else {
            self.remove_attribute(&name);
        }
    }

    /// Returns the previous value, if any.
    pub fn remove_attribute(&self, name: &str) -> Option<KString> {
        let mut data = self.data();
        let i = data.attributes.iter().position(|(k, _)| k.as_str() == name)?;
        Some(data.attributes.remove(i).1)
    }

    // ---- properties -------------------------------------------------

    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        self.data().properties.iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v.clone())
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.data().properties.iter().any(|(k, _)| k.as_str() == name)
    }

    pub fn properties(&self) -> Vec<(KString, PropertyValue)> {
        self.data().properties.clone()
    }

    pub fn set_property(&self, name: impl IntoKString, value: impl Into<PropertyValue>) {
        let name = name.into_kstring();
        let value = value.into();
        let mut data = self.data();
        if let Some(slot) = data.properties.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            data.properties.push((name, value));
        }
    }

    pub fn remove_property(&self, name: &str) -> Option<PropertyValue> {
        let mut data = self.data();
        let i = data.properties.iter().position(|(k, _)| k.as_str() == name)?;
        Some(data.properties.remove(i).1)
    }

    // ---- children ---------------------------------------------------

    pub fn append_child(&self, child: Element) {
        assert!(!self.same_node(&child), "can't append a node to itself");
        self.data().children.push(child);
    }

    pub fn append_children(&self, children: impl IntoIterator<Item = Element>) {
        for child in children {
            self.append_child(child);
        }
    }

    pub fn children(&self) -> Vec<Element> {
        self.data().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn remove_all_children(&self) {
        self.data().children.clear();
    }

    /// The text of this node and of all its descendants, in document
    /// order. Does not descend into shadow roots.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        let children = {
            let data = self.data();
            if let NodeKind::Text(s) = &data.kind {
                out.push_str(s);
                return
            }
            data.children.clone()
        };
        for child in children {
            child.collect_text(out);
        }
    }

    /// Replaces all children with a single text node (or with nothing,
    /// for the empty string). On a text node, replaces its text.
    pub fn set_text(&self, text: impl IntoKString) {
        let text = text.into_kstring();
        let mut data = self.data();
        if let NodeKind::Text(s) = &mut data.kind {
            *s = text;
            return
        }
        data.children.clear();
        if !text.is_empty() {
            data.children.push(Element::create_text(text));
        }
    }

    // ---- shadow root ------------------------------------------------

    /// Attaches a shadow root and returns it. If one is attached
    /// already, that one is returned.
    pub fn attach_shadow(&self) -> Element {
        let mut data = self.data();
        data.shadow_root
            .get_or_insert_with(|| Element::from_kind(NodeKind::ShadowRoot))
            .clone()
    }

    pub fn shadow_root(&self) -> Option<Element> {
        self.data().shadow_root.clone()
    }

    // ---- events -----------------------------------------------------

    pub fn add_event_listener(
        &self,
        event: impl IntoKString,
        listener: impl Fn(&DomEvent) + Send + Sync + 'static
    ) {
        self.data().listeners.push((event.into_kstring(), Arc::new(listener)));
    }

    /// Calls every listener registered for `event`, in registration
    /// order, and returns how many were called. Listeners may modify
    /// this element.
    pub fn fire_event(&self, event: &str) -> usize {
        let listeners: Vec<Listener> = self.data().listeners.iter()
            .filter(|(name, _)| name.as_str() == event)
            .map(|(_, l)| l.clone())
            .collect();
        let domevent = DomEvent {
            name: KString::from_ref(event),
            target: self.clone(),
        };
        for listener in &listeners {
            listener(&domevent);
        }
        listeners.len()
    }

    /// Visit this node and all of its descendants (not shadow roots)
    /// in document order.
    pub fn for_each_descendant(&self, f: &mut impl FnMut(&Element)) {
        f(self);
        for child in self.children() {
            child.for_each_descendant(f);
        }
    }
}

impl Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        match &data.kind {
            NodeKind::Element(tag) => {
                write!(f, "<{}", tag.as_str())?;
                if let Some((_, id)) = data.attributes.iter().find(|(k, _)| k.as_str() == "id") {
                    write!(f, " id={:?}", id.as_str())?;
                }
                write!(f, "> ({} children)", data.children.len())
            }
            NodeKind::Text(s) => write!(f, "#text {:?}", s.as_str()),
            NodeKind::ShadowRoot => write!(f, "#shadow-root ({} children)",
                                           data.children.len()),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn t_attributes() {
        let e = Element::new("input");
        e.set_attribute("type", "text");
        e.set_attribute_bool("disabled", true);
        e.set_attribute("type", "password");
        assert_eq!(e.attribute("type").as_deref(), Some("password"));
        assert_eq!(e.attribute("disabled").as_deref(), Some(""));
        assert_eq!(e.attributes().iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
                   ["type", "disabled"]);
        e.set_attribute_bool("disabled", false);
        assert!(!e.has_attribute("disabled"));
        assert_eq!(e.remove_attribute("type").as_deref(), Some("password"));
        assert_eq!(e.remove_attribute("type"), None);
    }

    #[test]
    fn t_properties() {
        let e = Element::new("vaadin-text-field");
        e.set_property("label", "Name");
        e.set_property("maxlength", 20.0);
        e.set_property("label", "Full name");
        assert_eq!(e.property("label"), Some(PropertyValue::from("Full name")));
        assert_eq!(e.property("maxlength").and_then(|v| v.as_number()), Some(20.0));
        assert!(!e.has_attribute("label"));
        assert_eq!(e.properties().len(), 2);
    }

    #[test]
    fn t_text() {
        let div = Element::new("div");
        div.append_child(Element::create_text("Hello "));
        let b = Element::new("b");
        b.append_child(Element::create_text("world"));
        div.append_child(b);
        assert_eq!(div.text_content(), "Hello world");
        div.set_text("replaced");
        assert_eq!(div.child_count(), 1);
        assert!(div.children()[0].is_text());
        assert_eq!(div.text_content(), "replaced");
        div.set_text("");
        assert_eq!(div.child_count(), 0);
    }

    #[test]
    fn t_shadow_and_identity() {
        let host = Element::new("div");
        let shadow = host.attach_shadow();
        assert!(shadow.is_shadow_root());
        assert!(host.attach_shadow().same_node(&shadow));
        assert!(host.shadow_root().unwrap().same_node(&shadow));
        assert_eq!(shadow.tag(), None);
        let copy = host.clone();
        assert!(copy.same_node(&host));
        assert!(!Element::new("div").same_node(&host));
    }

    #[test]
    fn t_events() {
        let button = Element::new("button");
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = count.clone();
            button.add_event_listener("click", move |ev| {
                count.fetch_add(1, Ordering::SeqCst);
                // listeners may touch the target
                ev.target.set_attribute("clicked", "yes");
            });
        }
        assert_eq!(button.fire_event("focus"), 0);
        assert_eq!(button.fire_event("click"), 1);
        assert_eq!(button.fire_event("click"), 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(button.attribute("clicked").as_deref(), Some("yes"));
    }

    #[test]
    fn t_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Element>();
    }
}
