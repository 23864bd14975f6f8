//! Typed wrappers around live elements. Wrapping binds behavior to an
//! existing element; the element itself is not rebuilt or copied.

use kstring::KString;
use livedom::{Element, DomEvent, IntoKString};

pub trait Component {
    fn element(&self) -> &Element;

    fn id(&self) -> Option<KString> {
        self.element().attribute("id")
    }
}

/// Wrappers that can be made from an element found in a template.
pub trait FromElement: Component + Sized {
    /// The tag this wrapper is for; `None` accepts any element.
    const TAG: Option<&'static str>;

    /// Wraps without checking the tag.
    fn from_element_unchecked(element: Element) -> Self;

    fn accepts(element: &Element) -> bool {
        match Self::TAG {
            None => true,
            Some(tag) => element.tag().as_deref() == Some(tag),
        }
    }

    /// Wraps `element` if it is accepted, otherwise gives it back.
    fn try_upgrade(element: Element) -> Result<Self, Element> {
        if Self::accepts(&element) {
            Ok(Self::from_element_unchecked(element))
        } else {
            Err(element)
        }
    }
}

macro_rules! def_component {
    { $(#[$meta:meta])* $name:ident => $tag:literal } => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(Element);

        impl $name {
            /// A new, empty element of this kind.
            pub fn new() -> Self {
                $name(Element::new($tag))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Component for $name {
            fn element(&self) -> &Element {
                &self.0
            }
        }

        impl FromElement for $name {
            const TAG: Option<&'static str> = Some($tag);
            fn from_element_unchecked(element: Element) -> Self {
                $name(element)
            }
        }
    }
}

def_component!{ Div => "div" }
def_component!{ Span => "span" }
def_component!{ Button => "button" }
def_component!{
    /// A plain `<input>`; its state lives in attributes.
    Input => "input"
}
def_component!{ TextField => "vaadin-text-field" }
def_component!{ PasswordField => "vaadin-password-field" }

/// Any element at all, with no behavior beyond `Component`.
#[derive(Debug, Clone)]
pub struct AnyElement(Element);

impl Component for AnyElement {
    fn element(&self) -> &Element {
        &self.0
    }
}

impl FromElement for AnyElement {
    const TAG: Option<&'static str> = None;
    fn from_element_unchecked(element: Element) -> Self {
        AnyElement(element)
    }
}

pub trait HasText: Component {
    fn text(&self) -> String {
        self.element().text_content()
    }

    fn set_text(&self, text: impl IntoKString) {
        self.element().set_text(text)
    }
}

impl HasText for Div {}
impl HasText for Span {}
impl HasText for Button {}
impl HasText for AnyElement {}

pub trait HasEnabled: Component {
    fn is_enabled(&self) -> bool {
        !self.element().has_attribute("disabled")
    }

    fn set_enabled(&self, enabled: bool) {
        self.element().set_attribute_bool("disabled", !enabled)
    }
}

impl HasEnabled for Button {}
impl HasEnabled for Input {}
impl HasEnabled for TextField {}
impl HasEnabled for PasswordField {}

impl Button {
    pub fn add_click_listener(&self, listener: impl Fn(&DomEvent) + Send + Sync + 'static) {
        self.0.add_event_listener("click", listener)
    }

    /// Fires a click event, unless the button is disabled. Returns the
    /// number of listeners called.
    pub fn click(&self) -> usize {
        if self.is_enabled() {
            self.0.fire_event("click")
        } else {
            0
        }
    }
}

/// Text fields keep their state in properties, as set via the `.` and
/// `%` forms in templates.
pub trait TextInput: Component {
    fn label(&self) -> Option<KString> {
        self.element().property("label")
            .and_then(|v| v.as_str().map(KString::from_ref))
    }

    fn set_label(&self, label: impl IntoKString) {
        self.element().set_property("label", label.into_kstring())
    }

    fn value(&self) -> KString {
        self.element().property("value")
            .and_then(|v| v.as_str().map(KString::from_ref))
            .unwrap_or_default()
    }

    fn set_value(&self, value: impl IntoKString) {
        self.element().set_property("value", value.into_kstring())
    }

    /// Negative or fractional numbers are not meaningful here and give
    /// `None`.
    fn max_length(&self) -> Option<u32> {
        let n = self.element().property("maxlength")?.as_number()?;
        if n >= 0.0 && n <= u32::MAX as f64 && n.fract() == 0.0 {
            Some(n as u32)
        } else {
            None
        }
    }

    fn set_max_length(&self, max: u32) {
        self.element().set_property("maxlength", max as f64)
    }
}

impl TextInput for TextField {}
impl TextInput for PasswordField {}

impl PasswordField {
    pub fn is_reveal_button_visible(&self) -> bool {
        !self.0.property("revealButtonHidden")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn set_reveal_button_visible(&self, visible: bool) {
        self.0.set_property("revealButtonHidden", !visible)
    }
}

impl Input {
    pub fn value(&self) -> KString {
        self.0.attribute("value").unwrap_or_default()
    }

    pub fn set_value(&self, value: impl IntoKString) {
        self.0.set_attribute("value", value)
    }

    /// The `type` attribute, `text` if absent.
    pub fn input_type(&self) -> KString {
        self.0.attribute("type").unwrap_or_else(|| KString::from_static("text"))
    }
}
