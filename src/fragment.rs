//! The parsed, immutable form of a template, before conversion to live
//! elements. This is what gets cached.

use kstring::KString;

#[derive(Debug, Clone, PartialEq)]
pub enum FragmentNode {
    Element(FragmentElement),
    Text(KString),
    Comment(KString),
    /// Not produced by `parse_body_fragment`, which drops doctypes;
    /// the converter rejects it.
    Doctype(KString),
}

impl FragmentNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FragmentNode::Element(_) => "element",
            FragmentNode::Text(_) => "text",
            FragmentNode::Comment(_) => "comment",
            FragmentNode::Doctype(_) => "doctype",
        }
    }

    pub fn as_element(&self) -> Option<&FragmentElement> {
        match self {
            FragmentNode::Element(e) => Some(e),
            _ => None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentElement {
    pub tag: KString,
    /// In source order; names are unique.
    pub attributes: Vec<(KString, KString)>,
    pub children: Vec<FragmentNode>,
}

impl FragmentElement {
    pub fn new(tag: KString) -> Self {
        FragmentElement {
            tag,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &FragmentElement> {
        self.children.iter().filter_map(FragmentNode::as_element)
    }

    /// Number of element and text nodes in this subtree, this element
    /// included; comments don't count.
    pub fn count_elements_and_text(&self) -> usize {
        1 + self.children.iter().map(|c| match c {
            FragmentNode::Element(e) => e.count_elements_and_text(),
            FragmentNode::Text(_) => 1,
            FragmentNode::Comment(_) | FragmentNode::Doctype(_) => 0,
        }).sum::<usize>()
    }
}

/// A parsed template: the children of an implied `<body>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    body: FragmentElement,
}

impl ParsedDocument {
    pub fn new(body: FragmentElement) -> Self {
        ParsedDocument { body }
    }

    pub fn body(&self) -> &FragmentElement {
        &self.body
    }
}
