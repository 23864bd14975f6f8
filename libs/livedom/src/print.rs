//! HTML serialization of live trees.

use std::io::Write;

use crate::element::{Element, NodeKind};

// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn write_escaped(out: &mut impl Write, s: &str, in_attribute: bool) -> std::io::Result<()> {
    let mut last = 0;
    for (i, c) in s.char_indices() {
        let rep = match c {
            '&' => "&amp;",
            '<' if !in_attribute => "&lt;",
            '>' if !in_attribute => "&gt;",
            '"' if in_attribute => "&quot;",
            '\u{A0}' => "&nbsp;",
            _ => continue
        };
        out.write_all(s[last..i].as_bytes())?;
        out.write_all(rep.as_bytes())?;
        last = i + c.len_utf8();
    }
    out.write_all(s[last..].as_bytes())
}

pub trait Print {
    /// Print serialized HTML. Properties are not part of the markup
    /// and are left out.
    fn print_html_fragment(&self, out: &mut impl Write) -> std::io::Result<()>;

    fn to_html_fragment_string(&self) -> String {
        let mut s = Vec::new();
        self.print_html_fragment(&mut s)
            .expect("writing to a Vec does not fail");
        String::from_utf8(s).expect("only str slices were written")
    }
}

impl Print for Element {
    fn print_html_fragment(&self, out: &mut impl Write) -> std::io::Result<()> {
        // Copy out what's needed so no lock is held while recursing.
        let (kind, attributes, children, shadow_root) = {
            let data = self.data();
            (data.kind.clone(),
             data.attributes.clone(),
             data.children.clone(),
             data.shadow_root.clone())
        };
        match kind {
            NodeKind::Text(s) => write_escaped(out, &s, false),
            NodeKind::ShadowRoot => {
                out.write_all(b"<template shadowrootmode=\"open\">")?;
                children.print_html_fragment(out)?;
                out.write_all(b"</template>")
            }
            NodeKind::Element(tag) => {
                write!(out, "<{}", tag.as_str())?;
                for (k, v) in &attributes {
                    write!(out, " {}", k.as_str())?;
                    if !v.is_empty() {
                        out.write_all(b"=\"")?;
                        write_escaped(out, v, true)?;
                        out.write_all(b"\"")?;
                    }
                }
                out.write_all(b">")?;
                if is_void_element(&tag) {
                    return Ok(())
                }
                if let Some(shadow_root) = shadow_root {
                    shadow_root.print_html_fragment(out)?;
                }
                children.print_html_fragment(out)?;
                write!(out, "</{}>", tag.as_str())
            }
        }
    }
}

impl Print for [Element] {
    fn print_html_fragment(&self, out: &mut impl Write) -> std::io::Result<()> {
        for e in self {
            e.print_html_fragment(out)?;
        }
        Ok(())
    }
}

impl Print for Vec<Element> {
    fn print_html_fragment(&self, out: &mut impl Write) -> std::io::Result<()> {
        self.as_slice().print_html_fragment(out)
    }
}
