//! Parsing templates as HTML body fragments: no implied `<html>` or
//! `<head>`, the nodes end up as children of an implied `<body>`.
//!
//! Tokenization is done by html5gum, through `FragmentEmitter`, which
//! keeps attributes in source order and puts the tokenizer into the
//! raw text states for `<script>`, `<style>`, `<textarea>` and the
//! like. The tree is built here, applying the repairs browsers apply to
//! sloppy markup: implied end tags, implied table sections and rows,
//! void elements, content misplaced in tables moved in front of the
//! table, formatting elements split around the blocks opened inside
//! them, unclosed elements closed at the end of input. Malformed markup
//! never fails the parse.

use std::{collections::VecDeque, io::Read, mem};

use html5gum::{DefaultEmitter, Emitter, Error, State, Token, Tokenizer};
use kstring::KString;
use livedom::print::is_void_element;

use crate::{fragment::{FragmentElement, FragmentNode, ParsedDocument},
            error::{Result, TemplateError},
            trace};

// https://www.w3.org/International/questions/qa-byte-order-mark#problems
const BOM: &str = "\u{FEFF}";

/// Start tags that close an open `<p>`.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "dd", "details",
    "dialog", "dir", "div", "dl", "dt", "fieldset", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup",
    "hr", "li", "listing", "main", "menu", "nav", "ol", "p", "pre", "section",
    "summary", "table", "ul",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// An open element behind one of these is out of reach for end tags.
const SCOPE_BOUNDARIES: &[&str] = &[
    "applet", "caption", "html", "marquee", "object", "table", "td",
    "template", "th",
];

/// Boundaries for end tags of the table structure.
const TABLE_SCOPE: &[&str] = &["html", "table", "template"];

/// Only meaningful inside a `<table>`, dropped elsewhere.
const TABLE_PARTS: &[&str] = &[
    "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr",
];

const TABLE_SECTIONS: &[&str] = &["table", "tbody", "tfoot", "thead"];

/// While one of these is the current element, text and other elements
/// are put in front of the table instead.
const FOSTERING: &[&str] = &["table", "tbody", "tfoot", "thead", "tr"];

const FORMATTING: &[&str] = &[
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small",
    "strike", "strong", "tt", "u",
];

/// Non-void elements that a formatting element's end tag can't reach
/// into; the formatting element is split around them instead.
const BLOCKS: &[&str] = &[
    "address", "applet", "article", "aside", "blockquote", "button",
    "caption", "center", "colgroup", "dd", "details", "dir", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hgroup", "iframe", "li", "listing",
    "main", "marquee", "menu", "nav", "noembed", "noframes", "noscript",
    "object", "ol", "p", "plaintext", "pre", "script", "section", "select",
    "style", "summary", "table", "tbody", "td", "template", "textarea",
    "tfoot", "th", "thead", "title", "tr", "ul", "xmp",
];

/// Bound on the splits done for one end tag.
const MAX_FORMATTING_SPLITS: usize = 8;

fn kstring(bytes: Vec<u8>) -> KString {
    match String::from_utf8(bytes) {
        Ok(s) => KString::from_string(s),
        // The input was a str, so this doesn't happen in practice.
        Err(e) => KString::from_string(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}

type RawAttributes = Vec<(Vec<u8>, Vec<u8>)>;

enum MarkupToken {
    StartTag {
        name: Vec<u8>,
        /// In source order, each name once.
        attributes: RawAttributes,
        self_closing: bool,
    },
    Other(Token),
}

/// Wraps html5gum's `DefaultEmitter`, which stores start tag attributes
/// in a map sorted by name. The attributes are recorded here a second
/// time, in source order, with later duplicates of a name dropped.
/// Start tags of raw text elements switch the tokenizer's state.
#[derive(Debug)]
struct FragmentEmitter {
    inner: DefaultEmitter,
    in_start_tag: bool,
    current_attribute: Option<(Vec<u8>, Vec<u8>)>,
    attributes: RawAttributes,
    // attributes of emitted start tags not yet popped, oldest first
    emitted: VecDeque<RawAttributes>,
}

impl FragmentEmitter {
    fn new() -> Self {
        let mut inner = DefaultEmitter::default();
        inner.switch_states(true);
        FragmentEmitter {
            inner,
            in_start_tag: false,
            current_attribute: None,
            attributes: Vec::new(),
            emitted: VecDeque::new(),
        }
    }

    fn flush_current_attribute(&mut self) {
        if let Some((name, value)) = self.current_attribute.take() {
            if self.in_start_tag && !self.attributes.iter().any(|(n, _)| *n == name) {
                self.attributes.push((name, value));
            }
        }
    }
}

impl Emitter for FragmentEmitter {
    type Token = MarkupToken;

    fn set_last_start_tag(&mut self, last_start_tag: Option<&[u8]>) {
        self.inner.set_last_start_tag(last_start_tag)
    }

    fn emit_eof(&mut self) {
        self.inner.emit_eof()
    }

    fn emit_error(&mut self, error: Error) {
        self.inner.emit_error(error)
    }

    fn pop_token(&mut self) -> Option<MarkupToken> {
        Some(match self.inner.pop_token()? {
            Token::StartTag(tag) => MarkupToken::StartTag {
                name: tag.name.0,
                attributes: self.emitted.pop_front().unwrap_or_default(),
                self_closing: tag.self_closing,
            },
            token => MarkupToken::Other(token)
        })
    }

    fn emit_string(&mut self, s: &[u8]) {
        self.inner.emit_string(s)
    }

    fn init_start_tag(&mut self) {
        self.in_start_tag = true;
        self.current_attribute = None;
        self.attributes.clear();
        self.inner.init_start_tag()
    }

    fn init_end_tag(&mut self) {
        self.in_start_tag = false;
        self.current_attribute = None;
        self.inner.init_end_tag()
    }

    fn init_comment(&mut self) {
        self.inner.init_comment()
    }

    fn emit_current_tag(&mut self) -> Option<State> {
        self.flush_current_attribute();
        if self.in_start_tag {
            self.in_start_tag = false;
            self.emitted.push_back(mem::take(&mut self.attributes));
        }
        self.inner.emit_current_tag()
    }

    fn emit_current_comment(&mut self) {
        self.inner.emit_current_comment()
    }

    fn emit_current_doctype(&mut self) {
        self.inner.emit_current_doctype()
    }

    fn set_self_closing(&mut self) {
        self.inner.set_self_closing()
    }

    fn set_force_quirks(&mut self) {
        self.inner.set_force_quirks()
    }

    fn push_tag_name(&mut self, s: &[u8]) {
        self.inner.push_tag_name(s)
    }

    fn push_comment(&mut self, s: &[u8]) {
        self.inner.push_comment(s)
    }

    fn push_doctype_name(&mut self, s: &[u8]) {
        self.inner.push_doctype_name(s)
    }

    fn init_doctype(&mut self) {
        self.inner.init_doctype()
    }

    fn init_attribute(&mut self) {
        self.flush_current_attribute();
        self.current_attribute = Some(Default::default());
        self.inner.init_attribute()
    }

    fn push_attribute_name(&mut self, s: &[u8]) {
        if let Some((name, _)) = &mut self.current_attribute {
            name.extend_from_slice(s);
        }
        self.inner.push_attribute_name(s)
    }

    fn push_attribute_value(&mut self, s: &[u8]) {
        if let Some((_, value)) = &mut self.current_attribute {
            value.extend_from_slice(s);
        }
        self.inner.push_attribute_value(s)
    }

    fn set_doctype_public_identifier(&mut self, value: &[u8]) {
        self.inner.set_doctype_public_identifier(value)
    }

    fn set_doctype_system_identifier(&mut self, value: &[u8]) {
        self.inner.set_doctype_system_identifier(value)
    }

    fn push_doctype_public_identifier(&mut self, s: &[u8]) {
        self.inner.push_doctype_public_identifier(s)
    }

    fn push_doctype_system_identifier(&mut self, s: &[u8]) {
        self.inner.push_doctype_system_identifier(s)
    }

    fn current_is_appropriate_end_tag_token(&mut self) -> bool {
        self.inner.current_is_appropriate_end_tag_token()
    }
}

struct OpenElement {
    element: FragmentElement,
    // inserted in front of the table it was found in
    fostered: bool,
}

impl OpenElement {
    fn tag(&self) -> &str {
        self.element.tag.as_str()
    }
}

struct TreeBuilder {
    // The open elements; [0] is the implied body and is never popped.
    open: Vec<OpenElement>,
}

impl TreeBuilder {
    fn new() -> Self {
        TreeBuilder {
            open: vec![OpenElement {
                element: FragmentElement::new(KString::from_static("body")),
                fostered: false,
            }]
        }
    }

    fn current(&mut self) -> &mut FragmentElement {
        &mut self.open.last_mut().expect("body is never popped").element
    }

    fn current_tag(&self) -> &str {
        self.open.last().expect("body is never popped").tag()
    }

    fn append(&mut self, node: FragmentNode) {
        self.current().children.push(node);
    }

    fn append_text_to(&mut self, index: usize, text: KString) {
        let children = &mut self.open[index].element.children;
        if let Some(FragmentNode::Text(last)) = children.last_mut() {
            let mut s = String::with_capacity(last.len() + text.len());
            s.push_str(last);
            s.push_str(&text);
            *last = KString::from_string(s);
        } else {
            children.push(FragmentNode::Text(text));
        }
    }

    fn append_text(&mut self, text: KString) {
        if text.is_empty() {
            return
        }
        let index = if self.fostering() && !text.trim_matches(is_html_space).is_empty() {
            trace!("moving text {:?} in front of its table", text.as_str());
            self.foster_parent(self.open.len())
        } else {
            self.open.len() - 1
        };
        self.append_text_to(index, text);
    }

    /// Whether content arriving now belongs in front of the table.
    fn fostering(&self) -> bool {
        FOSTERING.contains(&self.current_tag())
    }

    /// Index of the element holding the innermost table among the
    /// first `len` open elements.
    fn foster_parent(&self, len: usize) -> usize {
        match self.open[..len].iter().rposition(|e| e.tag() == "table") {
            Some(table) => table.saturating_sub(1),
            None => len.saturating_sub(1),
        }
    }

    /// Close the current element.
    fn pop(&mut self) {
        if self.open.len() > 1 {
            let OpenElement { element, fostered } = self.open.pop().expect("checked len");
            let len = self.open.len();
            let parent = if fostered { self.foster_parent(len) } else { len - 1 };
            self.open[parent].element.children.push(FragmentNode::Element(element));
        }
    }

    fn pop_to_len(&mut self, len: usize) {
        while self.open.len() > len.max(1) {
            self.pop();
        }
    }

    /// Pops until the current element is one of `tags`, or the body.
    fn clear_to(&mut self, tags: &[&str]) {
        while self.open.len() > 1 && !tags.contains(&self.current_tag()) {
            self.pop();
        }
    }

    fn open_implied(&mut self, tag: &'static str) {
        self.open.push(OpenElement {
            element: FragmentElement::new(KString::from_static(tag)),
            fostered: false,
        });
    }

    fn has_open(&self, tag: &str) -> bool {
        self.open.iter().skip(1).any(|e| e.tag() == tag)
    }

    /// Index of the innermost open element with one of the `tags`,
    /// unless an element in `boundaries` is open after it.
    fn in_scope(&self, tags: &[&str], boundaries: &[&[&str]]) -> Option<usize> {
        for (i, e) in self.open.iter().enumerate().skip(1).rev() {
            let tag = e.tag();
            if tags.contains(&tag) {
                return Some(i)
            }
            if boundaries.iter().any(|b| b.contains(&tag)) {
                return None
            }
        }
        None
    }

    fn close_within(&mut self, tags: &[&str], boundaries: &[&[&str]]) -> bool {
        if let Some(i) = self.in_scope(tags, boundaries) {
            self.pop_to_len(i);
            true
        } else {
            false
        }
    }

    /// Closes the innermost element in scope with one of the `tags`,
    /// along with everything opened after it.
    fn close(&mut self, tags: &[&str], extra_boundaries: &[&str]) -> bool {
        self.close_within(tags, &[SCOPE_BOUNDARIES, extra_boundaries])
    }

    /// End tag of a formatting element. If blocks were opened inside
    /// it, the formatting element is closed in front of the first of
    /// them, and a copy of it takes over that block's contents:
    /// `<b><p>x</b>y` gives `<b></b><p><b>x</b>y</p>`.
    fn end_formatting(&mut self, name: &str) {
        for _ in 0..MAX_FORMATTING_SPLITS {
            let Some(formatting) = self.in_scope(&[name], &[SCOPE_BOUNDARIES]) else {
                trace!("ignoring stray </{name}>");
                return
            };
            let Some(block) = (formatting + 1..self.open.len())
                .find(|&i| BLOCKS.contains(&self.open[i].tag()))
            else {
                self.pop_to_len(formatting);
                return
            };
            trace!("</{name}> crosses <{}>, splitting <{name}>", self.open[block].tag());
            let outer = &self.open[formatting];
            let fostered = outer.fostered;
            let mut copy = FragmentElement::new(outer.element.tag.clone());
            copy.attributes = outer.element.attributes.clone();

            let mut inner = self.open.split_off(block);
            self.pop_to_len(formatting);
            let mut block = inner.remove(0);
            copy.children = mem::take(&mut block.element.children);
            block.fostered = fostered;
            self.open.push(block);
            self.open.push(OpenElement { element: copy, fostered: false });
            self.open.extend(inner);
        }
    }

    fn start_tag(
        &mut self,
        tag: KString,
        attributes: Vec<(KString, KString)>,
        self_closing: bool
    ) {
        let name = tag.as_str();
        if matches!(name, "html" | "head" | "body") {
            trace!("ignoring <{name}> in body fragment");
            return
        }
        if TABLE_PARTS.contains(&name) {
            if !self.has_open("table") {
                trace!("ignoring <{name}> outside of a table");
                return
            }
            match name {
                "caption" | "colgroup" | "tbody" | "tfoot" | "thead" =>
                    self.clear_to(&["table"]),
                "col" =>
                    self.clear_to(&["table", "colgroup"]),
                "tr" => {
                    self.clear_to(TABLE_SECTIONS);
                    if self.current_tag() == "table" {
                        self.open_implied("tbody");
                    }
                }
                _ => {
                    // td, th
                    self.clear_to(&["table", "tbody", "tfoot", "thead", "tr"]);
                    if self.current_tag() == "table" {
                        self.open_implied("tbody");
                    }
                    if self.current_tag() != "tr" {
                        self.open_implied("tr");
                    }
                }
            }
        } else {
            if name == "table" && self.fostering() {
                trace!("<table> directly inside a table, closing the outer one");
                self.close_within(&["table"], &[TABLE_SCOPE]);
            }
            if CLOSES_P.contains(&name) {
                self.close(&["p"], &["button"]);
            }
            match name {
                "li" => {
                    self.close(&["li"], &["ol", "ul"]);
                }
                "dt" | "dd" => {
                    self.close(&["dt", "dd"], &["dl"]);
                }
                "option" => {
                    if self.current_tag() == "option" {
                        self.pop();
                    }
                }
                "optgroup" => {
                    if self.current_tag() == "option" {
                        self.pop();
                    }
                    if self.current_tag() == "optgroup" {
                        self.pop();
                    }
                }
                "a" => {
                    if self.has_open("a") {
                        trace!("<a> inside <a>, closing the outer one");
                        self.close(&["a"], &[]);
                    }
                }
                _ if HEADINGS.contains(&name) => {
                    if HEADINGS.contains(&self.current_tag()) {
                        self.pop();
                    }
                }
                _ => ()
            }
        }

        let fostered = self.fostering() && !stays_in_table(name, &attributes);
        if fostered {
            trace!("moving <{name}> in front of its table");
        }
        let element = FragmentElement {
            tag,
            attributes,
            children: Vec::new(),
        };
        if self_closing || is_void_element(&element.tag) {
            let parent = if fostered {
                self.foster_parent(self.open.len())
            } else {
                self.open.len() - 1
            };
            self.open[parent].element.children.push(FragmentNode::Element(element));
        } else {
            self.open.push(OpenElement { element, fostered });
        }
    }

    fn end_tag(&mut self, tag: KString) {
        match tag.as_str() {
            "html" | "head" | "body" => (),
            "p" => {
                if !self.close(&["p"], &["button"]) {
                    // </p> without <p> gives an empty paragraph
                    self.append(FragmentNode::Element(
                        FragmentElement::new(KString::from_static("p"))));
                }
            }
            "br" => self.append(FragmentNode::Element(
                FragmentElement::new(KString::from_static("br")))),
            "li" => {
                if !self.close(&["li"], &["ol", "ul"]) {
                    trace!("ignoring stray </li>");
                }
            }
            name if TABLE_PARTS.contains(&name) || name == "table" => {
                // cells don't shield the table structure around them
                if !self.close_within(&[name], &[TABLE_SCOPE]) {
                    trace!("ignoring stray </{name}>");
                }
            }
            name @ ("dt" | "dd") => {
                if !self.close(&[name], &["dl"]) {
                    trace!("ignoring stray </{name}>");
                }
            }
            name if FORMATTING.contains(&name) => self.end_formatting(name),
            name => {
                if !self.close(&[name], &[]) {
                    trace!("ignoring stray </{name}>");
                }
            }
        }
    }

    fn token(&mut self, token: MarkupToken) {
        match token {
            MarkupToken::StartTag { name, attributes, self_closing } => {
                let attributes = attributes.into_iter()
                    .map(|(k, v)| (kstring(k), kstring(v)))
                    .collect();
                self.start_tag(kstring(name), attributes, self_closing);
            }
            MarkupToken::Other(Token::StartTag(_)) => (),
            MarkupToken::Other(Token::EndTag(endtag)) => self.end_tag(kstring(endtag.name.0)),
            MarkupToken::Other(Token::String(s)) => self.append_text(kstring(s.0)),
            MarkupToken::Other(Token::Comment(s)) =>
                self.append(FragmentNode::Comment(kstring(s.0))),
            MarkupToken::Other(Token::Doctype(_)) => trace!("dropping doctype in body fragment"),
            MarkupToken::Other(Token::Error(e)) => trace!("markup error: {e}"),
        }
    }

    fn finish(mut self) -> ParsedDocument {
        self.pop_to_len(1);
        ParsedDocument::new(self.open.pop().expect("body is never popped").element)
    }
}

fn is_html_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

/// Elements that are kept inside a table even where text isn't.
fn stays_in_table(name: &str, attributes: &[(KString, KString)]) -> bool {
    match name {
        "table" | "script" | "style" | "template" => true,
        "input" => attributes.iter().any(|(k, v)| {
            k.as_str() == "type" && v.eq_ignore_ascii_case("hidden")
        }),
        _ => TABLE_PARTS.contains(&name),
    }
}

/// Parse markup as the contents of a `<body>`.
pub fn parse_body_fragment(source: &str) -> ParsedDocument {
    let source = source.strip_prefix(BOM).unwrap_or(source);
    let mut builder = TreeBuilder::new();
    for token in Tokenizer::new_with_emitter(source, FragmentEmitter::new()).infallible() {
        builder.token(token);
    }
    builder.finish()
}

/// Reads the whole stream, decodes it as UTF-8 (invalid sequences
/// become U+FFFD) and parses it as a body fragment.
pub fn parse_stream(stream: &mut dyn Read) -> Result<ParsedDocument> {
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).map_err(
        |e| TemplateError::io("reading template stream", e))?;
    Ok(parse_body_fragment(&String::from_utf8_lossy(&bytes)))
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    // Compact rendering of the tree shape, text in quotes, comments
    // as `#c`.
    fn outline(e: &FragmentElement) -> String {
        let children: Vec<String> = e.children.iter().map(|c| match c {
            FragmentNode::Element(e) => outline(e),
            FragmentNode::Text(t) => format!("{:?}", t.as_str()),
            FragmentNode::Comment(_) => "#c".into(),
            FragmentNode::Doctype(_) => "#doctype".into(),
        }).collect();
        if children.is_empty() {
            e.tag.to_string()
        } else {
            format!("{}({})", e.tag.as_str(), children.join(","))
        }
    }

    fn parse(s: &str) -> String {
        outline(parse_body_fragment(s).body())
    }

    #[test]
    fn t_basic() {
        assert_eq!(parse("<div><span>a</span>b</div>"), "body(div(span(\"a\"),\"b\"))");
        assert_eq!(parse("text only"), "body(\"text only\")");
        assert_eq!(parse(""), "body");
        assert_eq!(parse("<!-- note -->"), "body(#c)");
    }

    #[test]
    fn t_whitespace_kept() {
        assert_eq!(parse("<b> x </b>\n"), "body(b(\" x \"),\"\\n\")");
    }

    #[test]
    fn t_unclosed() {
        assert_eq!(parse("<div><span>x"), "body(div(span(\"x\")))");
        assert_eq!(parse("<div><span>x</div>y"), "body(div(span(\"x\")),\"y\")");
    }

    #[test]
    fn t_implied_p_end() {
        assert_eq!(parse("<p>one<p>two"), "body(p(\"one\"),p(\"two\"))");
        assert_eq!(parse("<p>a<div>b</div>"), "body(p(\"a\"),div(\"b\"))");
        assert_eq!(parse("<p>a<span>b</span>"), "body(p(\"a\",span(\"b\")))");
        assert_eq!(parse("</p>"), "body(p)");
        // a button shields its <p> from the </p> of the inner one
        assert_eq!(parse("<p><button><p>x</p></button>"),
                   "body(p(button(p(\"x\"))))");
    }

    #[test]
    fn t_lists() {
        assert_eq!(parse("<ul><li>one<li>two</ul>"), "body(ul(li(\"one\"),li(\"two\")))");
        assert_eq!(parse("<ul><li>a<ul><li>b</ul><li>c</ul>"),
                   "body(ul(li(\"a\",ul(li(\"b\"))),li(\"c\")))");
        assert_eq!(parse("<dl><dt>t<dd>d<dt>u</dl>"),
                   "body(dl(dt(\"t\"),dd(\"d\"),dt(\"u\")))");
        assert_eq!(parse("<select><option>a<option>b</select>"),
                   "body(select(option(\"a\"),option(\"b\")))");
    }

    #[test]
    fn t_tables() {
        assert_eq!(parse("<table><tr><td>a<td>b<tr><th>c</table>"),
                   "body(table(tbody(tr(td(\"a\"),td(\"b\")),tr(th(\"c\")))))");
        assert_eq!(parse("<table><td>x</table>"),
                   "body(table(tbody(tr(td(\"x\")))))");
        assert_eq!(parse("<table><thead><tr><th>h<tbody><tr><td>d</table>"),
                   "body(table(thead(tr(th(\"h\"))),tbody(tr(td(\"d\")))))");
        // outside of tables the tags vanish, their contents stay
        assert_eq!(parse("<tr><td>x</td></tr>"), "body(\"x\")");
    }

    #[test]
    fn t_void_and_self_closing() {
        assert_eq!(parse("<input id=a><span>s</span>"), "body(input,span(\"s\"))");
        assert_eq!(parse("<p>a<br>b</p>"), "body(p(\"a\",br,\"b\"))");
        assert_eq!(parse("<my-widget/><b>x</b>"), "body(my-widget,b(\"x\"))");
        assert_eq!(parse("x</br>y"), "body(\"x\",br,\"y\")");
        assert_eq!(parse("<img src=a></img>z"), "body(img,\"z\")");
    }

    #[test]
    fn t_stray_and_document_tags() {
        assert_eq!(parse("</span>x"), "body(\"x\")");
        assert_eq!(parse("<!DOCTYPE html><html><head></head><body><p>x</p></body></html>"),
                   "body(p(\"x\"))");
        assert_eq!(parse("<a href=1>one<a href=2>two</a>"),
                   "body(a(\"one\"),a(\"two\"))");
        assert_eq!(parse("<h1>a<h2>b</h2>"), "body(h1(\"a\"),h2(\"b\"))");
    }

    #[test]
    fn t_attributes() {
        let doc = parse_body_fragment(
            "<div id=\"a\" .Text-Prop=\"hi\" %count=\"3\" !flag title='x &amp; y'>");
        let div = doc.body().child_elements().next().expect("a div");
        assert_eq!(div.tag.as_str(), "div");
        assert_eq!(div.attribute("id"), Some("a"));
        assert_eq!(div.attribute(".text-prop"), Some("hi"));
        assert_eq!(div.attribute("%count"), Some("3"));
        assert_eq!(div.attribute("!flag"), Some(""));
        assert_eq!(div.attribute("title"), Some("x & y"));
        let names: Vec<&str> = div.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["id", ".text-prop", "%count", "!flag", "title"]);
    }

    #[test]
    fn t_attribute_source_order() {
        let doc = parse_body_fragment("<div title class id></div><p z=1 a=2 z=3 m=4></p>");
        let mut elements = doc.body().child_elements();
        let names = |e: &FragmentElement| -> Vec<String> {
            e.attributes.iter().map(|(k, v)| format!("{}={}", k.as_str(), v.as_str())).collect()
        };
        assert_eq!(names(elements.next().expect("div")), ["title=", "class=", "id="]);
        assert_eq!(names(elements.next().expect("p")), ["z=1", "a=2", "m=4"]);
        // distinct names for the same property, kept in order
        let doc = parse_body_fragment("<div .x=\"s\" !x>");
        let div = doc.body().child_elements().next().expect("a div");
        assert_eq!(names(div), [".x=s", "!x="]);
    }

    #[test]
    fn t_raw_text_elements() {
        assert_eq!(parse("<textarea id=t><b>x</b></textarea>"),
                   "body(textarea(\"<b>x</b>\"))");
        assert_eq!(parse("<style>a &amp; b</style>"), "body(style(\"a &amp; b\"))");
        assert_eq!(parse("<script>if (a<b && c) {}</script><p>after</p>"),
                   "body(script(\"if (a<b && c) {}\"),p(\"after\"))");
        // escapable: references are decoded, tags are not
        assert_eq!(parse("<title>a &amp; <i>b</i></title>"),
                   "body(title(\"a & <i>b</i>\"))");
        let doc = parse_body_fragment("<textarea id=t name=n>x</textarea>");
        let textarea = doc.body().child_elements().next().expect("a textarea");
        assert_eq!(textarea.attribute("name"), Some("n"));
    }

    #[test]
    fn t_foster_parenting() {
        assert_eq!(parse("<table>hello<tr><td>x</table>"),
                   "body(\"hello\",table(tbody(tr(td(\"x\")))))");
        assert_eq!(parse("<table><div>a</div><tr><td>b</td></tr></table>"),
                   "body(div(\"a\"),table(tbody(tr(td(\"b\")))))");
        assert_eq!(parse("<p>x</p><table><tr>oops<br><td>c</td></tr></table>"),
                   "body(p(\"x\"),\"oops\",br,table(tbody(tr(td(\"c\")))))");
        // whitespace stays, and so does the table's own content
        assert_eq!(parse("<table> <tr><td>x</td></tr>\n</table>"),
                   "body(table(\" \",tbody(tr(td(\"x\")),\"\\n\")))");
        // nothing is moved out of cells
        assert_eq!(parse("<table><td><b>y</b></table>"),
                   "body(table(tbody(tr(td(b(\"y\"))))))");
    }

    #[test]
    fn t_misnested_formatting() {
        assert_eq!(parse("<b><p>x</b>y</p>"), "body(b,p(b(\"x\"),\"y\"))");
        assert_eq!(parse("<b>1<p>2</b>3</p>"), "body(b(\"1\"),p(b(\"2\"),\"3\"))");
        // without a block inside, a plain close
        assert_eq!(parse("<b>1<i>2</b>3"), "body(b(\"1\",i(\"2\")),\"3\")");
        assert_eq!(parse("<p>a<em>b</p>c"), "body(p(\"a\",em(\"b\")),\"c\")");
        let doc = parse_body_fragment("<a href=u><div>x</a></div>");
        let div = doc.body().child_elements().nth(1).expect("a div");
        let copy = div.child_elements().next().expect("a copy of the link");
        assert_eq!(copy.tag.as_str(), "a");
        assert_eq!(copy.attribute("href"), Some("u"));
    }

    #[test]
    fn t_duplicate_attribute_keeps_first() {
        let doc = parse_body_fragment("<b id=x id=y></b>");
        let b = doc.body().child_elements().next().expect("a b");
        assert_eq!(b.attribute("id"), Some("x"));
    }

    #[test]
    fn t_character_references() {
        assert_eq!(parse("<b>a &lt; b &amp;&amp; c</b>"), "body(b(\"a < b && c\"))");
    }

    #[test]
    fn t_stream() -> Result<()> {
        let mut bytes = BOM.as_bytes().to_vec();
        bytes.extend_from_slice(b"<b>ok</b>\xff");
        let doc = parse_stream(&mut Cursor::new(bytes))?;
        assert_eq!(outline(doc.body()), "body(b(\"ok\"),\"\u{FFFD}\")");
        Ok(())
    }

    #[test]
    fn t_count() {
        let doc = parse_body_fragment("<div>a<!-- c --><span>b</span></div>text");
        // body, div, "a", span, "b", "text"
        assert_eq!(doc.body().count_elements_and_text(), 6);
    }
}
