//! Building live elements from a parsed template.
//!
//! Attribute names carry a small mini-language, checked in this order:
//!
//! * `!name`: boolean property `name` (camelCased), true for `""`,
//!   `"1"` and any case of `"true"`.
//! * `.name`: string property, value taken verbatim.
//! * `%name`: numeric property, value parsed as `f64`.
//! * anything else: a plain attribute; an empty value makes it a
//!   boolean (present, valueless) attribute.
//!
//! Elements with a plain, non-empty `id` attribute are recorded in the
//! returned `IdMap`; of several elements with the same id, the last one
//! in document order wins. Comments are dropped.

use std::collections::HashMap;

use kstring::KString;
use livedom::Element;

use crate::{fragment::{FragmentElement, FragmentNode},
            error::{Result, TemplateErrorKind},
            str_util::dash_separated_to_camel_case,
            trace};

/// Identifier -> the live element carrying it, for one instantiation.
pub type IdMap = HashMap<KString, Element>;

pub fn parse_boolean_property(value: &str) -> bool {
    value.is_empty() || value == "1" || value.eq_ignore_ascii_case("true")
}

pub fn parse_numeric_property(property: &str, value: &str) -> Result<f64> {
    value.trim().parse().map_err(|_| TemplateErrorKind::NumericProperty {
        property: KString::from_ref(property),
        value: KString::from_ref(value),
    }.into())
}

/// Apply one source attribute to `element`.
pub fn apply_attribute(element: &Element, name: &str, value: &str) -> Result<()> {
    if let Some(name) = name.strip_prefix('!') {
        element.set_property(dash_separated_to_camel_case(name),
                             parse_boolean_property(value));
    } else if let Some(name) = name.strip_prefix('.') {
        element.set_property(dash_separated_to_camel_case(name), value);
    } else if let Some(name) = name.strip_prefix('%') {
        let name = dash_separated_to_camel_case(name);
        let number = parse_numeric_property(&name, value)?;
        element.set_property(name, number);
    } else if value.is_empty() {
        element.set_attribute_bool(name, true);
    } else {
        element.set_attribute(name, value);
    }
    Ok(())
}

fn convert_element(source: &FragmentElement, ids: &mut IdMap) -> Result<Element> {
    let element = Element::new(&source.tag);
    for (name, value) in &source.attributes {
        apply_attribute(&element, name, value)?;
    }
    if let Some(id) = source.attribute("id") {
        if !id.is_empty() {
            let id = KString::from_ref(id);
            if ids.contains_key(&id) {
                trace!("duplicate id {:?}, the later element wins", id.as_str());
            }
            ids.insert(id, element.clone());
        }
    }
    for child in &source.children {
        if let Some(child) = convert_node(child, ids)? {
            element.append_child(child);
        }
    }
    Ok(element)
}

/// The live node for `node`, or `None` for nodes that are dropped.
pub fn convert_node(node: &FragmentNode, ids: &mut IdMap) -> Result<Option<Element>> {
    match node {
        FragmentNode::Element(e) => convert_element(e, ids).map(Some),
        FragmentNode::Text(text) => Ok(Some(Element::create_text(text))),
        FragmentNode::Comment(_) => Ok(None),
        FragmentNode::Doctype(_) => Err(TemplateErrorKind::UnsupportedNode {
            kind: node.kind_name()
        }.into()),
    }
}

/// Convert `root` and all of its descendants.
pub fn convert(root: &FragmentElement) -> Result<(Element, IdMap)> {
    let mut ids = IdMap::new();
    let element = convert_element(root, &mut ids)?;
    Ok((element, ids))
}

/// Convert the children of `body` and append them to `parent`. Nothing
/// is appended if the conversion fails.
pub fn convert_into(body: &FragmentElement, parent: &Element) -> Result<IdMap> {
    let mut ids = IdMap::new();
    let mut children = Vec::with_capacity(body.children.len());
    for child in &body.children {
        if let Some(child) = convert_node(child, &mut ids)? {
            children.push(child);
        }
    }
    parent.append_children(children);
    Ok(ids)
}


#[cfg(test)]
mod tests {
    use livedom::{PropertyValue, Print};

    use super::*;
    use crate::{parser::parse_body_fragment, error::TemplateError};

    fn convert_str(s: &str) -> Result<(Element, IdMap)> {
        convert(parse_body_fragment(s).body())
    }

    fn first_child(e: &Element) -> Element {
        e.children().into_iter().next().expect("a child")
    }

    #[test]
    fn t_mini_language() -> Result<()> {
        let (body, ids) = convert_str(r#"<div id="a" .text-prop="hi" %count="3" !flag>"#)?;
        let div = first_child(&body);
        assert_eq!(div.tag().as_deref(), Some("div"));
        assert_eq!(div.property("textProp"), Some(PropertyValue::String("hi".into())));
        assert_eq!(div.property("count"), Some(PropertyValue::Number(3.0)));
        assert_eq!(div.property("flag"), Some(PropertyValue::Bool(true)));
        assert_eq!(div.attribute("id").as_deref(), Some("a"));
        // prefixed names are not attributes
        assert_eq!(div.attributes().len(), 1);
        assert!(ids["a"].same_node(&div));
        assert_eq!(ids.len(), 1);
        Ok(())
    }

    #[test]
    fn t_boolean_values() -> Result<()> {
        let (body, _) = convert_str(
            r#"<p !a="" !b="TRUE" !c="1" !d="false" !e="yes" !f="0" !multi-word-name></p>"#)?;
        let p = first_child(&body);
        let get = |n: &str| p.property(n).and_then(|v| v.as_bool());
        assert_eq!(get("a"), Some(true));
        assert_eq!(get("b"), Some(true));
        assert_eq!(get("c"), Some(true));
        assert_eq!(get("d"), Some(false));
        assert_eq!(get("e"), Some(false));
        assert_eq!(get("f"), Some(false));
        assert_eq!(get("multiWordName"), Some(true));
        Ok(())
    }

    #[test]
    fn t_plain_attributes() -> Result<()> {
        let (body, ids) = convert_str(r#"<button disabled class="x y" id="">b</button>"#)?;
        let b = first_child(&body);
        assert_eq!(b.attribute("class").as_deref(), Some("x y"));
        assert!(b.has_attribute("disabled"));
        assert_eq!(b.attribute("disabled").as_deref(), Some(""));
        assert!(ids.is_empty());
        assert_eq!(body.to_html_fragment_string(),
                   "<body><button disabled class=\"x y\" id>b</button></body>");
        Ok(())
    }

    #[test]
    fn t_numbers() -> Result<()> {
        let (body, _) = convert_str(r#"<i %a=" 2.5 " %b="-1e3" %max-length="20"></i>"#)?;
        let i = first_child(&body);
        assert_eq!(i.property("a").and_then(|v| v.as_number()), Some(2.5));
        assert_eq!(i.property("b").and_then(|v| v.as_number()), Some(-1000.0));
        assert_eq!(i.property("maxLength").and_then(|v| v.as_number()), Some(20.0));

        let e: TemplateError = convert_str(r#"<i %max-length="twenty"></i>"#)
            .err().expect("not a number");
        assert_eq!(e.to_string(),
                   "cannot parse value \"twenty\" for numeric property \"maxLength\"");
        match e.kind() {
            TemplateErrorKind::NumericProperty { property, .. } =>
                assert_eq!(property.as_str(), "maxLength"),
            _ => panic!("wrong kind: {e:?}")
        }
        Ok(())
    }

    #[test]
    fn t_empty_number() {
        let e = convert_str(r#"<i %n=""></i>"#).err().expect("empty is not a number");
        assert_eq!(e.to_string(), "cannot parse value \"\" for numeric property \"n\"");
        let e = convert_str("<i %n>").err().expect("valueless is not a number");
        assert!(matches!(e.kind(), TemplateErrorKind::NumericProperty { .. }));
    }

    #[test]
    fn t_later_attribute_wins() -> Result<()> {
        // same property through two prefixes: source order decides
        let (body, _) = convert_str(r#"<div .x="s" !x></div><div !x .x="s"></div>"#)?;
        let divs = body.children();
        assert_eq!(divs[0].property("x"), Some(PropertyValue::Bool(true)));
        assert_eq!(divs[1].property("x"), Some(PropertyValue::String("s".into())));
        Ok(())
    }

    #[test]
    fn t_duplicate_ids_last_wins() -> Result<()> {
        let (body, ids) = convert_str(
            r#"<span id="x">first</span><div><b id="x">second</b></div>"#)?;
        assert_eq!(ids.len(), 1);
        assert_eq!(ids["x"].text_content(), "second");
        assert_eq!(ids["x"].tag().as_deref(), Some("b"));
        assert_eq!(body.child_count(), 2);
        Ok(())
    }

    #[test]
    fn t_comment_only() -> Result<()> {
        let (body, ids) = convert_str("<!-- note -->")?;
        assert_eq!(body.child_count(), 0);
        assert!(ids.is_empty());
        Ok(())
    }

    #[test]
    fn t_no_comments_and_node_count() -> Result<()> {
        let doc = parse_body_fragment(
            "<div>a<!-- x --><ul><li>one<!-- y --><li>two</ul>\n  <b> text </b></div><!-- z -->");
        let (body, _) = convert(doc.body())?;
        let mut count = 0;
        body.for_each_descendant(&mut |e| {
            count += 1;
            assert!(e.is_text() || e.tag().is_some());
        });
        assert_eq!(count, doc.body().count_elements_and_text());
        assert!(!body.to_html_fragment_string().contains("<!--"));
        // text is kept as is
        assert_eq!(body.text_content(), "aonetwo\n   text ");
        Ok(())
    }

    #[test]
    fn t_unsupported_node() {
        let mut root = FragmentElement::new(KString::from_static("body"));
        root.children.push(FragmentNode::Doctype(KString::from_static("html")));
        let e = convert(&root).err().expect("doctype is rejected");
        assert!(matches!(e.kind(), TemplateErrorKind::UnsupportedNode { kind: "doctype" }));
    }

    #[test]
    fn t_convert_into() -> Result<()> {
        let host = Element::new("div");
        let root = host.attach_shadow();
        let doc = parse_body_fragment("<span id=s>s</span>text");
        let ids = convert_into(doc.body(), &root)?;
        assert_eq!(root.child_count(), 2);
        assert_eq!(host.child_count(), 0);
        assert!(ids["s"].same_node(&root.children()[0]));

        // on failure, nothing is appended
        let bad = parse_body_fragment("<b>ok</b><i %n=x></i>");
        let target = Element::new("div");
        assert!(convert_into(bad.body(), &target).is_err());
        assert_eq!(target.child_count(), 0);
        Ok(())
    }
}
