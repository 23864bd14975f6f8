//! String conversions used by the attribute mini-language.

/// Upper-case the first character, leave the rest alone.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new()
    }
}

#[test]
fn t_capitalize() {
    assert_eq!(capitalize(""), "");
    assert_eq!(capitalize("hey"), "Hey");
    assert_eq!(capitalize("hEY"), "HEY");
    assert_eq!(capitalize("ärger"), "Ärger");
}


/// `"reveal-button-hidden"` -> `"revealButtonHidden"`. The first
/// segment is kept as is, every following one is capitalized; empty
/// segments (from doubled or trailing dashes) vanish.
pub fn dash_separated_to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, part) in s.split('-').enumerate() {
        if i == 0 {
            out.push_str(part);
        } else {
            out.push_str(&capitalize(part));
        }
    }
    out
}

#[test]
fn t_dash_separated_to_camel_case() {
    assert_eq!(dash_separated_to_camel_case("flag"), "flag");
    assert_eq!(dash_separated_to_camel_case("text-prop"), "textProp");
    assert_eq!(dash_separated_to_camel_case("reveal-button-hidden"),
               "revealButtonHidden");
    assert_eq!(dash_separated_to_camel_case("a--b"), "aB");
    assert_eq!(dash_separated_to_camel_case("trailing-"), "trailing");
    assert_eq!(dash_separated_to_camel_case("-leading"), "Leading");
    assert_eq!(dash_separated_to_camel_case(""), "");
}


/// The last path-like segment of a type name, e.g. for
/// `std::any::type_name` output.
pub fn simple_type_name(full: &str) -> &str {
    // Ignore generic arguments, their paths contain "::" too.
    let base = match full.find('<') {
        Some(i) => &full[..i],
        None => full
    };
    match base.rfind("::") {
        Some(i) => &base[i + 2..],
        None => base
    }
}

#[test]
fn t_simple_type_name() {
    assert_eq!(simple_type_name("htmltemplate::components::Div"), "Div");
    assert_eq!(simple_type_name("Div"), "Div");
    assert_eq!(simple_type_name("a::Wrapper<b::C>"), "Wrapper");
}
