//! Generic descriptor deserializer
//!
//! Descriptor files are loosely schematized: almost every field may appear
//! as a single value or a list, and third-party tools emit them with
//! inconsistent indentation and prologs. This module parses the raw text
//! into a schema-free tree; field meaning is applied later by the mapper.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// A node of the generic descriptor tree.
///
/// Elements with child elements become [`DocValue::Map`]; a repeated child
/// tag coalesces into a [`DocValue::List`]. Childless elements become
/// scalar leaves, with fully-numeric text coerced to [`DocValue::Num`] and
/// empty text to [`DocValue::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    Map(HashMap<String, DocValue>),
    List(Vec<DocValue>),
    Str(String),
    Num(f64),
    Null,
}

impl DocValue {
    pub fn as_map(&self) -> Option<&HashMap<String, DocValue>> {
        match self {
            DocValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Scalar text, coercing numeric leaves back to their string form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            DocValue::Str(s) => Some(s.clone()),
            DocValue::Num(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DocValue::Num(n) => Some(*n),
            DocValue::Str(s) => parse_number(s),
            _ => None,
        }
    }

    /// Values the mapper treats as "absent": missing text, empty strings
    /// and literal-zero placeholders. Maps and lists are never falsy.
    pub fn is_falsy(&self) -> bool {
        match self {
            DocValue::Null => true,
            DocValue::Str(s) => s.is_empty(),
            DocValue::Num(n) => *n == 0.0,
            DocValue::List(_) | DocValue::Map(_) => false,
        }
    }
}

/// Preprocessing switches for [`parse_document`].
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    /// Replace runs of exactly four spaces with newlines before parsing.
    ///
    /// Compatibility workaround for descriptors indented with four-space
    /// runs inside leaf text, which otherwise merge into the surrounding
    /// content when the document is malformed. Stricter inputs can turn
    /// this off.
    pub collapse_indent: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            collapse_indent: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML parse error: unclosed element <{0}>")]
    UnclosedElement(String),
}

/// Parse descriptor text into the generic tree.
///
/// The returned value is a map keyed by the root element's tag name, so a
/// `<ModMetaData>` document yields `Map { "ModMetaData" => ... }`.
pub fn parse_document(text: &str, options: &DocumentOptions) -> Result<DocValue, DocumentError> {
    let cleaned = preprocess(text, options);

    let mut reader = Reader::from_str(&cleaned);
    reader.config_mut().trim_text(true);

    // Frame per open element: tag name, child (tag, value) pairs in
    // document order, and accumulated text content.
    struct Frame {
        tag: String,
        children: Vec<(String, DocValue)>,
        text: String,
    }

    // Synthetic root frame collects the document's top-level elements.
    let mut stack = vec![Frame {
        tag: String::new(),
        children: Vec::new(),
        text: String::new(),
    }];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(Frame {
                    tag,
                    children: Vec::new(),
                    text: String::new(),
                });
            }
            Event::Empty(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push((tag, DocValue::Null));
                }
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last_mut() {
                    // malformed entity references keep their raw text
                    match e.unescape() {
                        Ok(text) => frame.text.push_str(&text),
                        Err(_) => frame.text.push_str(&String::from_utf8_lossy(&e)),
                    }
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack.pop().expect("parser emitted unbalanced end tag");
                let value = finish_frame(frame.children, frame.text);
                if let Some(parent) = stack.last_mut() {
                    parent.children.push((frame.tag, value));
                }
            }
            Event::Eof => break,
            // Prolog remnants, comments and doctypes carry no field data.
            _ => {}
        }
    }

    if stack.len() > 1 {
        let frame = stack.pop().expect("checked non-empty");
        return Err(DocumentError::UnclosedElement(frame.tag));
    }
    let root = stack.pop().expect("root frame always present");
    Ok(coalesce(root.children))
}

fn preprocess(text: &str, options: &DocumentOptions) -> String {
    // Drop any `<?xml ...?>` prolog; some descriptors declare encodings
    // the parser rejects under certain locales.
    let text = match text.find("?>") {
        Some(idx) => &text[idx + 2..],
        None => text,
    };

    if options.collapse_indent {
        text.replace("    ", "\n")
    } else {
        text.to_string()
    }
}

/// Build the value for a closed element from its children and text.
fn finish_frame(children: Vec<(String, DocValue)>, text: String) -> DocValue {
    if !children.is_empty() {
        return coalesce(children);
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        DocValue::Null
    } else if let Some(n) = parse_number(trimmed) {
        DocValue::Num(n)
    } else {
        DocValue::Str(trimmed.to_string())
    }
}

/// Fold ordered (tag, value) pairs into a map, turning repeated tags into
/// lists: the first repeat promotes the existing entry to a 2-element
/// list, later repeats append.
fn coalesce(children: Vec<(String, DocValue)>) -> DocValue {
    let mut map: HashMap<String, DocValue> = HashMap::new();
    for (tag, value) in children {
        match map.get_mut(&tag) {
            None => {
                map.insert(tag, value);
            }
            Some(DocValue::List(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, DocValue::Null);
                *existing = DocValue::List(vec![first, value]);
            }
        }
    }
    DocValue::Map(map)
}

/// Numeric leaf coercion. Deliberately narrower than `f64::from_str`:
/// only digit-shaped text counts, so ids like "inf" stay strings.
fn parse_number(text: &str) -> Option<f64> {
    let first = text.chars().next()?;
    if !(first.is_ascii_digit() || first == '-' || first == '+' || first == '.') {
        return None;
    }
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
    {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> DocValue {
        parse_document(text, &DocumentOptions::default()).unwrap()
    }

    fn root<'a>(value: &'a DocValue, tag: &str) -> &'a DocValue {
        value.as_map().unwrap().get(tag).unwrap()
    }

    #[test]
    fn test_scalar_leaves() {
        let doc = parse("<ModMetaData><name>Test Mod</name><steamAppId>294100</steamAppId></ModMetaData>");
        let meta = root(&doc, "ModMetaData").as_map().unwrap();
        assert_eq!(meta["name"], DocValue::Str("Test Mod".to_string()));
        assert_eq!(meta["steamAppId"], DocValue::Num(294100.0));
    }

    #[test]
    fn test_repeated_tags_coalesce_into_list() {
        let doc = parse("<root><li>a</li><li>b</li><li>c</li></root>");
        let inner = root(&doc, "root").as_map().unwrap();
        assert_eq!(
            inner["li"],
            DocValue::List(vec![
                DocValue::Str("a".to_string()),
                DocValue::Str("b".to_string()),
                DocValue::Str("c".to_string()),
            ])
        );
    }

    #[test]
    fn test_single_child_stays_scalar() {
        let doc = parse("<root><li>only</li></root>");
        let inner = root(&doc, "root").as_map().unwrap();
        assert_eq!(inner["li"], DocValue::Str("only".to_string()));
    }

    #[test]
    fn test_empty_and_self_closing_elements_are_null() {
        let doc = parse("<root><a></a><b/></root>");
        let inner = root(&doc, "root").as_map().unwrap();
        assert_eq!(inner["a"], DocValue::Null);
        assert_eq!(inner["b"], DocValue::Null);
    }

    #[test]
    fn test_prolog_is_stripped() {
        let doc = parse("<?xml version=\"1.0\" encoding=\"windows-1251\"?><root><x>1</x></root>");
        let inner = root(&doc, "root").as_map().unwrap();
        assert_eq!(inner["x"], DocValue::Num(1.0));
    }

    // Regression fixture for the four-space rule: without it the indented
    // continuation of a leaf collapses into one run-on string.
    #[test]
    fn test_four_space_runs_become_newlines() {
        let text = "<root><description>line one    line two</description></root>";
        let doc = parse(text);
        let inner = root(&doc, "root").as_map().unwrap();
        assert_eq!(
            inner["description"],
            DocValue::Str("line one\nline two".to_string())
        );

        let strict = parse_document(
            text,
            &DocumentOptions {
                collapse_indent: false,
            },
        )
        .unwrap();
        let inner = root(&strict, "root").as_map().unwrap();
        assert_eq!(
            inner["description"],
            DocValue::Str("line one    line two".to_string())
        );
    }

    #[test]
    fn test_non_numeric_strings_stay_strings() {
        let doc = parse("<root><a>inf</a><b>1.2.3</b><c>-4</c></root>");
        let inner = root(&doc, "root").as_map().unwrap();
        assert_eq!(inner["a"], DocValue::Str("inf".to_string()));
        assert_eq!(inner["b"], DocValue::Str("1.2.3".to_string()));
        assert_eq!(inner["c"], DocValue::Num(-4.0));
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(parse_document("<root><unclosed>", &DocumentOptions::default()).is_err());
        assert!(parse_document("<a><b></a></b>", &DocumentOptions::default()).is_err());
    }
}
