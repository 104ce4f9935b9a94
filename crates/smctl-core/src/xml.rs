//! Namespace-aware parsing of Service Management response bodies
//!
//! Responses are small, so the document is read into a tiny element tree and
//! the typed parsers walk that. Only elements in [`AZURE_NAMESPACE`] are
//! visible to the lookup helpers.

use crate::error::{CoreError, Result};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

/// Namespace every Service Management response lives in
pub const AZURE_NAMESPACE: &str = "http://schemas.microsoft.com/windowsazure";

/// One element with its resolved namespace, text content and children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(namespace: Option<String>, name: String) -> Self {
        Self {
            namespace,
            name,
            ..Default::default()
        }
    }

    /// True if this element is `name` in the Azure namespace
    pub fn is(&self, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(AZURE_NAMESPACE)
    }

    /// All direct children called `name`, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.is(name))
    }

    /// First direct child called `name`
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(name))
    }

    /// Text of the first child called `name`, empty if there is none
    pub fn child_text(&self, name: &str) -> String {
        self.child(name)
            .map(|c| c.text.trim().to_string())
            .unwrap_or_default()
    }
}

fn malformed(err: impl std::fmt::Display) -> CoreError {
    CoreError::MalformedResponse(err.to_string())
}

fn resolve_namespace(ns: ResolveResult<'_>) -> Result<Option<String>> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(malformed(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

/// Parse a whole document and return its root element
pub fn parse_document(body: &str) -> Result<XmlElement> {
    let mut reader = NsReader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(malformed)?;
        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(malformed("content after the root element"));
                }
                let namespace = resolve_namespace(ns)?;
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                stack.push(XmlElement::new(namespace, name));
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(malformed("content after the root element"));
                }
                let namespace = resolve_namespace(ns)?;
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                let element = XmlElement::new(namespace, name);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("unexpected closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(malformed)?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(malformed("text outside the root element")),
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed("document ended inside an element"));
    }
    root.ok_or_else(|| malformed("document has no root element"))
}

/// Parse a document and check its root is `name` in the Azure namespace
pub fn parse_root(body: &str, name: &str) -> Result<XmlElement> {
    let root = parse_document(body)?;
    if !root.is(name) {
        return Err(malformed(format!(
            "expected root <{}> in namespace {}, found <{}> in {}",
            name,
            AZURE_NAMESPACE,
            root.name,
            root.namespace.as_deref().unwrap_or("no namespace")
        )));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let doc = r#"<?xml version="1.0" encoding="utf-8"?>
<Services xmlns="http://schemas.microsoft.com/windowsazure">
  <Service><Type>Storage</Type><State>Registered</State></Service>
  <Service><Type>Caching</Type><State/></Service>
</Services>"#;
        let root = parse_root(doc, "Services").unwrap();
        let services: Vec<_> = root.children_named("Service").collect();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].child_text("Type"), "Storage");
        assert_eq!(services[1].child_text("State"), "");
        assert_eq!(services[1].child_text("Missing"), "");
    }

    #[test]
    fn test_prefixed_namespace_resolves() {
        let doc = r#"<a:Services xmlns:a="http://schemas.microsoft.com/windowsazure"><a:Service/></a:Services>"#;
        let root = parse_root(doc, "Services").unwrap();
        assert_eq!(root.children_named("Service").count(), 1);
    }

    #[test]
    fn test_entities_unescaped() {
        let doc = r#"<Operation xmlns="http://schemas.microsoft.com/windowsazure"><ID>a&amp;b</ID></Operation>"#;
        let root = parse_root(doc, "Operation").unwrap();
        assert_eq!(root.child_text("ID"), "a&b");
    }

    #[test]
    fn test_wrong_namespace_rejected() {
        let doc = r#"<Services xmlns="urn:other"><Service/></Services>"#;
        let err = parse_root(doc, "Services").unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_namespace_rejected() {
        let err = parse_root("<Services/>", "Services").unwrap_err();
        assert!(err.to_string().contains("no namespace"));
    }

    #[test]
    fn test_not_xml_rejected() {
        assert!(matches!(
            parse_document("this is not xml"),
            Err(CoreError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_document(""),
            Err(CoreError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_unclosed_document_rejected() {
        let doc = r#"<Services xmlns="http://schemas.microsoft.com/windowsazure"><Service>"#;
        assert!(matches!(
            parse_document(doc),
            Err(CoreError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_mismatched_tags_rejected() {
        let doc = r#"<Services xmlns="http://schemas.microsoft.com/windowsazure"><Service></Services>"#;
        assert!(parse_document(doc).is_err());
    }
}
