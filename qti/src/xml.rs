//! # XML Tree
//!
//! A small owned element tree built on top of `quick-xml` events. QTI documents are queried by
//! element *local name* so that `qti-item-body`, `qti:qti-item-body` and a default-namespaced
//! `qti-item-body` are all treated alike.
//!
//! The tree keeps whitespace text, CDATA and comments so that a result file can be rewritten with
//! only the touched outcome variables changing.

use crate::error::QtiError;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

/// An element with its qualified name, attributes in document order, and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

/// Strips a namespace prefix from a qualified name.
pub fn local_name_of(qualified: &str) -> &str {
    qualified
        .rsplit_once(':')
        .map(|(_, local)| local)
        .unwrap_or(qualified)
}

/// Parses `xml` into its root element.
///
/// `document` names the document in error messages (e.g. `"assessmentTest"`).
///
/// # Errors
///
/// Returns [`QtiError::MalformedDocument`] when the XML is not well formed, has no root element,
/// has more than one root element, or leaves elements unclosed.
pub fn parse_document(xml: &str, document: &str) -> Result<XmlElement, QtiError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            QtiError::malformed(
                document,
                format!("{e} (at byte {})", reader.buffer_position()),
            )
        })?;
        match event {
            Event::Start(start) => stack.push(element_from_start(&start, document)?),
            Event::Empty(start) => {
                let element = element_from_start(&start, document)?;
                attach(&mut stack, &mut root, element, document)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| QtiError::malformed(document, "unexpected closing tag"))?;
                attach(&mut stack, &mut root, element, document)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| QtiError::malformed(document, e.to_string()))?
                    .into_owned();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Text(text)),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(QtiError::malformed(document, "text outside the root element"));
                    }
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::CData(text));
                }
            }
            Event::Comment(comment) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&comment).into_owned();
                    parent.children.push(XmlNode::Comment(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(QtiError::malformed(
            document,
            format!("element <{}> is not closed", open.name),
        ));
    }
    root.ok_or_else(|| QtiError::malformed(document, "no root element"))
}

fn element_from_start(start: &BytesStart<'_>, document: &str) -> Result<XmlElement, QtiError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| QtiError::malformed(document, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| QtiError::malformed(document, e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    document: &str,
) -> Result<(), QtiError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(QtiError::malformed(document, "more than one root element"));
    }
    *root = Some(element);
    Ok(())
}

fn write_error(err: impl std::fmt::Display) -> QtiError {
    QtiError::malformed("XML output", err.to_string())
}

impl XmlElement {
    /// Creates an empty element with the given qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        local_name_of(&self.name)
    }

    /// Namespace prefix of the qualified name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.rsplit_once(':').map(|(prefix, _)| prefix)
    }

    /// Returns the value of the attribute with exactly this name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets (or replaces) an attribute, keeping its original position when it already exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Direct child elements, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Mutable direct child elements, in document order.
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// All descendants (not including `self`) whose local name is `local`, in document order.
    pub fn descendants(&self, local: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(local, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, local: &str, found: &mut Vec<&'a XmlElement>) {
        for child in self.child_elements() {
            if child.local_name() == local {
                found.push(child);
            }
            child.collect_descendants(local, found);
        }
    }

    /// First descendant with the given local name.
    pub fn first_descendant(&self, local: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.local_name() == local {
                return Some(child);
            }
            if let Some(found) = child.first_descendant(local) {
                return Some(found);
            }
        }
        None
    }

    /// Visits every descendant element (pre-order, `self` excluded) mutably.
    pub fn visit_descendants_mut(&mut self, visit: &mut dyn FnMut(&mut XmlElement)) {
        for child in self.child_elements_mut() {
            visit(child);
            child.visit_descendants_mut(visit);
        }
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Element(el) => el.push_text(out),
                XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(text),
                XmlNode::Comment(_) => {}
            }
        }
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![XmlNode::Text(text.into())];
    }

    /// Serialises this element as a complete document with a UTF-8 declaration.
    pub fn to_document_string(&self) -> Result<String, QtiError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        writer
            .write_event(Event::Text(BytesText::new("\n")))
            .map_err(write_error)?;
        self.write_into(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(write_error)
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), QtiError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }
        writer.write_event(Event::Start(start)).map_err(write_error)?;
        for child in &self.children {
            match child {
                XmlNode::Element(el) => el.write_into(writer)?,
                XmlNode::Text(text) => writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(write_error)?,
                XmlNode::CData(text) => writer
                    .write_event(Event::CData(BytesCData::new(text.as_str())))
                    .map_err(write_error)?,
                XmlNode::Comment(text) => writer
                    .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                    .map_err(write_error)?,
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)
    }
}
