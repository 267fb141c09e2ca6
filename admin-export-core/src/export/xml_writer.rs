//! XML rendering.
//!
//! Rows are written under a root element named after the resource. Each
//! value is classified as a scalar, list or mapping and synthesised into
//! elements recursively: list positions and numeric keys become `<item>`,
//! other keys become elements of the same name, scalars become escaped text.

use crate::error::AdminExportError;
use crate::flatten::value_text;
use crate::models::Record;
use crate::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Value};
use std::io::Write;

/// Element name used for list positions and numeric keys
pub const ITEM_ELEMENT: &str = "item";

/// Shape of a value as far as element synthesis is concerned.
#[derive(Debug, Clone, Copy)]
enum Node<'a> {
    Scalar(&'a Value),
    List(&'a [Value]),
    Mapping(&'a Map<String, Value>),
}

impl<'a> Node<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => Node::List(items),
            Value::Object(map) => Node::Mapping(map),
            scalar => Node::Scalar(scalar),
        }
    }
}

/// Converts a mapping key into an element name.
///
/// Purely numeric keys become [`ITEM_ELEMENT`]. Characters that are not
/// valid in an XML name are replaced with `_`, and a name that cannot start
/// an element gets a leading `_`.
pub fn element_name(key: &str) -> String {
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
        return ITEM_ELEMENT.to_string();
    }

    let mut name = String::with_capacity(key.len());
    for (i, c) in key.chars().enumerate() {
        let valid = if i == 0 {
            c.is_alphabetic() || c == '_'
        } else {
            c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
        };

        if valid {
            name.push(c);
        } else if i == 0 && (c.is_ascii_digit() || c == '-' || c == '.') {
            name.push('_');
            name.push(c);
        } else {
            name.push('_');
        }
    }

    if name.is_empty() {
        name.push_str(ITEM_ELEMENT);
    }

    name
}

/// Returns true for characters allowed in XML 1.0 character data.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    )
}

/// Drops characters that cannot appear in an XML document.
fn xml_text(text: String) -> String {
    if text.chars().all(is_xml_char) {
        return text;
    }
    tracing::debug!("Dropping characters not allowed in XML from a cell");
    text.chars().filter(|c| is_xml_char(*c)).collect()
}

struct XmlRenderer<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlRenderer<W> {
    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| AdminExportError::render_failed("xml", e))
    }

    fn element(&mut self, name: &str, node: Node<'_>) -> Result<()> {
        self.emit(Event::Start(BytesStart::new(name)))?;
        match node {
            Node::Scalar(value) => {
                let text = xml_text(value_text(value));
                if !text.is_empty() {
                    self.emit(Event::Text(BytesText::new(&text)))?;
                }
            }
            Node::List(items) => {
                for item in items {
                    self.element(ITEM_ELEMENT, Node::of(item))?;
                }
            }
            Node::Mapping(map) => self.mapping(map)?,
        }
        self.emit(Event::End(BytesEnd::new(name)))
    }

    fn mapping(&mut self, map: &Map<String, Value>) -> Result<()> {
        for (key, value) in map {
            self.element(&element_name(key), Node::of(value))?;
        }
        Ok(())
    }
}

/// Writes rows as an XML document rooted at `root`.
///
/// The root element is always written with explicit open and close tags,
/// even when there are no rows.
pub fn write_xml<W: Write>(rows: &[Record], root: &str, writer: W) -> Result<()> {
    let root = element_name(root);
    let mut renderer = XmlRenderer {
        writer: Writer::new(writer),
    };

    renderer.emit(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    renderer.emit(Event::Text(BytesText::new("\n")))?;
    renderer.emit(Event::Start(BytesStart::new(root.as_str())))?;
    for row in rows {
        renderer.element(ITEM_ELEMENT, Node::Mapping(row))?;
    }
    renderer.emit(Event::End(BytesEnd::new(root.as_str())))?;
    renderer.emit(Event::Text(BytesText::new("\n")))?;

    Ok(())
}
