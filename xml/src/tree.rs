use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use ippcode22::LoadError;

/// A generic XML element: tag, attributes, children, and accumulated text.
///
/// `quick-xml` only gives us a well-formedness check and an event stream.
/// Everything above that, the tree shape the normalizer walks, is built
/// here.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Parses a byte stream into its single root element. Any parse failure
/// (unmatched tags, invalid entities, multiple roots, ...) is a code-31
/// not-well-formed error.
pub fn parse<R: BufRead>(reader: R) -> Result<Element, LoadError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        let event = xml
            .read_event_into(&mut buf)
            .map_err(|err| LoadError::NotWellFormed(err.to_string()))?;
        match event {
            Event::Start(start) => {
                stack.push(new_element(&start)?);
            }
            Event::Empty(start) => {
                let element = new_element(&start)?;
                push_child(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| LoadError::NotWellFormed("unmatched closing tag".to_string()))?;
                push_child(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let decoded = text
                    .unescape()
                    .map_err(|err| LoadError::NotWellFormed(err.to_string()))?
                    .into_owned();
                if let Some(top) = stack.last_mut() {
                    top.text.get_or_insert_with(String::new).push_str(&decoded);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| LoadError::NotWellFormed("document has no root element".to_string()))
}

fn new_element(start: &BytesStart) -> Result<Element, LoadError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = HashMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| LoadError::NotWellFormed(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| LoadError::NotWellFormed(err.to_string()))?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(Element {
        tag,
        attributes,
        children: Vec::new(),
        text: None,
    })
}

fn push_child(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) -> Result<(), LoadError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_some() {
                return Err(LoadError::NotWellFormed("document has multiple root elements".to_string()));
            }
            *root = Some(element);
        }
    }
    Ok(())
}
