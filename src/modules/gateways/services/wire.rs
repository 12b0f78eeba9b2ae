//! Wire codecs: flat XML (WeChat Pay), URL-encoded forms and the signed
//! JSON envelope (Alipay).

use std::collections::BTreeMap;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::value::RawValue;

use crate::core::{AppError, ParameterSet, Result};

const XML_ROOT: &str = "xml";

/// Serialize a parameter set as `<xml><k>v</k>...</xml>`, keys in sorted order
pub fn encode_xml(params: &ParameterSet) -> Result<Vec<u8>> {
    let sorted: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new(XML_ROOT)))?;
    for (key, value) in sorted {
        writer.write_event(Event::Start(BytesStart::new(key)))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new(key)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(XML_ROOT)))?;
    Ok(writer.into_inner())
}

/// Parse a one-level XML document into a parameter set.
///
/// Text and CDATA children of the root become values; deeper nesting is ignored.
pub fn decode_xml(raw: &[u8]) -> Result<ParameterSet> {
    let mut reader = Reader::from_reader(raw);
    reader.trim_text(true);

    let mut params = ParameterSet::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut current: Option<String> = None;
    let mut value = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                if depth == 1 {
                    saw_root = true;
                } else if depth == 2 {
                    current = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    value.clear();
                }
            }
            Event::Empty(e) if depth == 1 => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                params.insert(name, String::new());
            }
            Event::Text(e) if depth == 2 => value.push_str(&e.unescape()?),
            Event::CData(e) if depth == 2 => {
                value.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some(name) = current.take() {
                        params.insert(name, std::mem::take(&mut value));
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(AppError::decode("XML document has no root element"));
    }
    Ok(params)
}

/// URL-encode a parameter set, keys in sorted order
pub fn encode_form(params: &ParameterSet) -> Result<String> {
    let sorted: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    serde_urlencoded::to_string(&sorted)
        .map_err(|e| AppError::internal(format!("cannot encode form: {}", e)))
}

/// Decode an `application/x-www-form-urlencoded` body; repeated keys keep the last value
pub fn decode_form(raw: &[u8]) -> Result<ParameterSet> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw)
        .map_err(|e| AppError::decode(format!("form body: {}", e)))?;
    Ok(pairs.into_iter().collect())
}

/// Top-level members of a JSON response, each kept as its exact source text.
///
/// The signed content of an Alipay response is the byte-exact text of one
/// member node, while the signature sits beside it as a sibling `sign`
/// member, so nodes are never re-serialized.
#[derive(Debug)]
pub struct JsonEnvelope<'a> {
    nodes: BTreeMap<String, &'a RawValue>,
}

impl<'a> JsonEnvelope<'a> {
    pub fn parse(raw: &'a str) -> Result<Self> {
        let nodes: BTreeMap<String, &'a RawValue> = serde_json::from_str(raw)?;
        Ok(Self { nodes })
    }

    /// Exact source text of a member
    pub fn node(&self, name: &str) -> Option<&'a str> {
        self.nodes.get(name).map(|raw| raw.get())
    }

    /// A member that must be a JSON string, if present
    pub fn string_member(&self, name: &str) -> Result<Option<String>> {
        match self.nodes.get(name) {
            Some(raw) => Ok(Some(serde_json::from_str::<String>(raw.get())?)),
            None => Ok(None),
        }
    }
}
