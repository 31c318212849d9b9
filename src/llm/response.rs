/*!
 * Extraction of structured content from model replies.
 *
 * Replies are free text: the useful part is either a fenced block opened by
 * three backticks and a tag, or an XML element somewhere in the reply.
 */

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const FENCE: &str = "```";

/// Element tree decoded from a reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Text placed directly inside this element, children excluded
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Value of the attribute called `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value().map_err(|e| e.to_string())?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Default::default()
        })
    }
}

/// Decode the first complete element of `xml`; text after it is ignored
pub fn parse_element(xml: &str) -> Result<XmlElement, String> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();

    loop {
        let completed = match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(start) => {
                stack.push(XmlElement::from_start(&start)?);
                None
            }
            Event::Empty(start) => Some(XmlElement::from_start(&start)?),
            Event::End(_) => stack.pop(),
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape().map_err(|e| e.to_string())?);
                }
                None
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
                None
            }
            Event::Eof => return Err("unexpected end of document".to_string()),
            _ => None,
        };

        if let Some(element) = completed {
            match stack.last_mut() {
                Some(parent) => parent.children.push(element),
                None => return Ok(element),
            }
        }
    }
}

/// Contents of every block fenced by three backticks plus `tag`, in order.
/// The tag is matched without regard to ASCII case.
pub fn fenced_blocks<'a>(reply: &'a str, tag: &str) -> Vec<&'a str> {
    let opener = format!("{}{}", FENCE, tag);
    let mut blocks = Vec::new();
    let mut position = 0;

    while let Some(start) = find_ignore_ascii_case(reply, &opener, position) {
        let content_start = start + opener.len();
        match reply[content_start..].find(FENCE) {
            Some(length) => {
                blocks.push(reply[content_start..content_start + length].trim());
                position = content_start + length + FENCE.len();
            }
            None => break,
        }
    }
    blocks
}

/// Find the first `<tag>` element in a reply, looking in fenced `xml`
/// blocks before the raw text
pub fn find_element(reply: &str, tag: &str) -> Option<XmlElement> {
    fenced_blocks(reply, "xml")
        .into_iter()
        .chain(raw_candidates(reply, tag))
        .filter_map(|candidate| parse_element(candidate).ok())
        .find(|element| element.name == tag)
}

/// Slices of `reply` running from each `<tag` opening to the last `</tag>`
fn raw_candidates<'a>(reply: &'a str, tag: &str) -> Vec<&'a str> {
    let opening = format!("<{}", tag);
    let closing = format!("</{}>", tag);
    let Some(last_close) = reply.rfind(&closing) else {
        return Vec::new();
    };
    let end = last_close + closing.len();

    reply
        .match_indices(&opening)
        .map(|(start, _)| start)
        .filter(|&start| start < last_close)
        .map(|start| &reply[start..end])
        .collect()
}

fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}
