/*!
 * Two-step chunk translation exchange with the model.
 *
 * 1. The chunk texts are joined into plain paragraphs and translated as free
 *    text, answered inside a fenced `TXT` block.
 * 2. The source fragments are sent again as a `<request>` document together
 *    with that translation; the model answers with a `<response>` document
 *    mapping translated pieces back onto fragment ids.
 */

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use log::debug;
use quick_xml::Writer;

use crate::errors::TranslationError;
use crate::llm::{Llm, PromptTemplate, XmlElement};

use super::text::{clean_spaces, is_empty};

/// Tag of the fenced block holding the free-text translation
const TEXT_TAG: &str = "TXT";

/// Reply budget relative to the request, for the free-text step
const TEXT_REPLY_RATE: f64 = 2.0;

/// Reply budget relative to the request, for the alignment step
const XML_REPLY_RATE: f64 = 2.5;

/// Join lines into paragraphs: a single blank line becomes one empty line,
/// longer blank runs become two. Leading and trailing blanks are dropped.
/// Returns `None` when nothing but whitespace remains.
pub fn normalize_user_input<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    let mut output: Vec<String> = Vec::new();
    let mut blank_run = 0;

    for line in lines {
        let line = line.as_ref();
        if is_empty(line) {
            blank_run += 1;
            continue;
        }
        if !output.is_empty() {
            match blank_run {
                0 => {}
                1 => output.push(String::new()),
                _ => {
                    output.push(String::new());
                    output.push(String::new());
                }
            }
        }
        output.push(clean_spaces(line));
        blank_run = 0;
    }

    if output.is_empty() {
        None
    } else {
        Some(output.join("\n"))
    }
}

/// Prompts and user rules shared by every chunk of one run
#[derive(Debug, Clone)]
pub struct TranslationProtocol {
    translate_prompt: String,
    format_prompt: String,
    user_prompt: Option<String>,
}

impl TranslationProtocol {
    /// `target_language` is the human-readable language name put into prompts
    pub fn new(target_language: &str, user_prompt: Option<&str>) -> Self {
        let user_prompt = user_prompt.and_then(|prompt| {
            let lines: Vec<&str> = prompt.lines().collect();
            normalize_user_input(&lines)
        });
        Self {
            translate_prompt: PromptTemplate::translate().render(target_language, user_prompt.as_deref()),
            format_prompt: PromptTemplate::format().render(target_language, None),
            user_prompt,
        }
    }

    /// Translate `texts`, returning one translation per text in the same order.
    /// `tokens_count` is the body size of the chunk and bounds both replies.
    pub async fn translate_texts(
        &self,
        llm: &Llm,
        texts: &[String],
        tokens_count: usize,
    ) -> Result<Vec<String>, TranslationError> {
        let Some(source_text) = normalize_user_input(texts) else {
            return Ok(vec![String::new(); texts.len()]);
        };

        let user_data = match &self.user_prompt {
            Some(rules) => format!("<rules>{}</rules>\n\n{}", rules, source_text),
            None => source_text,
        };
        let max_tokens = reply_budget(tokens_count, TEXT_REPLY_RATE);
        let translated_text = llm
            .request_text(&self.translate_prompt, TEXT_TAG, &user_data, max_tokens, |text| {
                Ok(text.to_string())
            })
            .await?;

        let request = build_request_xml(texts)?;
        let user_data = format!("```XML\n{}\n```\n\n{}", request, translated_text);
        let max_tokens = reply_budget(tokens_count, XML_REPLY_RATE);

        llm.request_xml(&self.format_prompt, &user_data, max_tokens, |element| {
            parse_translated_response(element, texts.len())
        })
        .await
    }
}

fn reply_budget(tokens: usize, rate: f64) -> usize {
    (tokens as f64 * rate).ceil() as usize
}

/// `<request>` document listing every text as a `<fragment>` with a 1-based id
pub fn build_request_xml(texts: &[String]) -> Result<String, TranslationError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Start(BytesStart::new("request"))).map_err(xml_error)?;
    for (index, text) in texts.iter().enumerate() {
        let id = (index + 1).to_string();
        let mut fragment = BytesStart::new("fragment");
        fragment.push_attribute(("id", id.as_str()));

        let cleaned = clean_spaces(text);
        writer.write_event(Event::Start(fragment)).map_err(xml_error)?;
        writer.write_event(Event::Text(BytesText::new(&cleaned))).map_err(xml_error)?;
        writer.write_event(Event::End(BytesEnd::new("fragment"))).map_err(xml_error)?;
    }
    writer.write_event(Event::End(BytesEnd::new("request"))).map_err(xml_error)?;

    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

fn xml_error<E: std::fmt::Display>(error: E) -> TranslationError {
    TranslationError::Xml(error.to_string())
}

/// Map `<fragment id="n">` children of a `<response>` onto `count` slots.
/// Children without a numeric id are skipped and an id outside `1..=count`
/// fails. Empty texts and slots nobody filled stay empty.
pub fn parse_translated_response(element: &XmlElement, count: usize) -> Result<Vec<String>, TranslationError> {
    let mut translated = vec![String::new(); count];

    for child in &element.children {
        let Some(raw_id) = child.attribute("id") else {
            debug!("Skipping <{}> without id", child.name);
            continue;
        };
        let Ok(id) = raw_id.trim().parse::<usize>() else {
            debug!("Skipping <{}> with non-numeric id {:?}", child.name, raw_id);
            continue;
        };
        if id == 0 || id > count {
            return Err(TranslationError::InvalidFragmentId(id.to_string()));
        }
        let text = child.text.trim();
        if !text.is_empty() {
            translated[id - 1] = text.to_string();
        }
    }
    Ok(translated)
}
