/*!
 * Prompt templates for chunk translation.
 *
 * Two system prompts drive the two requests made per chunk: the free-text
 * translation and the alignment of that translation back onto fragments.
 */

/// System prompt template with `{target_language}` and `{rules}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Prompt for the free-text translation request.
    pub const TRANSLATE: &'static str = r#"You are a professional literary translator. Translate the text sent by the user into {target_language}.

## Input
- The text is a window of a longer document, split into paragraphs by line breaks
- The first and last paragraphs may be cut off mid-sentence; translate them as they are
- Content wrapped in <rules></rules> is an instruction for you, never text to translate
{rules}
## Output Requirements
- Keep every paragraph break of the source text
- Do not add notes, explanations or paragraphs that are not in the source
- Reply with the translation only, wrapped in a fenced block:
```TXT
(translation)
```"#;

    /// Prompt for the request that aligns a translation with source fragments.
    pub const FORMAT: &'static str = r#"You align a {target_language} translation with the source text it was made from.

## Input
- A fenced XML block holding a <request> element; each <fragment id="n"> is one source fragment in document order
- After a blank line, the full {target_language} translation of those fragments
{rules}
## Task
- Cut the translation into pieces so that each piece translates exactly one source fragment
- Keep the wording of the translation; only decide where each piece starts and ends
- When a piece of translation covers several fragments, give it to the first of them and leave the others out

## Output Requirements
- Reply with a single <response> element holding one <fragment id="n"> per piece, reusing the source ids
- Do not include any text outside the <response> element"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the free-text translation template.
    pub fn translate() -> Self {
        Self::new(Self::TRANSLATE)
    }

    /// Create the fragment alignment template.
    pub fn format() -> Self {
        Self::new(Self::FORMAT)
    }

    /// Render the template; `rules` adds a section reminding the model of user rules.
    pub fn render(&self, target_language: &str, rules: Option<&str>) -> String {
        let rules_section = match rules {
            Some(rules) if !rules.trim().is_empty() => format!(
                "\n## Additional Rules\nFollow these rules from the user:\n{}\n",
                rules.trim()
            ),
            _ => String::new(),
        };
        self.template
            .replace("{target_language}", target_language)
            .replace("{rules}", &rules_section)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::translate()
    }
}
