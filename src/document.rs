/*!
 * Plain-text documents.
 *
 * Every non-blank line is a paragraph and becomes one fragment. Blank lines
 * separate sections: the segmenter is told it may cut chunks there. The
 * translated document keeps the exact line layout of the source.
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::translation::fragment::{Fragment, Incision};
use crate::translation::text::is_empty;

/// How translations are written into the output document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Keep each source paragraph and put its translation on the next line
    #[default]
    Append,
    /// Replace each source paragraph with its translation
    Replace,
}

/// A plain-text document split into lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    lines: Vec<String>,
}

impl TextDocument {
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
        }
    }

    /// Read a document from disk
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;
        Ok(Self::parse(&content))
    }

    /// Non-blank lines, in order
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str).filter(|line| !is_empty(line))
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// One fragment per paragraph; a blank line next to a paragraph marks a
    /// welcome cut on that side
    pub fn fragments(&self) -> Vec<Fragment> {
        let blank_at = |index: Option<usize>| index.and_then(|i| self.lines.get(i)).is_some_and(|line| is_empty(line));

        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !is_empty(line))
            .map(|(index, line)| {
                let start = if blank_at(index.checked_sub(1)) { Incision::Possible } else { Incision::Unset };
                let end = if blank_at(Some(index + 1)) { Incision::Possible } else { Incision::Unset };
                Fragment::with_incisions(line.trim(), start, end)
            })
            .collect()
    }

    /// Lay translations over the paragraphs. Paragraphs without a translation,
    /// or with an empty one, are left as they are.
    pub fn render(&self, translations: &[String], mode: WriteMode) -> String {
        let mut output: Vec<&str> = Vec::with_capacity(self.lines.len() * 2);
        let mut translations = translations.iter();

        for line in &self.lines {
            if is_empty(line) {
                output.push(line);
                continue;
            }
            let translation = translations.next().map(String::as_str).filter(|text| !text.is_empty());
            match (mode, translation) {
                (WriteMode::Append, Some(translation)) => {
                    output.push(line);
                    output.push(translation);
                }
                (WriteMode::Replace, Some(translation)) => output.push(translation),
                (_, None) => output.push(line),
            }
        }

        let mut rendered = output.join("\n");
        rendered.push('\n');
        rendered
    }
}

/// Default output path: `<stem>.<language>.<extension>` next to the input
pub fn generate_output_path<P: AsRef<Path>>(input_file: P, target_language: &str) -> PathBuf {
    let input_file = input_file.as_ref();
    let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
    let file_name = match input_file.extension() {
        Some(extension) => format!("{}.{}.{}", stem, target_language, extension.to_string_lossy()),
        None => format!("{}.{}", stem, target_language),
    };
    input_file.with_file_name(file_name)
}

/// Write a string to a file, creating parent directories
pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }
    fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
}
