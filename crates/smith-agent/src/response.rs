//! Response grammar - extracts the plan and file sections from a model reply
//!
//! The reply is scanned line by line. Each line outside a code block is one of:
//!
//! - `## Plan` - starts the plan section
//! - `## File <n>: <path>` - starts a file section
//! - any other `## ` heading - ends the plan section
//! - a fence: three backticks with an optional language tag
//! - text
//!
//! A file section is well formed when the first non-blank line after its
//! heading opens a code block and a bare fence closes it. Anything else is
//! recorded as skipped and never fails the parse. Every closed code block is
//! also collected, in order, for the any-code-block fallback.
//!
//! `## 计划` and `## 文件<n>: <path>` are accepted as equivalents of the
//! English headings.

use crate::types::GeneratedFile;

/// Why a file section was not extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No code block directly after the heading
    MissingCodeBlock,
    /// The code block never closed
    UnterminatedCodeBlock,
    /// The heading named no path
    EmptyPath,
    /// The code block held only whitespace
    EmptyContent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingCodeBlock => write!(f, "no code block after heading"),
            SkipReason::UnterminatedCodeBlock => write!(f, "code block is not closed"),
            SkipReason::EmptyPath => write!(f, "heading has no path"),
            SkipReason::EmptyContent => write!(f, "code block is empty"),
        }
    }
}

/// A file section that did not yield a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSection {
    /// The heading line as written
    pub heading: String,
    pub reason: SkipReason,
}

/// Everything extracted from one reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Text of the plan section, if present and non-blank
    pub plan: Option<String>,
    /// Well-formed file sections, in reply order
    pub files: Vec<GeneratedFile>,
    /// Contents of every closed code block, in reply order
    pub code_blocks: Vec<String>,
    /// File sections that were recognized but malformed
    pub skipped: Vec<SkippedSection>,
}

impl ParsedResponse {
    /// First code block with non-blank content
    pub fn first_code_block(&self) -> Option<&str> {
        self.code_blocks
            .iter()
            .map(String::as_str)
            .find(|block| !block.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    PlanHeading,
    FileHeading(&'a str),
    Heading,
    /// Opening or closing fence; `bare` when it carries no language tag
    Fence { bare: bool },
    Text,
}

impl Line<'_> {
    fn is_heading(&self) -> bool {
        matches!(self, Line::PlanHeading | Line::FileHeading(_) | Line::Heading)
    }
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        let tag = rest.trim();
        if tag.is_empty() {
            return Line::Fence { bare: true };
        }
        if !tag.contains('`') {
            return Line::Fence { bare: false };
        }
        return Line::Text;
    }

    let title = match trimmed.strip_prefix("## ") {
        Some(title) => title.trim(),
        None => return Line::Text,
    };

    let bare_title = title.trim_end_matches([':', '：']).trim();
    if bare_title.eq_ignore_ascii_case("plan") || bare_title == "计划" {
        return Line::PlanHeading;
    }

    if let Some(path) = file_heading_path(title) {
        return Line::FileHeading(path);
    }

    Line::Heading
}

/// Path part of `File <n>: <path>`, or `None` when `title` is not a file heading
fn file_heading_path(title: &str) -> Option<&str> {
    let rest = if title.is_char_boundary(4) && title[..4].eq_ignore_ascii_case("file") {
        &title[4..]
    } else {
        title.strip_prefix("文件")?
    };

    let rest = rest.trim_start().trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = rest.trim_start();
    let path = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('：'))?;
    Some(path.trim())
}

/// Strip markdown decoration models like to put around paths
fn clean_path(raw: &str) -> String {
    raw.trim()
        .trim_matches('*')
        .trim()
        .trim_matches('`')
        .trim()
        .to_string()
}

/// Drop leading blank lines and trailing whitespace; keep inner lines as-is
fn normalize_block(lines: &[&str]) -> String {
    let start = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());
    lines[start..].join("\n").trim_end().to_string()
}

/// Read a code block whose opening fence is at `open`
///
/// Returns the content and the index of the line after the closing fence.
fn read_block(lines: &[&str], open: usize) -> Option<(String, usize)> {
    let close = lines[open + 1..]
        .iter()
        .position(|line| classify(line) == Line::Fence { bare: true })?
        + open
        + 1;
    Some((normalize_block(&lines[open + 1..close]), close + 1))
}

/// Parse a model reply
pub fn parse_response(text: &str) -> ParsedResponse {
    let lines: Vec<&str> = text.lines().collect();
    let mut parsed = ParsedResponse::default();
    let mut i = 0;

    while i < lines.len() {
        match classify(lines[i]) {
            Line::Fence { .. } => match read_block(&lines, i) {
                Some((content, next)) => {
                    parsed.code_blocks.push(content);
                    i = next;
                }
                None => i += 1,
            },
            Line::PlanHeading => {
                let start = i + 1;
                let mut end = start;
                while end < lines.len() {
                    let class = classify(lines[end]);
                    if class.is_heading() || matches!(class, Line::Fence { .. }) {
                        break;
                    }
                    end += 1;
                }
                if parsed.plan.is_none() {
                    let plan = lines[start..end].join("\n").trim().to_string();
                    if !plan.is_empty() {
                        parsed.plan = Some(plan);
                    }
                }
                i = end;
            }
            Line::FileHeading(raw_path) => {
                let heading = lines[i].trim().to_string();
                let path = clean_path(raw_path);

                let mut j = i + 1;
                while j < lines.len() && lines[j].trim().is_empty() {
                    j += 1;
                }

                if j >= lines.len() || !matches!(classify(lines[j]), Line::Fence { .. }) {
                    parsed.skipped.push(SkippedSection {
                        heading,
                        reason: SkipReason::MissingCodeBlock,
                    });
                    i += 1;
                    continue;
                }

                let Some((content, next)) = read_block(&lines, j) else {
                    parsed.skipped.push(SkippedSection {
                        heading,
                        reason: SkipReason::UnterminatedCodeBlock,
                    });
                    i = j + 1;
                    continue;
                };

                if path.is_empty() {
                    parsed.skipped.push(SkippedSection {
                        heading,
                        reason: SkipReason::EmptyPath,
                    });
                } else if content.trim().is_empty() {
                    parsed.skipped.push(SkippedSection {
                        heading,
                        reason: SkipReason::EmptyContent,
                    });
                } else {
                    parsed.files.push(GeneratedFile::new(path, content.clone()));
                }
                parsed.code_blocks.push(content);
                i = next;
            }
            Line::Heading | Line::Text => i += 1,
        }
    }

    parsed
}
