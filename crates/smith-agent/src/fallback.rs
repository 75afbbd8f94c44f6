//! Fallback content for replies that yield no files and for failed completions
//!
//! Three decisions live here, all driven by keywords in the task text:
//!
//! - where to put the first code block when the reply had no file sections
//! - which minimal placeholder to write when the reply had no code at all
//! - what the offline fallback writes when no reply arrived

use crate::types::GeneratedFile;

/// Keywords that make the offline fallback emit the daily TODO generator
pub const TODO_TRIGGERS: &[&str] = &["todo", "todolist", "checklist", "待办"];

const SCRIPT_KEYWORDS: &[&str] = &["script", "脚本"];
const TEST_KEYWORDS: &[&str] = &["test", "测试"];
const PYTHON_KEYWORDS: &[&str] = &["python", "脚本"];

/// Path of the script written by the offline fallback on a TODO trigger
pub const TODO_SCRIPT_PATH: &str = "scripts/generate_todo.py";
/// Path of the generic offline fallback script
pub const FALLBACK_SCRIPT_PATH: &str = "scripts/fallback.py";
/// Heading appended to the README by the offline fallback
pub const README_SECTION_HEADING: &str = "## Daily TODO generator";

const DEFAULT_CHECKLIST: &[&str] = &[
    "Review open issues",
    "Check CI status",
    "Update project plan",
    "Write daily summary",
];

fn mentions(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Path for a bare code block, inferred from the task text
pub fn infer_code_block_path(task: &str) -> &'static str {
    if mentions(task, SCRIPT_KEYWORDS) {
        if mentions(task, &["todo"]) {
            TODO_SCRIPT_PATH
        } else {
            "scripts/implement.py"
        }
    } else if mentions(task, TEST_KEYWORDS) {
        "test_example.py"
    } else {
        "scripts/example.py"
    }
}

/// Minimal file written when a reply contained no usable code
pub fn minimal_placeholder(task: &str) -> GeneratedFile {
    if mentions(task, PYTHON_KEYWORDS) {
        GeneratedFile::new(
            "scripts/generated.py",
            r#"#!/usr/bin/env python3
"""
Generated script based on the task document.
"""


def main():
    print("Hello from generated script!")


if __name__ == "__main__":
    main()
"#,
        )
    } else {
        GeneratedFile::new(
            "generated.md",
            "# Generated file\n\nCreated from the task document; the model reply contained no code.\n",
        )
    }
}

/// Whether the task asks for the daily TODO generator
pub fn is_todo_task(task: &str) -> bool {
    mentions(task, TODO_TRIGGERS)
}

/// Checklist items from a daily-checklist template (`- [ ] item` lines)
pub fn checklist_items(template: Option<&str>) -> Vec<String> {
    let items: Vec<String> = template
        .unwrap_or_default()
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("- [ ]"))
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        DEFAULT_CHECKLIST.iter().map(|s| s.to_string()).collect()
    } else {
        items
    }
}

/// The daily TODO generator script with `items` baked in
pub fn todo_script(items: &[String]) -> GeneratedFile {
    let list = items
        .iter()
        .map(|item| format!("    {},", python_string(item)))
        .collect::<Vec<_>>()
        .join("\n");

    let content = format!(
        r##"#!/usr/bin/env python3
"""
Generate today's TODO list from the daily checklist.

Usage: python3 scripts/generate_todo.py [output_dir]
"""
import datetime
import os
import sys

CHECKLIST = [
{list}
]


def main():
    output_dir = sys.argv[1] if len(sys.argv) > 1 else "todos"
    os.makedirs(output_dir, exist_ok=True)
    today = datetime.date.today().isoformat()
    path = os.path.join(output_dir, "TODO_%s.md" % today)
    with open(path, "w", encoding="utf-8") as f:
        f.write("# TODO %s\n\n" % today)
        for item in CHECKLIST:
            f.write("- [ ] %s\n" % item)
    print("Wrote %s" % path)


if __name__ == "__main__":
    main()
"##
    );

    GeneratedFile::new(TODO_SCRIPT_PATH, content)
}

/// The generic offline fallback script
pub fn fallback_script() -> GeneratedFile {
    GeneratedFile::new(
        FALLBACK_SCRIPT_PATH,
        r#"#!/usr/bin/env python3
# Fallback file created because the model request failed.
# Check the workflow logs for details.
print("Fallback file - check logs")
"#,
    )
}

/// README text with the TODO generator section appended
///
/// Returns `None` when the section is already present.
pub fn readme_with_todo_section(existing: Option<&str>) -> Option<String> {
    let existing = existing.unwrap_or_default();
    if existing.contains(README_SECTION_HEADING) {
        return None;
    }

    let mut readme = existing.trim_end().to_string();
    if !readme.is_empty() {
        readme.push_str("\n\n");
    }
    readme.push_str(README_SECTION_HEADING);
    readme.push_str(&format!(
        "\n\nGenerate today's checklist:\n\n```sh\npython3 {}\n```\n\nThe file is written to `todos/TODO_<date>.md`.\n",
        TODO_SCRIPT_PATH
    ));
    Some(readme)
}

fn python_string(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
