//! Prompt builder for issue implementation
//!
//! The prompt carries the task document, the optional protocol and project
//! plan, the response format the grammar in [`crate::response`] expects, and
//! a fixed set of style rules.

use crate::types::ChatMessage;

pub const SYSTEM_PROMPT: &str = "You are a professional programming assistant. \
Create real, complete code files that implement the requirements of the issue.";

/// Rules appended to every prompt
pub const STYLE_RULES: &[&str] = &[
    "Create or modify at least one source file.",
    "Use concrete relative file paths (for example scripts/generate_todo.py).",
    "Write complete, runnable code; no placeholders or elided sections.",
    "If the issue asks for a script, create the actual script file.",
    "Put each file in its own `## File N: <path>` section followed by one fenced code block.",
];

/// Documents the prompt is built from
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// Task document text (required)
    pub task: String,
    /// Agent protocol rules, if present
    pub protocol: Option<String>,
    /// Project plan, if present
    pub project_plan: Option<String>,
}

/// Response format section of the prompt
pub fn response_format_instructions() -> &'static str {
    r#"## RESPONSE FORMAT

Reply using exactly these sections:

## Plan
<short description of the implementation plan>

## File 1: <relative/path/to/file>
```<language>
<complete file content>
```

## File 2: <relative/path/to/file>
```<language>
<complete file content>
```
"#
}

/// Build the user prompt
pub fn build_prompt(context: &PromptContext) -> String {
    let mut prompt = String::new();

    prompt.push_str("Implement the requirements described in the task document below.\n\n");

    prompt.push_str("## TASK\n\n");
    prompt.push_str(context.task.trim());
    prompt.push_str("\n\n");

    if let Some(protocol) = non_blank(&context.protocol) {
        prompt.push_str("## AGENT PROTOCOL\n\n");
        prompt.push_str(protocol);
        prompt.push_str("\n\n");
    }

    if let Some(plan) = non_blank(&context.project_plan) {
        prompt.push_str("## PROJECT PLAN\n\n");
        prompt.push_str(plan);
        prompt.push_str("\n\n");
    }

    prompt.push_str(response_format_instructions());
    prompt.push('\n');

    prompt.push_str("## RULES\n\n");
    for (i, rule) in STYLE_RULES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, rule));
    }

    prompt
}

/// System and user messages for one request
pub fn build_messages(context: &PromptContext) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_prompt(context)),
    ]
}

fn non_blank(doc: &Option<String>) -> Option<&str> {
    doc.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
