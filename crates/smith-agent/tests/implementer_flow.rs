//! End-to-end implementer runs against a scripted backend.
//!
//! Each test builds a throwaway working directory, hands the implementer a
//! canned reply (or failure), and checks what landed on disk.

use async_trait::async_trait;
use smith_agent::{
    fallback, ChatRequest, Completion, CompletionBackend, CompletionError, ExtractionTier,
    Implementer, RunOutcome,
};
use smith_core::SmithConfig;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

/// Backend that returns a fixed result and remembers the request it got
struct ScriptedBackend {
    result: Result<String, CompletionError>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    fn reply(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: CompletionError) -> Self {
        Self {
            result: Err(error),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion, CompletionError> {
        self.seen.lock().unwrap().push(request.clone());
        self.result.clone().map(|text| Completion {
            text,
            model: "scripted-model".to_string(),
            timestamp: chrono::Utc::now(),
            usage: None,
        })
    }
}

fn workspace(task: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ISSUE.md"), task).unwrap();
    dir
}

fn read(dir: &TempDir, path: &str) -> String {
    fs::read_to_string(dir.path().join(path)).unwrap()
}

const TWO_FILES: &str = r#"I'll implement this in two files.

## Plan
Add a greeting module and its test.

## File 1: src/greet.py
```python
def greet(name):
    return f"Hello, {name}!"
```

## File 2: tests/test_greet.py
```python
from src.greet import greet


def test_greet():
    assert greet("Ada") == "Hello, Ada!"
```
"#;

#[tokio::test]
async fn test_two_file_sections_are_written() {
    let dir = workspace("# Greeting\nAdd a greet function with a test.");
    let implementer = Implementer::prepare(dir.path(), SmithConfig::default()).unwrap();
    let backend = ScriptedBackend::reply(TWO_FILES);

    let report = implementer.run(&backend).await.unwrap();

    assert_eq!(
        report.outcome,
        RunOutcome::Model {
            tier: ExtractionTier::FileSections
        }
    );
    assert_eq!(report.paths(), vec!["src/greet.py", "tests/test_greet.py"]);
    assert_eq!(
        read(&dir, "src/greet.py"),
        "def greet(name):\n    return f\"Hello, {name}!\""
    );
    assert!(read(&dir, "tests/test_greet.py").contains("def test_greet():"));

    let plan = read(&dir, "EXEC_PLAN.md");
    assert!(plan.contains("## Goal\nAdd a greeting module and its test."));
    assert!(plan.contains("- src/greet.py (create)"));
    assert!(plan.contains("- tests/test_greet.py (create)"));
}

#[tokio::test]
async fn test_request_carries_task_and_model() {
    let dir = workspace("Add a greet function");
    fs::write(dir.path().join("PROJECT_PLAN.md"), "Milestone 1: greetings").unwrap();
    let implementer = Implementer::prepare(dir.path(), SmithConfig::default()).unwrap();
    let backend = ScriptedBackend::reply(TWO_FILES);

    implementer.run(&backend).await.unwrap();

    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].model, "scripted-model");
    assert_eq!(seen[0].temperature, 0.7);
    let user = &seen[0].messages[1].content;
    assert!(user.contains("Add a greet function"));
    assert!(user.contains("Milestone 1: greetings"));
}

#[tokio::test]
async fn test_single_code_block_goes_to_inferred_path() {
    let dir = workspace("Write a script that prints the date");
    let implementer = Implementer::prepare(dir.path(), SmithConfig::default()).unwrap();
    let backend = ScriptedBackend::reply(
        "Here you go:\n\n```python\nimport datetime\nprint(datetime.date.today())\n```\n",
    );

    let report = implementer.run(&backend).await.unwrap();

    assert_eq!(
        report.outcome,
        RunOutcome::Model {
            tier: ExtractionTier::CodeBlock
        }
    );
    assert_eq!(report.paths(), vec!["scripts/implement.py"]);
    assert_eq!(
        read(&dir, "scripts/implement.py"),
        "import datetime\nprint(datetime.date.today())"
    );
    assert!(read(&dir, "EXEC_PLAN.md").contains("- scripts/implement.py (create)"));
}

#[tokio::test]
async fn test_transport_failure_falls_back_offline() {
    let dir = workspace("Refactor the login handler");
    let implementer = Implementer::prepare(dir.path(), SmithConfig::default()).unwrap();
    let backend =
        ScriptedBackend::failing(CompletionError::Transport("connection refused".to_string()));

    let report = implementer.run(&backend).await.unwrap();

    assert!(matches!(report.outcome, RunOutcome::Offline { .. }));
    assert_eq!(report.paths(), vec![fallback::FALLBACK_SCRIPT_PATH]);
    assert!(!read(&dir, fallback::FALLBACK_SCRIPT_PATH).is_empty());

    let plan = read(&dir, "EXEC_PLAN.md");
    assert!(!plan.trim().is_empty());
    assert!(plan.contains("connection refused"));
}

#[tokio::test]
async fn test_todo_keyword_produces_named_script_and_readme() {
    let dir = workspace("Create a daily TODO list generator");
    fs::create_dir_all(dir.path().join("templates")).unwrap();
    fs::write(
        dir.path().join("templates/daily_checklist.md"),
        "# Checklist\n- [ ] Stand-up\n- [ ] Inbox zero\n",
    )
    .unwrap();
    fs::write(dir.path().join("README.md"), "# Project\n").unwrap();

    let implementer = Implementer::prepare(dir.path(), SmithConfig::default()).unwrap();
    let backend = ScriptedBackend::failing(CompletionError::Http {
        status: 500,
        body: "upstream".to_string(),
    });

    let report = implementer.run(&backend).await.unwrap();

    assert_eq!(report.paths(), vec![fallback::TODO_SCRIPT_PATH, "README.md"]);
    assert!(!dir.path().join(fallback::FALLBACK_SCRIPT_PATH).exists());

    let script = read(&dir, fallback::TODO_SCRIPT_PATH);
    assert!(script.contains("\"Stand-up\","));
    assert!(script.contains("\"Inbox zero\","));

    let readme = read(&dir, "README.md");
    assert!(readme.starts_with("# Project"));
    assert!(readme.contains(fallback::README_SECTION_HEADING));

    let plan = read(&dir, "EXEC_PLAN.md");
    assert!(plan.contains("- scripts/generate_todo.py (create - offline fallback)"));
    assert!(plan.contains("- README.md (modify - usage section)"));
}

#[tokio::test]
async fn test_malformed_reply_degrades_to_placeholder() {
    let dir = workspace("Add a python helper");
    let implementer = Implementer::prepare(dir.path(), SmithConfig::default()).unwrap();
    let backend = ScriptedBackend::reply("## File 1: helper.py\nI would write the helper here.\n");

    let report = implementer.run(&backend).await.unwrap();

    assert_eq!(
        report.outcome,
        RunOutcome::Model {
            tier: ExtractionTier::Placeholder
        }
    );
    assert_eq!(report.paths(), vec!["scripts/generated.py"]);
    assert!(read(&dir, "scripts/generated.py").contains("def main():"));
}

#[tokio::test]
async fn test_plan_is_overwritten_each_run() {
    let dir = workspace("Add a greet function");
    fs::write(dir.path().join("EXEC_PLAN.md"), "stale plan from last run").unwrap();
    let implementer = Implementer::prepare(dir.path(), SmithConfig::default()).unwrap();

    implementer
        .run(&ScriptedBackend::reply(TWO_FILES))
        .await
        .unwrap();

    let plan = read(&dir, "EXEC_PLAN.md");
    assert!(!plan.contains("stale plan"));
}
