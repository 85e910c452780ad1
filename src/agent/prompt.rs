//! Prompt construction for the review agent.

use serde_json::Value;

use crate::tools::ToolDefinition;

/// Tool results longer than this are cut before being shown to the model.
pub const MAX_RESULT_CHARS: usize = 60_000;

/// Tool inputs (e.g. review content) longer than this are cut.
pub const MAX_INPUT_CHARS: usize = 20_000;

/// Upper bound on a rendered prompt. Older tool calls are stubbed out first.
pub const MAX_PROMPT_CHARS: usize = 100_000;

const FOOTER: &str = "\nReply with a single JSON object.\n";

pub const SYSTEM_PROMPT: &str = r#"You are a senior software engineer reviewing local, uncommitted changes in a git repository.

Work through the changes file by file. For each file, point out correctness problems, risky edge cases, unclear naming, missing tests and anything that hurts readability or maintainability. Be specific: quote the relevant lines and explain what should change. Mention what is done well, briefly. Do not invent problems; if a file looks fine, say so in one line.

You can call tools. Paths are relative to the directory you were started in; use "." for the current repository unless the user says otherwise.

Reply with exactly ONE JSON object and nothing else, in one of these two shapes:

To call a tool:
{"tool": "<tool name>", "input": { ...arguments matching the tool's input schema... }, "message": "<optional short note to show the user>"}

To finish:
{"final": "<your complete answer to the user, in markdown>"}

Call one tool per reply. You will see every tool result (or {"error": ...}) in the next prompt. When you have what you need, finish."#;

pub const DEFAULT_REVIEW_PROMPT: &str = "Review the code changes in the current directory. \
Start by listing the changed files and their diffs, then review each file. \
Suggest a conventional commit message for the unstaged changes. \
Finally save the full review as markdown in the ./reviews directory and reply with the review \
and the path it was saved to.";

/// One completed tool call, as remembered across steps.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub tool: String,
    pub input: Value,
    pub result: Value,
}

/// Render the full prompt for one model step.
///
/// The newest tool calls are shown in full. Once the prompt would exceed
/// [`MAX_PROMPT_CHARS`], older calls shrink to a one-line stub.
pub fn render_prompt(
    system: &str,
    tools: &[ToolDefinition],
    request: &str,
    transcript: &[TranscriptEntry],
) -> String {
    let catalogue = serde_json::to_string_pretty(tools).unwrap_or_default();

    let mut prompt = format!(
        "{system}\n\n## Available tools\n\n{catalogue}\n\n## User request\n\n{request}\n"
    );

    if !transcript.is_empty() {
        prompt.push_str("\n## Tool calls so far\n");

        let used = prompt.chars().count() + FOOTER.chars().count();
        let mut remaining = MAX_PROMPT_CHARS.saturating_sub(used);
        let mut sections = vec![String::new(); transcript.len()];

        for (i, entry) in transcript.iter().enumerate().rev() {
            let full = render_entry(i + 1, entry);
            let len = full.chars().count();
            sections[i] = if len <= remaining {
                full
            } else {
                format!(
                    "\n### {}. {}\n[omitted to keep the prompt short]\n",
                    i + 1,
                    entry.tool
                )
            };
            remaining = remaining.saturating_sub(sections[i].chars().count());
        }

        for section in sections {
            prompt.push_str(&section);
        }
    }

    prompt.push_str(FOOTER);
    prompt
}

fn render_entry(number: usize, entry: &TranscriptEntry) -> String {
    format!(
        "\n### {}. {}\nInput: {}\nResult: {}\n",
        number,
        entry.tool,
        truncate(&entry.input.to_string(), MAX_INPUT_CHARS),
        truncate(&entry.result.to_string(), MAX_RESULT_CHARS)
    )
}

/// Cut to at most `max_chars` characters, noting how much was dropped.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let dropped = text[idx..].chars().count();
            format!("{}... [truncated {} chars]", &text[..idx], dropped)
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definitions() -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "get-file-changes",
            description: "List changes",
            input_schema: json!({"type": "object"}),
        }]
    }

    #[test]
    fn test_prompt_contains_catalogue_and_request() {
        let prompt = render_prompt(SYSTEM_PROMPT, &definitions(), "review please", &[]);
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("\"name\": \"get-file-changes\""));
        assert!(prompt.contains("review please"));
        assert!(!prompt.contains("Tool calls so far"));
    }

    #[test]
    fn test_prompt_lists_transcript_in_order() {
        let transcript = vec![
            TranscriptEntry {
                tool: "get-file-changes".to_string(),
                input: json!({"rootDir": "."}),
                result: json!([]),
            },
            TranscriptEntry {
                tool: "write-review-to-markdown".to_string(),
                input: json!({}),
                result: json!({"error": "'outputDir' must not be empty"}),
            },
        ];

        let prompt = render_prompt(SYSTEM_PROMPT, &definitions(), "go", &transcript);
        let first = prompt.find("### 1. get-file-changes").unwrap();
        let second = prompt.find("### 2. write-review-to-markdown").unwrap();
        assert!(first < second);
        assert!(prompt.contains(r#"Input: {"rootDir":"."}"#));
        assert!(prompt.contains("must not be empty"));
    }

    fn big_result(tool: &str, size: usize) -> TranscriptEntry {
        TranscriptEntry {
            tool: tool.to_string(),
            input: json!({"rootDir": "."}),
            result: json!([{"file": "src/lib.rs", "diff": "+".repeat(size)}]),
        }
    }

    #[test]
    fn test_prompt_stays_under_cap_with_large_results() {
        let transcript = vec![
            big_result("get-file-changes", 60_000),
            big_result("get-file-changes", 60_000),
            big_result("get-file-changes", 60_000),
        ];

        let prompt = render_prompt(SYSTEM_PROMPT, &definitions(), "go", &transcript);

        assert!(prompt.chars().count() <= MAX_PROMPT_CHARS);
        assert!(prompt.contains("### 1. get-file-changes\n[omitted"));
        assert!(prompt.contains("### 2. get-file-changes\n[omitted"));
        assert!(prompt.contains("### 3. get-file-changes\nInput:"));
        assert!(prompt.ends_with(FOOTER));
    }

    #[test]
    fn test_small_transcript_is_kept_whole() {
        let transcript = vec![
            big_result("get-file-changes", 100),
            big_result("generate-commit-message", 100),
        ];

        let prompt = render_prompt(SYSTEM_PROMPT, &definitions(), "go", &transcript);
        assert!(!prompt.contains("[omitted"));
    }

    #[test]
    fn test_large_tool_input_is_truncated() {
        let transcript = vec![TranscriptEntry {
            tool: "write-review-to-markdown".to_string(),
            input: json!({"content": "r".repeat(50_000)}),
            result: json!({"bytes": 50_000}),
        }];

        let prompt = render_prompt(SYSTEM_PROMPT, &definitions(), "go", &transcript);
        assert!(prompt.contains("[truncated"));
        assert!(prompt.contains(r#"Result: {"bytes":50000}"#));
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("abcdef", 4), "abcd... [truncated 2 chars]");
        assert_eq!(truncate("ééé", 1), "é... [truncated 2 chars]");
    }
}
