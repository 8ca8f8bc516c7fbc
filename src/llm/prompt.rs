use crate::llm::types::ChatMessage;

/// Fixed instructions: action vocabulary, coordinate convention, reply format.
pub const SYSTEM_PROMPT: &str = include_str!("../../prompts/system.md");

pub const ACKNOWLEDGEMENT: &str =
    "Understood. I will look at each screenshot and reply with REASONING and ACTION lines.";

/// System instruction plus the model's acknowledgement; never evicted from history.
pub fn leading_pair() -> [ChatMessage; 2] {
    [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::assistant(ACKNOWLEDGEMENT)]
}

/// Text of the per-turn user message (the screenshot is attached separately).
pub fn turn_prompt(instruction: &str, ui_summary: &str, crop_window: Option<&str>) -> String {
    let mut text = format!(
        "Task: {instruction}\n\n{ui_summary}\n\nCurrent screen state is attached. What are the next actions?"
    );
    if let Some(window) = crop_window {
        text.push_str(&format!(
            "\n\nNote: the screenshot shows only the active window \"{window}\". \
             Coordinates refer to this screenshot. Use the _ABS actions for screen=(x, y) \
             positions from the UI element list."
        ));
    }
    text
}

/// Corrective message appended when the loop guard detects a stuck loop.
pub fn stuck_hint(reasons: &[&str]) -> String {
    format!(
        "SYSTEM HINT: You appear stuck ({}). The last actions did not make progress. \
         Try a different approach: use a different element or coordinates, a keyboard \
         shortcut, OPEN_APP, or SHELL. If the task is already complete, reply with ACTION: DONE.",
        reasons.join(", ")
    )
}
