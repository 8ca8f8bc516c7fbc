use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::llm::types::{StreamChunk, StreamChunkKind, TokenUsage};

/// Reads `usage.prompt_tokens` / `usage.completion_tokens` from a response object.
pub fn usage_from_json(json: &serde_json::Value) -> Option<TokenUsage> {
    let usage = json.get("usage")?;
    if usage.is_null() {
        return None;
    }
    Some(TokenUsage {
        input_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0),
        output_tokens: usage["completion_tokens"].as_u64().unwrap_or(0),
    })
}

/// Parses a raw SSE line (OpenAI-compatible format) into a StreamChunk.
/// Returns None if the line is a keep-alive or non-data line.
///
/// With `stream_options.include_usage` the final data event carries `usage` and an
/// empty `choices` array; a `finish_reason` alone does not end the stream so that
/// this event is still read.
pub fn parse_sse_line(line: &str) -> DeskPilotResult<Option<StreamChunk>> {
    if line.is_empty() || line.starts_with(':') {
        return Ok(None);
    }

    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
        return Ok(None);
    };

    if data == "[DONE]" {
        return Ok(Some(StreamChunk::new(StreamChunkKind::Done, "")));
    }

    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| DeskPilotError::SseParsing(e.to_string()))?;

    if let Some(usage) = usage_from_json(&json) {
        return Ok(Some(StreamChunk {
            kind: StreamChunkKind::Usage,
            content: String::new(),
            usage: Some(usage),
        }));
    }

    let Some(first) = json["choices"].as_array().and_then(|c| c.first()) else {
        return Ok(None);
    };
    let delta = &first["delta"];

    // Reasoning content (some models expose this)
    if let Some(reasoning) = delta["reasoning_content"].as_str() {
        if !reasoning.is_empty() {
            return Ok(Some(StreamChunk::new(StreamChunkKind::Reasoning, reasoning)));
        }
    }

    if let Some(content) = delta["content"].as_str() {
        if !content.is_empty() {
            return Ok(Some(StreamChunk::new(StreamChunkKind::Content, content)));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_alives_and_comments_are_skipped() {
        assert_eq!(parse_sse_line("").unwrap(), None);
        assert_eq!(parse_sse_line(": ping").unwrap(), None);
        assert_eq!(parse_sse_line("event: message").unwrap(), None);
    }

    #[test]
    fn content_and_reasoning_deltas() {
        let line = r#"data: {"choices":[{"delta":{"content":"ACTION: CLICK(1, 2)"}}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.kind, StreamChunkKind::Content);
        assert_eq!(chunk.content, "ACTION: CLICK(1, 2)");

        let line = r#"data: {"choices":[{"delta":{"reasoning_content":"hmm"}}]}"#;
        assert_eq!(parse_sse_line(line).unwrap().unwrap().kind, StreamChunkKind::Reasoning);
    }

    #[test]
    fn usage_event_is_reported() {
        let line = r#"data: {"choices":[],"usage":{"prompt_tokens":1200,"completion_tokens":34}}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.kind, StreamChunkKind::Usage);
        assert_eq!(chunk.usage, Some(TokenUsage { input_tokens: 1200, output_tokens: 34 }));
    }

    #[test]
    fn null_usage_is_ignored() {
        let line = r#"data: {"choices":[{"delta":{"content":"x"}}],"usage":null}"#;
        assert_eq!(parse_sse_line(line).unwrap().unwrap().kind, StreamChunkKind::Content);
    }

    #[test]
    fn done_marker_with_or_without_space() {
        assert_eq!(parse_sse_line("data: [DONE]").unwrap().unwrap().kind, StreamChunkKind::Done);
        assert_eq!(parse_sse_line("data:[DONE]").unwrap().unwrap().kind, StreamChunkKind::Done);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(parse_sse_line("data: {oops"), Err(DeskPilotError::SseParsing(_))));
    }
}
