use async_trait::async_trait;
use futures_util::StreamExt;

use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::llm::provider::LlmProvider;
use crate::llm::sse_parser;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse, StreamChunkKind, TokenUsage};

/// Chat-completions client for any OpenAI-compatible endpoint (Gemini's and xAI's
/// compatibility layers included).
pub struct OpenAiCompatibleProvider {
    id: String,
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(id: String, api_base: String, api_key: String) -> Self {
        Self {
            id,
            api_base,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

pub fn build_request_body(messages: &[ChatMessage], cfg: &CallConfig) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": cfg.model,
        "messages": messages,
        "stream": cfg.stream,
        "temperature": cfg.temperature,
    });
    if cfg.stream {
        body["stream_options"] = serde_json::json!({ "include_usage": true });
    }
    body
}

/// Copy of a request body with base64 image payloads replaced, for logging.
pub fn sanitize_for_log(body: &serde_json::Value) -> serde_json::Value {
    let mut log_body = body.clone();
    if let Some(msgs) = log_body.get_mut("messages").and_then(|m| m.as_array_mut()) {
        for msg in msgs {
            // content can be a string or an array of parts; only parts carry images
            let Some(parts) = msg.get_mut("content").and_then(|c| c.as_array_mut()) else {
                continue;
            };
            for part in parts {
                if part.get("type").and_then(|t| t.as_str()) == Some("image_url") {
                    if let Some(url) = part.get_mut("image_url").and_then(|i| i.get_mut("url")) {
                        *url = serde_json::Value::String("<omitted_base64_image>".to_string());
                    }
                }
            }
        }
    }
    log_body
}

/// Map a non-success HTTP response to the crate error.
pub fn classify_error(status: u16, body: &str) -> DeskPilotError {
    let lower = body.to_lowercase();
    let missing_model = lower.contains("model")
        && (lower.contains("not found") || lower.contains("not_found") || lower.contains("does not exist"));
    if status == 404 || missing_model {
        DeskPilotError::ModelUnavailable(format!("{status}: {body}"))
    } else {
        DeskPilotError::LlmProvider(format!("{status}: {body}"))
    }
}

/// Accumulates an SSE byte stream into a response. Lines may be split across
/// network chunks, including inside multi-byte characters.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    pending: Vec<u8>,
    content: String,
    reasoning: String,
    usage: Option<TokenUsage>,
    done: bool,
}

impl SseAccumulator {
    /// Feed raw bytes; returns `true` once the `[DONE]` marker was seen.
    pub fn feed(&mut self, bytes: &[u8]) -> bool {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.consume_line(line.trim());
            if self.done {
                break;
            }
        }
        self.done
    }

    fn consume_line(&mut self, line: &str) {
        match sse_parser::parse_sse_line(line) {
            Ok(Some(chunk)) => match chunk.kind {
                StreamChunkKind::Reasoning => self.reasoning.push_str(&chunk.content),
                StreamChunkKind::Content => self.content.push_str(&chunk.content),
                StreamChunkKind::Usage => self.usage = chunk.usage,
                StreamChunkKind::Done => self.done = true,
            },
            Ok(None) => {}
            Err(e) => tracing::debug!("SSE parse skipped: {e}"),
        }
    }

    pub fn finish(mut self) -> LlmResponse {
        // a final line without trailing newline
        if !self.done && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.consume_line(line.trim());
        }
        LlmResponse {
            content: self.content,
            reasoning: self.reasoning,
            usage: self.usage,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn chat(&self, messages: &[ChatMessage], cfg: &CallConfig) -> DeskPilotResult<LlmResponse> {
        let body = build_request_body(messages, cfg);

        tracing::debug!(
            provider = %self.id,
            model = %cfg.model,
            stream = cfg.stream,
            messages = messages.len(),
            "sending LLM request"
        );
        tracing::debug!(
            body = %serde_json::to_string(&sanitize_for_log(&body)).unwrap_or_default(),
            "request body (sanitized, base64 omitted)"
        );

        let response = self
            .client
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &err_body));
        }

        if cfg.stream {
            self.handle_stream(response).await
        } else {
            self.handle_json(response).await
        }
    }
}

impl OpenAiCompatibleProvider {
    /// Handle SSE streaming response.
    async fn handle_stream(&self, response: reqwest::Response) -> DeskPilotResult<LlmResponse> {
        let mut byte_stream = response.bytes_stream();
        let mut acc = SseAccumulator::default();

        while let Some(result) = byte_stream.next().await {
            let bytes = result?;
            if acc.feed(&bytes) {
                break;
            }
        }

        let resp = acc.finish();
        tracing::info!(
            content_len = resp.content.len(),
            reasoning_len = resp.reasoning.len(),
            usage = ?resp.usage,
            "LLM stream complete"
        );
        Ok(resp)
    }

    /// Handle a non-streaming JSON response.
    async fn handle_json(&self, response: reqwest::Response) -> DeskPilotResult<LlmResponse> {
        let json: serde_json::Value = response.json().await?;

        let message = &json["choices"][0]["message"];
        let content = message["content"].as_str().unwrap_or("").to_string();
        let reasoning = message["reasoning_content"].as_str().unwrap_or("").to_string();
        let usage = sse_parser::usage_from_json(&json);

        tracing::info!(content_len = content.len(), usage = ?usage, "LLM JSON response received");

        Ok(LlmResponse { content, reasoning, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(stream: bool) -> CallConfig {
        CallConfig { model: "gemini-test".into(), stream, temperature: 0.0 }
    }

    #[test]
    fn streaming_requests_ask_for_usage() {
        let body = build_request_body(&[ChatMessage::user("hi")], &cfg(true));
        assert_eq!(body["stream_options"]["include_usage"], true);
        assert_eq!(body["model"], "gemini-test");
        let body = build_request_body(&[ChatMessage::user("hi")], &cfg(false));
        assert!(body.get("stream_options").is_none());
    }

    #[test]
    fn log_body_omits_images_only() {
        let msgs = vec![
            ChatMessage::system("rules"),
            ChatMessage::user_with_image("Task: x", "data:image/jpeg;base64,QUJD"),
        ];
        let body = build_request_body(&msgs, &cfg(false));
        let logged = serde_json::to_string(&sanitize_for_log(&body)).unwrap();
        assert!(!logged.contains("QUJD"));
        assert!(logged.contains("<omitted_base64_image>"));
        assert!(logged.contains("Task: x"));
        // the real body is untouched
        assert!(serde_json::to_string(&body).unwrap().contains("QUJD"));
    }

    #[test]
    fn missing_models_are_unavailable() {
        assert!(matches!(classify_error(404, ""), DeskPilotError::ModelUnavailable(_)));
        assert!(matches!(
            classify_error(400, r#"{"error":{"message":"models/gemini-9 is not found for API version v1beta"}}"#),
            DeskPilotError::ModelUnavailable(_)
        ));
        assert!(matches!(classify_error(429, "rate limited"), DeskPilotError::LlmProvider(_)));
        assert!(matches!(classify_error(500, "internal"), DeskPilotError::LlmProvider(_)));
    }

    #[test]
    fn accumulator_handles_split_lines_and_usage() {
        let mut acc = SseAccumulator::default();
        let stream = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"REASONING: ok\\n\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ACTION: TYPE('h\u{e9}')\"}}]}\n\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":5}}\n\n",
            "data: [DONE]\n\n",
        )
        .as_bytes();
        // split into awkward pieces, including inside the two-byte é
        let split = stream.iter().position(|b| *b == 0xC3).unwrap() + 1;
        assert!(!acc.feed(&stream[..7]));
        assert!(!acc.feed(&stream[7..split]));
        assert!(acc.feed(&stream[split..]));

        let resp = acc.finish();
        assert_eq!(resp.content, "REASONING: ok\nACTION: TYPE('h\u{e9}')");
        assert_eq!(resp.usage, Some(TokenUsage { input_tokens: 10, output_tokens: 5 }));
    }

    #[test]
    fn accumulator_without_done_marker_keeps_tail() {
        let mut acc = SseAccumulator::default();
        acc.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"ACTION: DONE\"}}]}");
        let resp = acc.finish();
        assert_eq!(resp.content, "ACTION: DONE");
        assert_eq!(resp.usage, None);
    }
}
