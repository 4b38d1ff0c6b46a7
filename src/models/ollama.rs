use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::traits::LanguageModel;
use super::types::{ChatMessage, GenerationOptions, ModelResponse, StreamCallback, TokenUsage};
use crate::constants::HTTP_REQUEST_TIMEOUT_SECS;
use crate::utils::{DocChatError, Result};

/// Chat model served by a local Ollama instance
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model_name: String,
}

impl OllamaModel {
    /// Create a new Ollama chat model
    pub fn new(base_url: &str, model_name: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DocChatError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
        })
    }

    fn request_body(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        stream: bool,
    ) -> serde_json::Value {
        let mut model_options = serde_json::Map::new();
        if let Some(temp) = options.temperature {
            model_options.insert("temperature".to_string(), json!(temp));
        }
        if let Some(top_p) = options.top_p {
            model_options.insert("top_p".to_string(), json!(top_p));
        }
        if let Some(max_tokens) = options.max_tokens {
            model_options.insert("num_predict".to_string(), json!(max_tokens));
        }

        json!({
            "model": self.model_name,
            "messages": messages,
            "stream": stream,
            "options": model_options,
        })
    }

    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                DocChatError::Connection(format!(
                    "Failed to connect to Ollama at {}. Is `ollama serve` running? ({})",
                    self.base_url, e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocChatError::Model(format!(
                "Ollama returned {}: {}",
                status,
                extract_error(&error_text)
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        stream_callback: Option<StreamCallback>,
    ) -> Result<ModelResponse> {
        let body = self.request_body(messages, options, stream_callback.is_some());
        let response = self.send(&body).await?;

        let Some(callback) = stream_callback else {
            let chat: ChatResponse = response
                .json()
                .await
                .map_err(|e| DocChatError::from_transport("Ollama", e))?;
            if let Some(error) = chat.error {
                return Err(DocChatError::Model(error));
            }
            let usage = chat.usage();
            return Ok(ModelResponse {
                content: chat.message.map(|m| m.content).unwrap_or_default(),
                usage,
                model_name: self.model_name.clone(),
            });
        };

        // Streaming response: one JSON object per line
        let mut stream = response.bytes_stream();
        let mut buffer = bytes::BytesMut::new();
        let mut assembled = StreamedChat::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DocChatError::from_transport("Ollama", e))?;
            buffer.extend_from_slice(&chunk);

            while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                let line = buffer.split_to(newline + 1);
                assembled.apply_line(&String::from_utf8_lossy(&line), &callback)?;
            }
        }

        // Trailing line without a newline
        assembled.apply_line(&String::from_utf8_lossy(&buffer), &callback)?;

        Ok(ModelResponse {
            content: assembled.content,
            usage: assembled.usage,
            model_name: self.model_name.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Answer assembled from NDJSON stream lines
#[derive(Default)]
struct StreamedChat {
    content: String,
    usage: Option<TokenUsage>,
}

impl StreamedChat {
    fn apply_line(&mut self, line: &str, callback: &StreamCallback) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let part: ChatResponse = serde_json::from_str(line)?;
        if let Some(error) = part.error {
            return Err(DocChatError::Model(error));
        }
        if let Some(message) = &part.message {
            if !message.content.is_empty() {
                self.content.push_str(&message.content);
                callback(&message.content);
            }
        }
        if part.done {
            self.usage = part.usage();
        }
        Ok(())
    }
}

/// Pull the `error` field out of an Ollama error body, or return it as-is
fn extract_error(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    prompt_eval_count: Option<usize>,
    eval_count: Option<usize>,
    error: Option<String>,
}

impl ChatResponse {
    fn usage(&self) -> Option<TokenUsage> {
        match (self.prompt_eval_count, self.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_non_streaming_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama3.2:3b",
                "stream": false,
                "options": { "temperature": 0.5 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2:3b",
                "message": { "role": "assistant", "content": "The answer is 42." },
                "done": true,
                "prompt_eval_count": 10,
                "eval_count": 5
            })))
            .mount(&server)
            .await;

        let model = OllamaModel::new(&server.uri(), "llama3.2:3b").unwrap();
        let options = GenerationOptions {
            temperature: Some(0.5),
            ..Default::default()
        };
        let response = model
            .chat(&[ChatMessage::user("question")], &options, None)
            .await
            .unwrap();

        assert_eq!(response.content, "The answer is 42.");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn test_streaming_chat_reports_deltas() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"lo\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true,\"prompt_eval_count\":3,\"eval_count\":2}"
        );
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let model = OllamaModel::new(&server.uri(), "llama3.2:3b").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: StreamCallback = Arc::new(move |delta| {
            sink.lock().unwrap().push(delta.to_string());
        });

        let response = model
            .chat(
                &[ChatMessage::user("hi")],
                &GenerationOptions::default(),
                Some(callback),
            )
            .await
            .unwrap();

        assert_eq!(response.content, "Hello");
        assert_eq!(*seen.lock().unwrap(), vec!["Hel", "lo"]);
        assert_eq!(response.usage.unwrap().completion_tokens, 2);
    }

    #[test]
    fn test_stream_lines_accumulate_and_stop_on_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: StreamCallback = Arc::new(move |delta| {
            sink.lock().unwrap().push(delta.to_string());
        });

        let mut assembled = StreamedChat::default();
        assembled
            .apply_line("{\"message\":{\"content\":\"A\"},\"done\":false}\n", &callback)
            .unwrap();
        assembled.apply_line("   \n", &callback).unwrap();
        assembled
            .apply_line(
                "{\"message\":{\"content\":\"B\"},\"done\":true,\"prompt_eval_count\":1,\"eval_count\":2}",
                &callback,
            )
            .unwrap();
        assert_eq!(assembled.content, "AB");
        assert_eq!(assembled.usage.as_ref().unwrap().total_tokens, 3);
        assert_eq!(*seen.lock().unwrap(), vec!["A", "B"]);

        let err = assembled
            .apply_line("{\"error\":\"out of memory\"}", &callback)
            .unwrap_err();
        assert!(matches!(err, DocChatError::Model(msg) if msg == "out of memory"));
    }

    #[tokio::test]
    async fn test_non_streaming_error_body_is_model_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": "context too long" })),
            )
            .mount(&server)
            .await;

        let model = OllamaModel::new(&server.uri(), "llama3.2:3b").unwrap();
        let err = model
            .chat(&[ChatMessage::user("hi")], &GenerationOptions::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocChatError::Model(msg) if msg == "context too long"));
    }

    #[tokio::test]
    async fn test_error_status_is_model_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "error": "model 'nope' not found" })),
            )
            .mount(&server)
            .await;

        let model = OllamaModel::new(&server.uri(), "nope").unwrap();
        let err = model
            .chat(&[ChatMessage::user("hi")], &GenerationOptions::default(), None)
            .await
            .unwrap_err();

        match err {
            DocChatError::Model(msg) => assert!(msg.contains("model 'nope' not found")),
            other => panic!("expected Model error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        // Nothing listens on port 9 (discard) in the test environment
        let model = OllamaModel::new("http://127.0.0.1:9", "llama3.2:3b").unwrap();
        let err = model
            .chat(&[ChatMessage::user("hi")], &GenerationOptions::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocChatError::Connection(_)));
    }
}
