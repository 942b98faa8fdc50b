//! # Generation Backend Module
//!
//! The scheduler's only external collaborator: a text-generation engine
//! exposing one batched completion call. The trait is the contract; the
//! HTTP adapter speaks the common batched `/v1/completions` dialect and
//! stays deliberately thin.

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

/* INTERFACES */

#[async_trait]
pub trait Generate: Send + Sync {
    /// Generates one completion per prompt, in prompt order. Either the
    /// whole batch succeeds or the call fails; partial results are not
    /// returned.
    async fn generate(&self, prompts: &[String]) -> Result<Vec<String>>;

    /// Single-prompt fallback used when a batch call fails.
    async fn generate_one(&self, prompt: &str) -> Result<String> {
        let mut completions =
            self.generate(std::slice::from_ref(&prompt.to_owned())).await?;
        completions
            .pop()
            .context("Backend returned no completion for the prompt.")
    }
}

/* HTTP ADAPTER */

/// Sampling controls forwarded verbatim to the engine.
#[derive(Clone, Debug)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f64,
    pub stop: Vec<String>,
    pub seed: Option<u64>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            max_tokens: 16384,
            temperature: 0.0,
            stop: Vec::new(),
            seed: None,
        }
    }
}

/// Client for an engine serving the batched completions endpoint.
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    sampling: Sampling,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a [String],
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    index: usize,
    text: String,
}

impl HttpBackend {
    /// Builds a client against `base_url` (e.g. `http://localhost:8000`)
    /// for the named model.
    pub fn new(base_url: &str, model: &str, sampling: Sampling) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}/v1/completions",
                base_url.trim_end_matches('/'),
            ),
            model: model.to_owned(),
            sampling,
        }
    }
}

#[async_trait]
impl Generate for HttpBackend {
    async fn generate(&self, prompts: &[String]) -> Result<Vec<String>> {
        let request = CompletionRequest {
            model: &self.model,
            prompt: prompts,
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
            stop: self.sampling.stop.clone(),
            seed: self.sampling.seed,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .context("Generation request failed to send.")?
            .error_for_status()
            .context("Generation request was rejected.")?;
        let body: CompletionResponse = response
            .json()
            .await
            .context("Generation response was not valid JSON.")?;

        if body.choices.len() != prompts.len() {
            bail!(
                "Backend returned {} completions for {} prompts.",
                body.choices.len(),
                prompts.len(),
            );
        }

        let mut completions = vec![String::new(); prompts.len()];
        for choice in body.choices {
            let slot = completions
                .get_mut(choice.index)
                .with_context(|| {
                    format!("Backend returned stray index {}.", choice.index)
                })?;
            *slot = choice.text;
        }
        Ok(completions)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn completion_requests_serialize_the_batch() {
        let request = CompletionRequest {
            model: "test-model",
            prompt: &["a".to_owned(), "b".to_owned()],
            max_tokens: 64,
            temperature: 0.0,
            stop: vec!["</im_end>".to_owned()],
            seed: Some(1234),
        };
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded["prompt"].as_array().unwrap().len(), 2);
        assert_eq!(encoded["seed"], 1234);
        assert_eq!(encoded["stop"][0], "</im_end>");
    }

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        let request = CompletionRequest {
            model: "test-model",
            prompt: &[],
            max_tokens: 64,
            temperature: 1.0,
            stop: Vec::new(),
            seed: None,
        };
        let encoded = serde_json::to_value(&request).unwrap();
        assert!(encoded.get("seed").is_none());
        assert!(encoded.get("stop").is_none());
    }

    #[tokio::test]
    async fn generate_one_defaults_through_the_batch_call() {
        struct Echo;

        #[async_trait]
        impl Generate for Echo {
            async fn generate(
                &self,
                prompts: &[String],
            ) -> Result<Vec<String>> {
                Ok(prompts
                    .iter()
                    .map(|p| format!("echo: {p}"))
                    .collect())
            }
        }

        let completion = Echo.generate_one("hello").await.unwrap();
        assert_eq!(completion, "echo: hello");
    }
}
