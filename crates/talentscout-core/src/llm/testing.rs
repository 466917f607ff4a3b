//! Scripted provider shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use talentscout_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use super::box_provider::BoxLlmProvider;
use super::key_pool::{BackoffPolicy, KeyPool};
use super::provider::LlmProvider;
use super::resilient::{ResilientClient, RetryPolicy};

/// What the provider does on one call.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Fail(LlmError),
    /// Never answers within any reasonable timeout.
    Hang,
}

/// Records every call and replays scripted steps per credential.
///
/// Once a credential's script runs out, it falls back to the default step.
#[derive(Clone)]
pub struct ScriptedProvider {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Step>>>>,
    default_step: Step,
    calls: Arc<Mutex<Vec<(String, CompletionRequest)>>>,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(HashMap::new())),
            default_step: Step::Reply(text.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            default_step: Step::Fail(error),
            ..Self::replying("")
        }
    }

    /// Queue steps for one credential.
    pub fn script(self, secret: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(secret.to_string(), steps.into());
        self
    }

    /// Credentials used, in call order.
    pub fn secrets_used(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn complete(
        &self,
        api_key: &SecretString,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        let secret = api_key.expose_secret().to_string();
        self.calls
            .lock()
            .unwrap()
            .push((secret.clone(), request.clone()));
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&secret)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.default_step.clone());

        async move {
            match step {
                Step::Reply(content) => Ok(CompletionResponse {
                    content,
                    model: "scripted-model".to_string(),
                    finish_reason: Some("STOP".to_string()),
                    usage: Usage::default(),
                }),
                Step::Fail(err) => Err(err),
                Step::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(LlmError::Network("hung call woke up".to_string()))
                }
            }
        }
    }
}

/// Pool over `secret-1..=secret-n` with a 30s base cooldown.
pub fn test_pool(n: usize) -> Arc<KeyPool> {
    let secrets = (1..=n)
        .map(|i| SecretString::from(format!("secret-{i}")))
        .collect();
    Arc::new(
        KeyPool::new(
            secrets,
            BackoffPolicy::new(Duration::from_secs(30), Duration::from_secs(600)),
        )
        .unwrap(),
    )
}

pub fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 4,
        call_timeout: Duration::from_secs(5),
        initial_delay: Duration::from_millis(250),
        max_delay: Duration::from_secs(2),
    }
}

pub fn test_client(pool: Arc<KeyPool>, provider: ScriptedProvider) -> ResilientClient {
    ResilientClient::new(pool, Arc::new(BoxLlmProvider::new(provider)), test_policy())
}
