use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use glimpse_contracts::error::GameError;
use glimpse_contracts::events::{EventLog, EventPayload};
use glimpse_contracts::game::{
    apply_guess, reset_session, resume_session, start_session, ChatMessage, Difficulty,
    GuessReport, GuessSubmission, ImageRecord, Role, SessionConfig, SessionState,
};
use glimpse_contracts::snapshot::SnapshotStore;
use image::{Rgb, RgbImage};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

const DEFAULT_FEATURE_LEXICON_JSON: &str = include_str!("../resources/default_features.json");

/// Substituted whenever feature generation returns nothing usable.
pub const FALLBACK_FEATURES: &[&str] = &["object", "color", "background"];

pub const GENERIC_HINT_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't come up with a hint just now. Try another guess!";
pub const SAFETY_BLOCKED_MESSAGE: &str =
    "That request was blocked by the content filter. Try describing the image differently.";

pub const IMAGE_FILE: &str = "image.json";
pub const EVENTS_FILE: &str = "events.jsonl";

#[derive(Debug, Clone)]
pub struct ImageGenerateRequest {
    pub session_dir: PathBuf,
    pub prompt: String,
    pub size: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Local path or remote URL of the rendered image.
    pub url: String,
    pub alt_text: String,
}

pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &ImageGenerateRequest) -> Result<GeneratedImage>;
}

pub trait FeatureProvider: Send + Sync {
    fn name(&self) -> &str;
    /// May legitimately return an empty list; the engine then applies
    /// `FALLBACK_FEATURES`.
    fn generate_features(&self, description: &str, count: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Error)]
pub enum HintError {
    #[error("hint generation failed: {0}")]
    Failed(String),
    #[error("hint blocked by content policy: {0}")]
    SafetyBlocked(String),
}

pub trait HintProvider: Send + Sync {
    fn name(&self) -> &str;
    fn hint(
        &self,
        remaining: &[String],
        guess: &str,
        history: &[ChatMessage],
    ) -> std::result::Result<String, HintError>;
}

#[derive(Default)]
pub struct ImageProviderRegistry {
    providers: BTreeMap<String, Box<dyn ImageProvider>>,
}

impl ImageProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: ImageProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ImageProvider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

pub struct DryrunImageProvider;

impl ImageProvider for DryrunImageProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &ImageGenerateRequest) -> Result<GeneratedImage> {
        let (width, height) = parse_dims(&request.size);
        let image_path = request
            .session_dir
            .join(format!("artifact-{}.png", prompt_fingerprint(&request.prompt)));
        write_dryrun_image(&image_path, width, height, &request.prompt)?;
        Ok(GeneratedImage {
            url: image_path.to_string_lossy().to_string(),
            alt_text: request.prompt.clone(),
        })
    }
}

pub struct DryrunFeatureProvider {
    topics: BTreeMap<String, Vec<String>>,
    generic: Vec<String>,
}

impl DryrunFeatureProvider {
    pub fn new() -> Self {
        let lexicon: Value =
            serde_json::from_str(DEFAULT_FEATURE_LEXICON_JSON).unwrap_or(Value::Null);
        let mut topics = BTreeMap::new();
        if let Some(rows) = lexicon.get("topics").and_then(Value::as_object) {
            for (topic, features) in rows {
                topics.insert(topic.clone(), value_as_string_list(Some(features)));
            }
        }
        let generic = value_as_string_list(lexicon.get("generic"));
        Self { topics, generic }
    }
}

impl Default for DryrunFeatureProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureProvider for DryrunFeatureProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_features(&self, description: &str, count: usize) -> Result<Vec<String>> {
        let normalized = description.trim().to_lowercase();
        let mut features: Vec<String> = Vec::new();
        for (topic, candidates) in &self.topics {
            if !normalized.contains(topic.as_str()) {
                continue;
            }
            for candidate in candidates {
                if !features.contains(candidate) {
                    features.push(candidate.clone());
                }
            }
        }
        if features.is_empty() {
            return Ok(Vec::new());
        }
        for extra in &self.generic {
            if features.len() >= count {
                break;
            }
            if !features.contains(extra) {
                features.push(extra.clone());
            }
        }
        features.truncate(count);
        Ok(features)
    }
}

pub struct DryrunHintProvider;

impl HintProvider for DryrunHintProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn hint(
        &self,
        remaining: &[String],
        _guess: &str,
        _history: &[ChatMessage],
    ) -> std::result::Result<String, HintError> {
        let Some(target) = remaining.first() else {
            return Ok("You've already found everything there is to see!".to_string());
        };
        let trimmed = target.trim();
        let first = trimmed.chars().next().unwrap_or('?').to_lowercase();
        let words = trimmed.split_whitespace().count();
        Ok(format!(
            "Keep looking! One thing in the picture is {words} word(s) long and starts with '{first}'."
        ))
    }
}

pub struct OpenAiImageProvider {
    api_base: String,
    http: HttpClient,
    model: String,
}

impl OpenAiImageProvider {
    pub fn new(model: Option<String>) -> Self {
        Self {
            api_base: openai_api_base(),
            http: HttpClient::new(),
            model: model.unwrap_or_else(|| "gpt-image-1".to_string()),
        }
    }
}

impl ImageProvider for OpenAiImageProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate(&self, request: &ImageGenerateRequest) -> Result<GeneratedImage> {
        let Some(api_key) = openai_api_key() else {
            bail!("OPENAI_API_KEY is not set");
        };
        let endpoint = format!("{}/images/generations", self.api_base);
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };
        let payload = json!({
            "model": model,
            "prompt": request.prompt,
            "n": 1,
            "size": request.size,
        });
        let (status, body) = post_json(&self.http, &endpoint, &api_key, &payload)?;
        if status >= 400 {
            bail!("image generation failed with status {status}: {}", error_message(&body));
        }

        let first = body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .context("image response carried no data")?;
        if let Some(url) = first.get("url").and_then(Value::as_str) {
            return Ok(GeneratedImage {
                url: url.to_string(),
                alt_text: request.prompt.clone(),
            });
        }
        let encoded = first
            .get("b64_json")
            .and_then(Value::as_str)
            .context("image response carried neither url nor b64_json")?;
        let bytes = BASE64
            .decode(encoded)
            .context("image payload was not valid base64")?;
        let image_path = request
            .session_dir
            .join(format!("artifact-{}.png", timestamp_millis()));
        std::fs::write(&image_path, bytes)
            .with_context(|| format!("failed to write {}", image_path.display()))?;
        Ok(GeneratedImage {
            url: image_path.to_string_lossy().to_string(),
            alt_text: request.prompt.clone(),
        })
    }
}

pub struct OpenAiFeatureProvider {
    api_base: String,
    http: HttpClient,
    model: String,
}

impl OpenAiFeatureProvider {
    pub fn new(model: Option<String>) -> Self {
        Self {
            api_base: openai_api_base(),
            http: HttpClient::new(),
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        }
    }
}

impl FeatureProvider for OpenAiFeatureProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate_features(&self, description: &str, count: usize) -> Result<Vec<String>> {
        let Some(api_key) = openai_api_key() else {
            bail!("OPENAI_API_KEY is not set");
        };
        let endpoint = format!("{}/chat/completions", self.api_base);
        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You list short, concrete visual features of an image. \
                                Respond with a JSON array of strings and nothing else.",
                },
                {
                    "role": "user",
                    "content": format!(
                        "List exactly {count} short descriptive features a player could spot in: {description}"
                    ),
                },
            ],
            "temperature": 0.4,
        });
        let (status, body) = post_json(&self.http, &endpoint, &api_key, &payload)?;
        if status >= 400 {
            bail!("feature generation failed with status {status}: {}", error_message(&body));
        }
        let content = chat_completion_content(&body)
            .context("feature response carried no message content")?;
        // Strict boundary: the model must produce a JSON array of strings,
        // anything else is rejected rather than coerced.
        let parsed: Value = serde_json::from_str(content.trim())
            .context("feature response was not valid JSON")?;
        let rows = parsed
            .as_array()
            .context("feature response was not a JSON array")?;
        let mut features = Vec::new();
        for row in rows {
            let Some(text) = row.as_str() else {
                bail!("feature response contained a non-string entry");
            };
            if !text.trim().is_empty() {
                features.push(text.trim().to_string());
            }
        }
        features.truncate(count);
        Ok(features)
    }
}

pub struct OpenAiHintProvider {
    api_base: String,
    http: HttpClient,
    model: String,
}

impl OpenAiHintProvider {
    pub fn new(model: Option<String>) -> Self {
        Self {
            api_base: openai_api_base(),
            http: HttpClient::new(),
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        }
    }
}

impl HintProvider for OpenAiHintProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn hint(
        &self,
        remaining: &[String],
        guess: &str,
        history: &[ChatMessage],
    ) -> std::result::Result<String, HintError> {
        let Some(api_key) = openai_api_key() else {
            return Err(HintError::Failed("OPENAI_API_KEY is not set".to_string()));
        };
        let endpoint = format!("{}/chat/completions", self.api_base);

        let mut messages = vec![json!({
            "role": "system",
            "content": format!(
                "You are the assistant in an image guessing game. The features still to be \
                 found are: {}. Nudge the player toward one of them without ever naming it \
                 verbatim. Keep it to one or two sentences.",
                remaining.join(", ")
            ),
        })];
        for message in history.iter().rev().take(8).rev() {
            let role = match message.role {
                Role::Player => "user",
                Role::Assistant => "assistant",
            };
            messages.push(json!({ "role": role, "content": message.text }));
        }
        messages.push(json!({
            "role": "user",
            "content": format!("My guess was: {guess}. Give me a hint."),
        }));

        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
        });
        let (status, body) = post_json(&self.http, &endpoint, &api_key, &payload)
            .map_err(|err| HintError::Failed(format!("{err:#}")))?;
        if status >= 400 {
            let message = error_message(&body);
            if is_safety_rejection(&body) {
                return Err(HintError::SafetyBlocked(message));
            }
            return Err(HintError::Failed(format!("status {status}: {message}")));
        }
        if finish_reason(&body) == Some("content_filter") {
            return Err(HintError::SafetyBlocked(
                "completion stopped by content filter".to_string(),
            ));
        }
        chat_completion_content(&body)
            .map(str::to_string)
            .ok_or_else(|| HintError::Failed("hint response carried no content".to_string()))
    }
}

/// Player-supplied setup for one game.
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub topic: String,
    pub style: String,
    pub age: Option<u32>,
    pub difficulty: Difficulty,
    pub attempts: u32,
    pub threshold: u32,
}

impl GameSetup {
    fn to_config(&self) -> SessionConfig {
        SessionConfig {
            max_attempts: self.attempts,
            win_threshold: self.threshold,
            topic: self.topic.trim().to_string(),
            style: self.style.trim().to_string(),
            age: self.age,
            difficulty: self.difficulty,
        }
    }
}

/// Drives one session end to end: generation, scoring, hints, persistence,
/// and the event log.
pub struct GameEngine {
    session_dir: PathBuf,
    events: EventLog,
    snapshots: SnapshotStore,
    images: ImageProviderRegistry,
    image_provider: String,
    image_model: String,
    features: Box<dyn FeatureProvider>,
    hints: Box<dyn HintProvider>,
}

impl GameEngine {
    pub fn new(
        session_dir: impl Into<PathBuf>,
        image_model: Option<String>,
        hint_model: Option<String>,
    ) -> Result<Self> {
        let session_dir = session_dir.into();
        std::fs::create_dir_all(&session_dir)?;
        let session_id = session_dir
            .file_name()
            .and_then(|value| value.to_str())
            .filter(|value| !value.is_empty())
            .unwrap_or("session-rs")
            .to_string();
        let events = EventLog::new(session_dir.join(EVENTS_FILE), session_id);
        let snapshots = SnapshotStore::new(&session_dir);

        let mut images = ImageProviderRegistry::new();
        images.register(DryrunImageProvider);
        images.register(OpenAiImageProvider::new(image_model.clone()));

        let online = openai_api_key().is_some();
        let image_provider = if online { "openai" } else { "dryrun" }.to_string();
        let features: Box<dyn FeatureProvider> = if online {
            Box::new(OpenAiFeatureProvider::new(hint_model.clone()))
        } else {
            Box::new(DryrunFeatureProvider::new())
        };
        let hints: Box<dyn HintProvider> = if online {
            Box::new(OpenAiHintProvider::new(hint_model))
        } else {
            Box::new(DryrunHintProvider)
        };

        Ok(Self {
            session_dir,
            events,
            snapshots,
            images,
            image_provider,
            image_model: image_model.unwrap_or_default(),
            features,
            hints,
        })
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn event_log(&self) -> EventLog {
        self.events.clone()
    }

    pub fn set_image_provider(&mut self, name: &str) -> bool {
        if self.images.get(name).is_some() {
            self.image_provider = name.to_string();
            return true;
        }
        false
    }

    pub fn set_feature_provider(&mut self, provider: Box<dyn FeatureProvider>) {
        self.features = provider;
    }

    pub fn set_hint_provider(&mut self, provider: Box<dyn HintProvider>) {
        self.hints = provider;
    }

    /// Generates an image plus features and opens a fresh session.
    pub fn new_game(&mut self, setup: &GameSetup) -> Result<SessionState> {
        if setup.topic.trim().is_empty() {
            return Err(GameError::Configuration("topic is required".to_string()).into());
        }
        let config = setup.to_config();
        let prompt = build_prompt(&config);

        let request = ImageGenerateRequest {
            session_dir: self.session_dir.clone(),
            prompt: prompt.clone(),
            size: "1024x1024".to_string(),
            model: self.image_model.clone(),
        };
        let generated = self.generate_with_fallback(&request)?;

        let wanted = setup.difficulty.feature_count();
        let features = match self.features.generate_features(&prompt, wanted) {
            Ok(features) if !features.is_empty() => features,
            Ok(_) => self.fallback_features(&prompt, "empty")?,
            Err(err) => self.fallback_features(&prompt, &format!("{err:#}"))?,
        };

        let image = ImageRecord::new(generated.url, generated.alt_text, features, setup.difficulty)
            .map_err(|err| GameError::Generation(err.to_string()))?;
        write_json(&self.session_dir.join(IMAGE_FILE), &serde_json::to_value(&image)?)?;

        let state = start_session(config, image)?;
        self.snapshots.sync(&state)?;
        self.events.emit(
            "session_started",
            payload(json!({
                "topic": setup.topic,
                "difficulty": setup.difficulty.as_str(),
                "attempts": setup.attempts,
                "threshold": setup.threshold,
                "features": state.total_features(),
            })),
        )?;
        Ok(state)
    }

    /// Scores one guess and appends the assistant reply. The scoring outcome
    /// is persisted even when the hint collaborator fails.
    pub fn submit_guess(
        &mut self,
        state: &SessionState,
        text: &str,
    ) -> Result<(SessionState, GuessReport)> {
        let submission = GuessSubmission::new(state.last_submission_seq + 1, text);
        let (mut next, report) = apply_guess(state, &submission);

        if report.accepted && report.needs_hint {
            let remaining = next.remaining_features();
            self.events.emit(
                "hint_requested",
                payload(json!({
                    "guess": text,
                    "is_help_request": report.is_help_request,
                    "remaining": remaining.len(),
                })),
            )?;
            match self.hints.hint(&remaining, text, &next.chat_history) {
                Ok(hint) => next.push_assistant(hint),
                Err(HintError::SafetyBlocked(reason)) => {
                    next.push_assistant(SAFETY_BLOCKED_MESSAGE);
                    self.events.emit(
                        "hint_failed",
                        payload(json!({ "kind": "safety_blocked", "reason": reason })),
                    )?;
                }
                Err(HintError::Failed(reason)) => {
                    next.push_assistant(GENERIC_HINT_FAILURE_MESSAGE);
                    self.events.emit(
                        "hint_failed",
                        payload(json!({ "kind": "failed", "reason": reason })),
                    )?;
                }
            }
        }

        self.snapshots.sync(&next)?;
        if report.accepted {
            self.events.emit(
                "guess_scored",
                payload(json!({
                    "guess": text,
                    "newly_found": report.newly_found,
                    "consumed_attempt": report.consumed_attempt,
                    "attempts_remaining": next.attempts_remaining,
                    "found": next.found_features.len(),
                    "total": next.total_features(),
                })),
            )?;
        }
        if next.finished && !state.finished {
            self.events.emit(
                "session_finished",
                payload(json!({
                    "all_found": next.all_found,
                    "threshold_met": next.threshold_met,
                    "attempts_remaining": next.attempts_remaining,
                })),
            )?;
        }
        Ok((next, report))
    }

    /// Restores the persisted snapshot, but only for the image currently on
    /// disk and only while the game is still live.
    pub fn resume(&self) -> Option<SessionState> {
        let image = self.current_image()?;
        let snapshot = self.snapshots.load()?;
        resume_session(snapshot, &image.id)
    }

    pub fn reset(&mut self) -> Result<SessionState> {
        self.snapshots.clear()?;
        self.events.emit("session_reset", EventPayload::new())?;
        Ok(reset_session())
    }

    pub fn current_image(&self) -> Option<ImageRecord> {
        let raw = std::fs::read_to_string(self.session_dir.join(IMAGE_FILE)).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn generate_with_fallback(&self, request: &ImageGenerateRequest) -> Result<GeneratedImage> {
        let provider = self
            .images
            .get(&self.image_provider)
            .with_context(|| format!("unknown image provider '{}'", self.image_provider))?;
        match provider.generate(request) {
            Ok(generated) => {
                self.events.emit(
                    "image_generated",
                    payload(json!({
                        "provider": provider.name(),
                        "url": generated.url,
                    })),
                )?;
                Ok(generated)
            }
            Err(err) if self.image_provider != "dryrun" => {
                self.events.emit(
                    "image_fallback",
                    payload(json!({
                        "provider": provider.name(),
                        "reason": format!("{err:#}"),
                    })),
                )?;
                let fallback = self
                    .images
                    .get("dryrun")
                    .context("dryrun image provider missing")?;
                let generated = fallback.generate(request).map_err(|fallback_err| {
                    anyhow::Error::from(GameError::Generation(format!(
                        "primary failed ({err:#}); fallback failed ({fallback_err:#})"
                    )))
                })?;
                self.events.emit(
                    "image_generated",
                    payload(json!({
                        "provider": "dryrun",
                        "url": generated.url,
                    })),
                )?;
                Ok(generated)
            }
            Err(err) => Err(GameError::Generation(format!("{err:#}")).into()),
        }
    }

    fn fallback_features(&self, prompt: &str, reason: &str) -> Result<Vec<String>> {
        self.events.emit(
            "features_fallback",
            payload(json!({
                "prompt": prompt,
                "reason": reason,
            })),
        )?;
        Ok(FALLBACK_FEATURES
            .iter()
            .map(|item| item.to_string())
            .collect())
    }
}

pub fn build_prompt(config: &SessionConfig) -> String {
    let style = if config.style.is_empty() {
        "colorful cartoon"
    } else {
        config.style.as_str()
    };
    let mut prompt = format!(
        "A {} {} illustration of {}",
        config.difficulty.as_str(),
        style,
        config.topic
    );
    if let Some(age) = config.age {
        prompt.push_str(&format!(", suitable for a {age}-year-old"));
    }
    prompt
}

fn openai_api_base() -> String {
    env::var("OPENAI_API_BASE")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
}

fn openai_api_key() -> Option<String> {
    non_empty_env("OPENAI_API_KEY")
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn post_json(
    http: &HttpClient,
    endpoint: &str,
    api_key: &str,
    payload: &Value,
) -> Result<(u16, Value)> {
    let response = http
        .post(endpoint)
        .header(AUTHORIZATION, format!("Bearer {api_key}"))
        .header(CONTENT_TYPE, "application/json")
        .json(payload)
        .send()
        .with_context(|| format!("request to {endpoint} failed"))?;
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    let value: Value = serde_json::from_str(&body).unwrap_or(Value::String(body));
    Ok((status, value))
}

fn chat_completion_content(body: &Value) -> Option<&str> {
    body.get("choices")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(|row| row.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
}

fn finish_reason(body: &Value) -> Option<&str> {
    body.get("choices")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(|row| row.get("finish_reason"))
        .and_then(Value::as_str)
}

fn error_message(body: &Value) -> String {
    body.get("error")
        .and_then(|err| err.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

fn is_safety_rejection(body: &Value) -> bool {
    let code = body
        .get("error")
        .and_then(|err| err.get("code"))
        .and_then(Value::as_str)
        .unwrap_or("");
    if code == "content_policy_violation" || code == "content_filter" {
        return true;
    }
    error_message(body).to_lowercase().contains("content policy")
}

fn value_as_string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_dims(size: &str) -> (u32, u32) {
    let mut parts = size.split('x');
    let width = parts
        .next()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(1024);
    let height = parts
        .next()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(width);
    (width.max(1), height.max(1))
}

fn write_dryrun_image(path: &Path, width: u32, height: u32, prompt: &str) -> Result<()> {
    let (r, g, b) = color_from_prompt(prompt);
    let mut canvas = RgbImage::new(width, height);
    for pixel in canvas.pixels_mut() {
        *pixel = Rgb([r, g, b]);
    }
    canvas
        .save(path)
        .with_context(|| format!("failed to save {}", path.display()))?;
    Ok(())
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let digest = Sha256::digest(prompt.as_bytes());
    (digest[0], digest[1], digest[2])
}

fn prompt_fingerprint(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    hex::encode(&digest[..6])
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn payload(value: Value) -> EventPayload {
    value.as_object().cloned().unwrap_or_default()
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
