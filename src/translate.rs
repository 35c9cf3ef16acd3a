use crate::config::TranslateConfig;
use crate::error::TranslateError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Machine translation backend
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError>;
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'static str,
}

/// Google Cloud Translation v2 over REST
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    chunk_chars: usize,
}

impl GoogleTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self, TranslateError> {
        let api_key = config.api_key.clone().ok_or(TranslateError::NotConfigured)?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key,
            chunk_chars: config.chunk_chars.max(1),
        })
    }

    async fn translate_chunk(&self, chunk: &str, target: &str) -> Result<String, TranslateError> {
        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&TranslateRequest {
                q: chunk,
                target,
                format: "text",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let root: Value = response.json().await?;
        root.pointer("/data/translations/0/translatedText")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(TranslateError::MissingField("data.translations[0].translatedText"))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        let mut translated = String::with_capacity(text.len());
        for chunk in chunk_chars(text, self.chunk_chars) {
            translated.push_str(&self.translate_chunk(chunk, target).await?);
        }
        Ok(translated)
    }
}

/// Split `text` into pieces of at most `size` characters, on char boundaries
pub fn chunk_chars(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (index, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Every string leaf of `value`, depth first. Object keys are not included.
pub fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}

/// Rebuild `value` with every string leaf passed through `f`
pub fn map_strings<F>(value: Value, f: &mut F) -> Value
where
    F: FnMut(String) -> String,
{
    match value {
        Value::String(s) => Value::String(f(s)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| map_strings(item, &mut *f))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key, map_strings(item, &mut *f)))
                .collect(),
        ),
        other => other,
    }
}

/// Translate every non-empty string leaf of `value` into `target`.
///
/// Identical strings are translated once. Structure, keys, and non-string
/// scalars are preserved.
pub async fn translate_value(
    translator: &dyn Translator,
    value: Value,
    target: &str,
) -> Result<Value, TranslateError> {
    let mut leaves = Vec::new();
    collect_strings(&value, &mut leaves);

    let mut translations: HashMap<String, String> = HashMap::new();
    for leaf in leaves {
        if leaf.trim().is_empty() || translations.contains_key(leaf) {
            continue;
        }
        let translated = translator.translate(leaf, target).await?;
        translations.insert(leaf.to_string(), translated);
    }

    ::log::debug!("Translated {} distinct strings to {}", translations.len(), target);
    Ok(map_strings(value, &mut |s| translations.get(&s).cloned().unwrap_or(s)))
}
