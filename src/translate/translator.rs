use crate::error::{Result, VoxlateError};
use crate::translate::languages::LanguageCode;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Translated text plus what the backend detected as the source language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// `None` when the backend does not report detection.
    pub source_language: Option<String>,
}

/// Trait for machine translation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target`.
    async fn translate(&self, text: &str, target: LanguageCode) -> Result<Translation>;

    /// Name of the backend, for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Translator + ?Sized> Translator for Arc<T> {
    async fn translate(&self, text: &str, target: LanguageCode) -> Result<Translation> {
        (**self).translate(text, target).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Offline translator that tags the input with the target code.
///
/// `"hello"` to Hindi becomes `"[hi] hello"`.
#[derive(Debug, Default)]
pub struct StubTranslator {
    should_fail: bool,
    empty_result: bool,
    detected: Option<String>,
    calls: AtomicUsize,
}

impl StubTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the stub to fail on translate
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the stub to succeed with empty text
    pub fn with_empty_result(mut self) -> Self {
        self.empty_result = true;
        self
    }

    /// Report `code` as the detected source language
    pub fn with_detected_source(mut self, code: &str) -> Self {
        self.detected = Some(code.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(&self, text: &str, target: LanguageCode) -> Result<Translation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(VoxlateError::translation("stub translator unavailable"));
        }
        let text = if self.empty_result {
            String::new()
        } else {
            format!("[{target}] {text}")
        };
        Ok(Translation {
            text,
            source_language: self.detected.clone(),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}
