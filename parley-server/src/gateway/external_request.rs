use crate::error::{ExternalKind, GatewayError};
use crate::gateway::collaborators::{AudioClip, Collaborators};
use bytes::Bytes;
use parley_core::{ConnectionId, RoomId, ServerEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageHints {
    /// `None`: язык определяет сам переводчик.
    pub source: Option<String>,
    pub target: String,
}

impl LanguageHints {
    pub fn source_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.source.as_deref().unwrap_or(fallback)
    }
}

#[derive(Debug, Clone)]
pub enum ExternalPayload {
    Transcribe(AudioClip),
    Translate(String),
    Ocr(Bytes),
}

/// Запрос к внешнему сервису, уже проверенный и декодированный.
#[derive(Debug, Clone)]
pub struct ExternalRequest {
    pub room_id: RoomId,
    /// Экземпляр комнаты, принявший запрос. Результат уходит только ему.
    pub generation: u64,
    pub origin: ConnectionId,
    pub payload: ExternalPayload,
    pub languages: LanguageHints,
}

impl ExternalRequest {
    pub fn kind(&self) -> ExternalKind {
        match self.payload {
            ExternalPayload::Transcribe(_) => ExternalKind::Transcribe,
            ExternalPayload::Translate(_) => ExternalKind::Translate,
            ExternalPayload::Ocr(_) => ExternalKind::Ocr,
        }
    }

    /// Вызвать внешние сервисы и собрать событие с результатом.
    /// Блокирует поток: запускать только через `spawn_blocking`.
    pub fn execute(
        &self,
        services: &Collaborators,
        default_source: &str,
    ) -> Result<ServerEvent, GatewayError> {
        let source_lang = self.languages.source_or(default_source).to_owned();
        let target_lang = self.languages.target.clone();

        match &self.payload {
            ExternalPayload::Transcribe(clip) => {
                let original = services.recognizer.transcribe(clip, &source_lang)?;
                let translated =
                    services
                        .translator
                        .translate(&original, Some(&source_lang), &target_lang)?;
                Ok(ServerEvent::TranslationResult {
                    original,
                    translated,
                    source_lang,
                    target_lang,
                })
            }
            ExternalPayload::Translate(text) => {
                let translated = services.translator.translate(
                    text,
                    self.languages.source.as_deref(),
                    &target_lang,
                )?;
                Ok(ServerEvent::TranslationResult {
                    original: text.clone(),
                    translated,
                    source_lang,
                    target_lang,
                })
            }
            ExternalPayload::Ocr(image) => {
                let extracted = services.extractor.extract(image)?;
                let translated = services.translator.translate(
                    &extracted.text,
                    self.languages.source.as_deref(),
                    &target_lang,
                )?;
                Ok(ServerEvent::OcrResult {
                    original: extracted.text,
                    translated,
                    x: extracted.position.map(|(x, _)| x),
                    y: extracted.position.map(|(_, y)| y),
                    source_lang,
                    target_lang,
                })
            }
        }
    }
}
