use crate::error::{ExtractionError, RecognitionError, TranslationError};
use bytes::Bytes;
use std::sync::Arc;

/// Сырые сэмплы аудио вместе с их форматом.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub samples: Bytes,
    pub sample_rate: u32,
    pub sample_width: u16,
}

/// Текст, найденный на изображении, и (если известна) его позиция.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub position: Option<(u32, u32)>,
}

/// Распознавание речи. Вызов блокирующий.
pub trait SpeechRecognizer: Send + Sync {
    fn transcribe(&self, audio: &AudioClip, language: &str) -> Result<String, RecognitionError>;
}

/// Перевод текста. Вызов блокирующий.
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
    ) -> Result<String, TranslationError>;
}

/// Извлечение текста из изображения. Вызов блокирующий.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, image: &[u8]) -> Result<ExtractedText, ExtractionError>;
}

/// Набор внешних сервисов, с которыми работает шлюз.
#[derive(Clone)]
pub struct Collaborators {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub translator: Arc<dyn Translator>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl Collaborators {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        translator: Arc<dyn Translator>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            recognizer,
            translator,
            extractor,
        }
    }

    /// Каждый вызов завершается ошибкой `Unavailable`.
    pub fn unconfigured() -> Self {
        let backend = Arc::new(UnconfiguredBackend);
        Self::new(backend.clone(), backend.clone(), backend)
    }
}

/// Заглушка для запуска без подключённых сервисов.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredBackend;

impl SpeechRecognizer for UnconfiguredBackend {
    fn transcribe(&self, _audio: &AudioClip, _language: &str) -> Result<String, RecognitionError> {
        Err(RecognitionError::Unavailable(
            "no speech recognition backend configured".to_owned(),
        ))
    }
}

impl Translator for UnconfiguredBackend {
    fn translate(
        &self,
        _text: &str,
        _source_lang: Option<&str>,
        _target_lang: &str,
    ) -> Result<String, TranslationError> {
        Err(TranslationError::Unavailable(
            "no translation backend configured".to_owned(),
        ))
    }
}

impl TextExtractor for UnconfiguredBackend {
    fn extract(&self, _image: &[u8]) -> Result<ExtractedText, ExtractionError> {
        Err(ExtractionError::Unavailable(
            "no ocr backend configured".to_owned(),
        ))
    }
}
