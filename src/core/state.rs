use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::anticheat::AnticheatService;
use crate::services::grading::GradingService;
use crate::services::speech::SpeechService;
use crate::services::transcription::TranscriptionService;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    grading: GradingService,
    anticheat: AnticheatService,
    transcription: TranscriptionService,
    speech: SpeechService,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        grading: GradingService,
        anticheat: AnticheatService,
        transcription: TranscriptionService,
        speech: SpeechService,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState { settings, grading, anticheat, transcription, speech }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn grading(&self) -> &GradingService {
        &self.inner.grading
    }

    pub(crate) fn anticheat(&self) -> &AnticheatService {
        &self.inner.anticheat
    }

    pub(crate) fn transcription(&self) -> &TranscriptionService {
        &self.inner.transcription
    }

    pub(crate) fn speech(&self) -> &SpeechService {
        &self.inner.speech
    }
}
