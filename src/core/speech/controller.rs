//! Session TTS configuration controller.
//!
//! Owns the active [`TtsSettings`] and the [`SpeechSynthesizer`] built from
//! them. Both sit behind `ArcSwap`, so a turn reading the configuration while
//! an update lands observes either the fully-old or the fully-new pair,
//! never a torn (model, voice) combination.
//!
//! Updates arrive only from the control-message path, which runs on the
//! single session event loop — single-writer discipline is what makes the
//! compare-then-swap in [`TtsController::update`] race free.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use super::synthesizer::SpeechSynthesizer;
use super::TtsSettings;

/// Builds a synthesizer for a settings pair. Injected so tests can count
/// reconstructions.
pub type SynthesizerFactory = Box<dyn Fn(&TtsSettings) -> SpeechSynthesizer + Send + Sync>;

pub struct TtsController {
    settings: ArcSwap<TtsSettings>,
    engine: ArcSwap<SpeechSynthesizer>,
    factory: SynthesizerFactory,
}

impl TtsController {
    pub fn new(initial: TtsSettings, factory: SynthesizerFactory) -> Self {
        let engine = factory(&initial);
        Self {
            settings: ArcSwap::from_pointee(initial),
            engine: ArcSwap::from_pointee(engine),
            factory,
        }
    }

    /// The active settings pair.
    pub fn current(&self) -> Arc<TtsSettings> {
        self.settings.load_full()
    }

    /// The synthesizer built from the active settings.
    pub fn engine(&self) -> Arc<SpeechSynthesizer> {
        self.engine.load_full()
    }

    /// Apply a configuration change.
    ///
    /// Missing or empty arguments keep the current value. If the resulting
    /// pair equals the active one this is a no-op: no rebuild, no log entry.
    /// Returns whether anything changed.
    pub fn update(&self, model: Option<String>, voice: Option<String>) -> bool {
        let current = self.settings.load_full();
        let next = TtsSettings {
            model: model
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| current.model.clone()),
            voice: voice
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| current.voice.clone()),
        };

        if *current == next {
            return false;
        }

        self.settings.store(Arc::new(next.clone()));
        self.engine.store(Arc::new((self.factory)(&next)));
        info!(model = %next.model, voice = %next.voice, "updated tts config");
        true
    }
}
