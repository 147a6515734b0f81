//! # Script Domain Model
//!
//! Types describing guided audio sessions: emotional tones and their voice
//! tuning, individual spoken segments, and the intervention scripts that
//! sequence them. Scripts are immutable once constructed; the playback engine
//! and prefetcher only ever read them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Emotional Tone
// ============================================================================

/// Emotional tone a segment is delivered with.
///
/// The set is closed on purpose: voice tuning is resolved through an
/// exhaustive `match`, so adding a tone forces the mapping (and the cache key
/// vocabulary) to be updated in the same change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    /// Even, unstyled delivery.
    Neutral,
    /// Slow, settled delivery for relaxation content.
    Calm,
    /// Upbeat delivery for affirmations.
    Encouraging,
    /// Warm, soft delivery for self-compassion prompts.
    Compassionate,
    /// Bright, activating delivery for morning routines.
    Energizing,
    /// Steady, low delivery for grounding exercises.
    Grounding,
}

impl Emotion {
    /// All known tones, in a stable order.
    pub const ALL: [Emotion; 6] = [
        Emotion::Neutral,
        Emotion::Calm,
        Emotion::Encouraging,
        Emotion::Compassionate,
        Emotion::Energizing,
        Emotion::Grounding,
    ];

    /// Stable lowercase identifier used in cache keys and synthesis requests.
    pub fn slug(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Calm => "calm",
            Emotion::Encouraging => "encouraging",
            Emotion::Compassionate => "compassionate",
            Emotion::Energizing => "energizing",
            Emotion::Grounding => "grounding",
        }
    }
}

// ============================================================================
// Voice Tuning
// ============================================================================

/// Provider voice-settings record resolved from an emotional tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceTuning {
    /// Voice stability, `0.0..=1.0`. Lower is more expressive.
    pub stability: f32,
    /// Similarity boost, `0.0..=1.0`.
    pub similarity: f32,
    /// Style exaggeration, `0.0..=1.0`.
    pub style: f32,
    /// Provider speaker boost flag.
    pub speaker_boost: bool,
}

impl VoiceTuning {
    /// Tuning for an emotional tone.
    ///
    /// The match is exhaustive: a new [`Emotion`] variant will not compile
    /// until its tuning is defined here.
    pub fn for_emotion(emotion: Emotion) -> Self {
        match emotion {
            Emotion::Neutral => Self {
                stability: 0.75,
                similarity: 0.75,
                style: 0.0,
                speaker_boost: true,
            },
            Emotion::Calm => Self {
                stability: 0.85,
                similarity: 0.80,
                style: 0.10,
                speaker_boost: true,
            },
            Emotion::Encouraging => Self {
                stability: 0.55,
                similarity: 0.75,
                style: 0.35,
                speaker_boost: true,
            },
            Emotion::Compassionate => Self {
                stability: 0.70,
                similarity: 0.85,
                style: 0.25,
                speaker_boost: true,
            },
            Emotion::Energizing => Self {
                stability: 0.40,
                similarity: 0.70,
                style: 0.50,
                speaker_boost: true,
            },
            Emotion::Grounding => Self {
                stability: 0.90,
                similarity: 0.80,
                style: 0.05,
                speaker_boost: true,
            },
        }
    }
}

// ============================================================================
// Segments
// ============================================================================

/// Tactile cue the host may render alongside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticCue {
    /// Long soft swell matching a breath.
    Breathe,
    /// Single light tap.
    PulseLight,
    /// Single strong tap.
    PulseStrong,
}

/// One unit of spoken text plus delivery parameters and a trailing pause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    /// Text to speak.
    pub text: String,
    /// Emotional tone for delivery.
    pub emotion: Emotion,
    /// Speaking rate multiplier (1.0 = natural pace).
    pub speaking_rate: f32,
    /// Overrides the tone's default stability when set.
    pub stability_override: Option<f32>,
    /// Silence to hold after the segment finishes playing.
    pub pause_after: Duration,
    /// Optional tactile cue for the host to render with this segment.
    pub haptic_cue: Option<HapticCue>,
}

impl ScriptSegment {
    /// Create a segment with natural pace and no trailing pause.
    pub fn new(text: impl Into<String>, emotion: Emotion) -> Self {
        Self {
            text: text.into(),
            emotion,
            speaking_rate: 1.0,
            stability_override: None,
            pause_after: Duration::ZERO,
            haptic_cue: None,
        }
    }

    /// Set the speaking rate multiplier.
    pub fn with_speaking_rate(mut self, rate: f32) -> Self {
        self.speaking_rate = rate;
        self
    }

    /// Override the tone's default voice stability.
    pub fn with_stability(mut self, stability: f32) -> Self {
        self.stability_override = Some(stability);
        self
    }

    /// Set the trailing pause.
    pub fn with_pause_after(mut self, pause: Duration) -> Self {
        self.pause_after = pause;
        self
    }

    /// Attach a tactile cue.
    pub fn with_haptic_cue(mut self, cue: HapticCue) -> Self {
        self.haptic_cue = Some(cue);
        self
    }

    /// Voice tuning for this segment: the tone's defaults with the segment's
    /// stability override applied.
    pub fn tuning(&self) -> VoiceTuning {
        let mut tuning = VoiceTuning::for_emotion(self.emotion);
        if let Some(stability) = self.stability_override {
            tuning.stability = stability;
        }
        tuning
    }
}

// ============================================================================
// Scripts
// ============================================================================

/// An ordered sequence of segments representing one guided audio session.
///
/// Immutable once constructed; one playback session consumes one script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionScript {
    title: String,
    description: Option<String>,
    estimated_duration: Option<Duration>,
    segments: Vec<ScriptSegment>,
}

impl InterventionScript {
    /// Create a script from its ordered segments.
    pub fn new(title: impl Into<String>, segments: Vec<ScriptSegment>) -> Self {
        Self {
            title: title.into(),
            description: None,
            estimated_duration: None,
            segments,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an explicit duration estimate.
    pub fn with_estimated_duration(mut self, duration: Duration) -> Self {
        self.estimated_duration = Some(duration);
        self
    }

    /// Script title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Script description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The ordered segments.
    pub fn segments(&self) -> &[ScriptSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the script has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Duration estimate: the explicit value when set, otherwise the sum of
    /// trailing pauses (spoken audio length is unknown before synthesis).
    pub fn estimated_duration(&self) -> Duration {
        self.estimated_duration
            .unwrap_or_else(|| self.segments.iter().map(|s| s.pause_after).sum())
    }

    /// A paced breathing exercise: `cycles` rounds of inhale / hold / exhale
    /// prompts with matching pauses and breath haptics.
    pub fn breathing(cycles: usize, inhale: Duration, hold: Duration, exhale: Duration) -> Self {
        let mut segments = Vec::with_capacity(cycles * 3 + 1);
        segments.push(
            ScriptSegment::new("Find a comfortable position and relax.", Emotion::Calm)
                .with_pause_after(Duration::from_secs(2)),
        );
        for _ in 0..cycles {
            segments.push(
                ScriptSegment::new("Breathe in slowly.", Emotion::Grounding)
                    .with_pause_after(inhale)
                    .with_haptic_cue(HapticCue::Breathe),
            );
            segments.push(
                ScriptSegment::new("Hold.", Emotion::Grounding)
                    .with_pause_after(hold)
                    .with_haptic_cue(HapticCue::PulseLight),
            );
            segments.push(
                ScriptSegment::new("And breathe out.", Emotion::Grounding)
                    .with_pause_after(exhale)
                    .with_haptic_cue(HapticCue::Breathe),
            );
        }
        Self::new("Paced breathing", segments)
            .with_description("Guided breathing with paced inhale, hold and exhale")
    }
}

// ============================================================================
// Utterances
// ============================================================================

/// The request descriptor a cache key is derived from: what is said, how it
/// is said, and which voice says it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// Text to speak.
    pub text: String,
    /// Emotional tone for delivery.
    pub emotion: Emotion,
    /// Provider voice identity, or `None` for the default-voice sentinel.
    pub voice_id: Option<String>,
}

impl Utterance {
    /// Create an utterance descriptor.
    pub fn new(text: impl Into<String>, emotion: Emotion, voice_id: Option<String>) -> Self {
        Self {
            text: text.into(),
            emotion,
            voice_id,
        }
    }

    /// The descriptor for a script segment rendered by `voice_id`.
    pub fn for_segment(segment: &ScriptSegment, voice_id: Option<String>) -> Self {
        Self {
            text: segment.text.clone(),
            emotion: segment.emotion,
            voice_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_slugs_are_stable_and_distinct() {
        let mut slugs: Vec<&str> = Emotion::ALL.iter().map(|e| e.slug()).collect();
        assert_eq!(slugs.len(), 6);
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), 6, "slugs must be unique");
        assert_eq!(Emotion::Calm.slug(), "calm");
    }

    #[test]
    fn tuning_covers_every_emotion() {
        for emotion in Emotion::ALL {
            let tuning = VoiceTuning::for_emotion(emotion);
            assert!((0.0..=1.0).contains(&tuning.stability));
            assert!((0.0..=1.0).contains(&tuning.similarity));
            assert!((0.0..=1.0).contains(&tuning.style));
        }
    }

    #[test]
    fn segment_stability_override_applies() {
        let segment = ScriptSegment::new("Hold steady", Emotion::Calm).with_stability(0.33);
        let tuning = segment.tuning();
        assert_eq!(tuning.stability, 0.33);
        // Other fields keep the tone defaults.
        assert_eq!(tuning.similarity, VoiceTuning::for_emotion(Emotion::Calm).similarity);
    }

    #[test]
    fn script_builder_and_estimates() {
        let script = InterventionScript::new(
            "Evening wind-down",
            vec![
                ScriptSegment::new("Settle in.", Emotion::Calm)
                    .with_pause_after(Duration::from_secs(3)),
                ScriptSegment::new("Let the day go.", Emotion::Compassionate)
                    .with_pause_after(Duration::from_secs(5)),
            ],
        )
        .with_description("Two-part wind-down");

        assert_eq!(script.len(), 2);
        assert!(!script.is_empty());
        assert_eq!(script.estimated_duration(), Duration::from_secs(8));

        let explicit = script
            .clone()
            .with_estimated_duration(Duration::from_secs(60));
        assert_eq!(explicit.estimated_duration(), Duration::from_secs(60));
    }

    #[test]
    fn breathing_script_shape() {
        let script = InterventionScript::breathing(
            4,
            Duration::from_secs(4),
            Duration::from_secs(7),
            Duration::from_secs(8),
        );

        // Intro plus three prompts per cycle.
        assert_eq!(script.len(), 1 + 4 * 3);
        assert_eq!(
            script.segments()[1].haptic_cue,
            Some(HapticCue::Breathe)
        );
        assert_eq!(script.segments()[1].pause_after, Duration::from_secs(4));
    }
}
