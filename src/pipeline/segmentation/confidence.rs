use crate::pipeline::corpus::SectionStats;

/// Pattern frequency at which the frequency factor saturates.
pub const FREQUENCY_SATURATION: f32 = 50.0;

/// Share of a direct match's confidence that does not depend on frequency.
pub const FREQUENCY_BASE_WEIGHT: f32 = 0.7;

/// Rescale `raw` into the section-local `[min, max]` range and blend it
/// with the section average (70/30).
///
/// In corpora produced by the builder `raw` is the section average itself,
/// so the scaled term carries no per-pattern signal; kept as-is for
/// compatibility with existing corpora.
pub fn normalize(raw: f32, min: f32, max: f32, avg: f32) -> f32 {
    if max == min {
        return avg;
    }
    let scaled = min + raw * (max - min);
    scaled * 0.7 + avg * 0.3
}

/// `min(1, frequency / 50)`.
pub fn frequency_factor(frequency: u32) -> f32 {
    (frequency as f32 / FREQUENCY_SATURATION).min(1.0)
}

/// Confidence of a direct header match.
///
/// Without statistics for the section the raw pattern confidence is used
/// unnormalized.
pub fn direct_match_confidence(raw: f32, frequency: u32, stats: Option<&SectionStats>) -> f32 {
    let normalized = match stats {
        Some(s) => normalize(raw, s.min, s.max, s.avg),
        None => raw,
    };
    let adjusted =
        normalized * (FREQUENCY_BASE_WEIGHT + (1.0 - FREQUENCY_BASE_WEIGHT) * frequency_factor(frequency));
    clamp_unit(adjusted)
}

/// Confidence of a contextual match: no frequency scaling.
pub fn contextual_match_confidence(raw: f32, context_weight: f32) -> f32 {
    clamp_unit(raw * context_weight)
}

/// Clamp into `[0, 1]`; non-finite values become 0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
