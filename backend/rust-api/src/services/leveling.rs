//! Level/XP calculator: a non-decreasing step function over cumulative XP.

use serde::Serialize;

/// Ordered ascending `(threshold_xp, level)` table. The level for a given
/// XP total is the level of the highest threshold not exceeding it.
pub const LEVEL_THRESHOLDS: &[(u32, u32)] = &[
    (0, 1),
    (1000, 2),
    (2500, 3),
    (4500, 4),
    (7000, 5),
    (10_000, 6),
    (13_500, 7),
    (17_500, 8),
    (22_000, 9),
    (27_000, 10),
];

pub fn level_for(xp: u32) -> u32 {
    LEVEL_THRESHOLDS
        .iter()
        .rev()
        .find(|(threshold, _)| xp >= *threshold)
        .map(|(_, level)| *level)
        .unwrap_or(1)
}

#[derive(Debug, Clone, Serialize)]
pub struct XpProgress {
    pub level: u32,
    /// XP accumulated since the current level's threshold.
    pub current_level_xp: u32,
    /// Total XP at which the next level starts; `None` at the table's top.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level_xp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    /// 0–100 fill for the progress bar; 100 once maxed out.
    pub progress_percentage: u32,
}

/// Pure derived computation for progress-bar display.
pub fn xp_to_next_level(xp: u32) -> XpProgress {
    let level = level_for(xp);
    let current_threshold = LEVEL_THRESHOLDS
        .iter()
        .rev()
        .find(|(threshold, _)| xp >= *threshold)
        .map(|(threshold, _)| *threshold)
        .unwrap_or(0);
    let next_threshold = LEVEL_THRESHOLDS
        .iter()
        .find(|(_, l)| *l == level + 1)
        .map(|(threshold, _)| *threshold);

    let current_level_xp = xp - current_threshold;
    let (remaining, progress_percentage) = match next_threshold {
        Some(next) => {
            let span = next - current_threshold;
            let pct = ((current_level_xp as f64 / span as f64) * 100.0).round() as u32;
            (Some(next - xp), pct.min(100))
        }
        None => (None, 100),
    };

    XpProgress {
        level,
        current_level_xp,
        next_level_xp: next_threshold,
        remaining,
        progress_percentage,
    }
}
