//! Pattern selection and switch timing
//!
//! Keeps a short history of chosen patterns and guarantees no pattern runs
//! more than `max_consecutive` times in a row when there is any alternative.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::pattern::MotionPattern;
use super::rng::MotionRng;
use crate::consts::*;

/// How many times `current` repeats at the tail of `history`
pub fn tail_repeats(history: &VecDeque<MotionPattern>, current: MotionPattern) -> usize {
    history.iter().rev().take_while(|&&p| p == current).count()
}

/// Pick the next pattern.
///
/// Once the most recent pattern has run `max_consecutive` times in a row and
/// another pattern exists, the pick is uniform over the others. Otherwise it
/// is uniform over everything available (repeats allowed). `None` when
/// nothing is available.
pub fn select_next<R: MotionRng + ?Sized>(
    history: &VecDeque<MotionPattern>,
    available: &[MotionPattern],
    max_consecutive: usize,
    rng: &mut R,
) -> Option<MotionPattern> {
    if available.is_empty() {
        return None;
    }

    if let Some(&current) = history.back() {
        let distinct_alternatives: Vec<MotionPattern> =
            available.iter().copied().filter(|&p| p != current).collect();
        if tail_repeats(history, current) >= max_consecutive && !distinct_alternatives.is_empty() {
            return Some(distinct_alternatives[rng.index(distinct_alternatives.len())]);
        }
    }

    Some(available[rng.index(available.len())])
}

/// Owns the pattern history and the on-screen switch timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternScheduler {
    history: VecDeque<MotionPattern>,
    /// On-screen time since the last switch
    pub elapsed_ms: f32,
    pub interval_ms: f32,
    pub max_consecutive: usize,
}

impl Default for PatternScheduler {
    fn default() -> Self {
        Self {
            history: VecDeque::with_capacity(PATTERN_HISTORY_LEN),
            elapsed_ms: 0.0,
            interval_ms: PATTERN_SWITCH_INTERVAL_MS,
            max_consecutive: MAX_CONSECUTIVE_PATTERNS,
        }
    }
}

impl PatternScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent first is `history().back()`
    pub fn history(&self) -> &VecDeque<MotionPattern> {
        &self.history
    }

    /// Advance the switch timer; true once the interval has elapsed
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        self.elapsed_ms += dt_ms;
        self.elapsed_ms >= self.interval_ms
    }

    /// Choose the next pattern and record it. Resets the switch timer.
    pub fn choose<R: MotionRng + ?Sized>(
        &mut self,
        available: &[MotionPattern],
        rng: &mut R,
    ) -> Option<MotionPattern> {
        let next = select_next(&self.history, available, self.max_consecutive, rng)?;
        self.record(next);
        Some(next)
    }

    /// Push a pattern into the ring buffer and restart the timer
    pub fn record(&mut self, pattern: MotionPattern) {
        if self.history.len() == PATTERN_HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(pattern);
        self.elapsed_ms = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::seeded;

    #[test]
    fn test_third_repeat_is_forced_out() {
        let mut rng = seeded(11);
        let available = [MotionPattern::Circular, MotionPattern::Wave];
        for _ in 0..100 {
            let history: VecDeque<_> = [MotionPattern::Wave, MotionPattern::Wave].into();
            let next = select_next(&history, &available, 2, &mut rng);
            assert_eq!(next, Some(MotionPattern::Circular));
        }
    }

    #[test]
    fn test_single_pattern_may_repeat() {
        let mut rng = seeded(11);
        let history: VecDeque<_> = [MotionPattern::Wave; 5].into();
        let next = select_next(&history, &[MotionPattern::Wave], 2, &mut rng);
        assert_eq!(next, Some(MotionPattern::Wave));
    }

    #[test]
    fn test_duplicate_available_entries_do_not_defeat_limit() {
        let mut rng = seeded(2);
        let available = [MotionPattern::Wave, MotionPattern::Wave, MotionPattern::Square];
        let history: VecDeque<_> = [MotionPattern::Wave, MotionPattern::Wave].into();
        for _ in 0..50 {
            assert_eq!(
                select_next(&history, &available, 2, &mut rng),
                Some(MotionPattern::Square)
            );
        }
    }

    #[test]
    fn test_empty_available() {
        let mut rng = seeded(2);
        assert_eq!(select_next(&VecDeque::new(), &[], 2, &mut rng), None);
    }

    #[test]
    fn test_history_is_bounded_and_limit_holds() {
        let mut rng = seeded(77);
        let mut scheduler = PatternScheduler::new();
        let available = [MotionPattern::Horizontal, MotionPattern::Bounce];
        for _ in 0..500 {
            scheduler.choose(&available, &mut rng);
            assert!(scheduler.history().len() <= PATTERN_HISTORY_LEN);
            let last = *scheduler.history().back().unwrap();
            assert!(tail_repeats(scheduler.history(), last) <= 2);
        }
    }

    #[test]
    fn test_timer() {
        let mut scheduler = PatternScheduler::new();
        assert!(!scheduler.tick(8999.0));
        assert!(scheduler.tick(1.0));
        scheduler.record(MotionPattern::Square);
        assert_eq!(scheduler.elapsed_ms, 0.0);
    }
}
