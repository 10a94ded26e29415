//! Multiple pass depth control for deep cuts.
//!
//! Depths are positive magnitudes below the work surface. Every path is
//! traversed once per pass, in order of increasing depth, and the last pass
//! always ends at the final depth.

use serde::{Deserialize, Serialize};

/// Depth cutting strategy for multiple passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthStrategy {
    /// Full steps of the configured depth, with a shorter last pass
    #[default]
    Stepped,
    /// Equal depth per pass, never deeper than the configured step
    Even,
}

impl DepthStrategy {
    /// Returns the name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            DepthStrategy::Stepped => "Stepped",
            DepthStrategy::Even => "Even",
        }
    }
}

/// Configuration for multi-pass depth control.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPassConfig {
    pub total_depth: f64,
    pub max_depth_per_pass: Option<f64>,
    pub strategy: DepthStrategy,
}

impl MultiPassConfig {
    /// Slack used when counting passes, so 0.9 / 0.3 is three passes.
    const PASS_EPSILON: f64 = 1e-9;

    /// Upper bound on the number of passes for one job.
    pub const MAX_PASSES: u32 = 10_000;

    pub fn new(total_depth: f64, max_depth_per_pass: Option<f64>) -> Self {
        Self {
            total_depth,
            max_depth_per_pass,
            strategy: DepthStrategy::Stepped,
        }
    }

    /// Sets the depth strategy.
    pub fn set_strategy(&mut self, strategy: DepthStrategy) {
        self.strategy = strategy;
    }

    /// Step size, if more than one pass is needed.
    fn step(&self) -> Option<f64> {
        let step = self.max_depth_per_pass?;
        (self.total_depth > 0.0 && step > 0.0 && step < self.total_depth).then_some(step)
    }

    /// Passes needed to reach the total depth, without the upper bound.
    pub fn required_passes(&self) -> f64 {
        match self.step() {
            Some(step) => (self.total_depth / step - Self::PASS_EPSILON).ceil().max(1.0),
            None => 1.0,
        }
    }

    /// Calculates the number of passes needed, at most [`Self::MAX_PASSES`].
    pub fn calculate_passes(&self) -> u32 {
        self.required_passes().min(Self::MAX_PASSES as f64) as u32
    }

    /// Calculates the depth for a specific pass, numbered from 1.
    pub fn calculate_pass_depth(&self, pass: u32) -> f64 {
        let passes = self.calculate_passes();
        if pass >= passes {
            return self.total_depth;
        }
        match (self.strategy, self.step()) {
            (DepthStrategy::Stepped, Some(step)) => (step * pass as f64).min(self.total_depth),
            (DepthStrategy::Even, Some(_)) => self.total_depth * pass as f64 / passes as f64,
            (_, None) => self.total_depth,
        }
    }

    /// Gets all pass depths as a vector.
    pub fn get_all_pass_depths(&self) -> Vec<f64> {
        let passes = self.calculate_passes();
        (1..=passes)
            .map(|pass| self.calculate_pass_depth(pass))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pass_cases() {
        assert_eq!(MultiPassConfig::new(5.0, None).get_all_pass_depths(), vec![5.0]);
        assert_eq!(MultiPassConfig::new(5.0, Some(5.0)).get_all_pass_depths(), vec![5.0]);
        assert_eq!(MultiPassConfig::new(5.0, Some(8.0)).get_all_pass_depths(), vec![5.0]);
        assert_eq!(MultiPassConfig::new(0.0, Some(1.0)).get_all_pass_depths(), vec![0.0]);
        assert_eq!(MultiPassConfig::new(-1.0, Some(0.5)).calculate_passes(), 1);
    }

    #[test]
    fn test_stepped_depths() {
        let config = MultiPassConfig::new(100.0, Some(25.0));
        assert_eq!(config.get_all_pass_depths(), vec![25.0, 50.0, 75.0, 100.0]);

        let config = MultiPassConfig::new(10.0, Some(3.0));
        assert_eq!(config.get_all_pass_depths(), vec![3.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_pass_count_tolerates_rounding() {
        let config = MultiPassConfig::new(0.9, Some(0.3));
        assert_eq!(config.calculate_passes(), 3);
        let depths = config.get_all_pass_depths();
        assert_eq!(depths.last(), Some(&0.9));
    }

    #[test]
    fn test_even_depths() {
        let mut config = MultiPassConfig::new(10.0, Some(3.0));
        config.set_strategy(DepthStrategy::Even);
        let depths = config.get_all_pass_depths();
        assert_eq!(depths.len(), 4);
        for (i, depth) in depths.iter().enumerate() {
            assert!((depth - 2.5 * (i + 1) as f64).abs() < 1e-12);
        }
        assert_eq!(config.strategy.name(), "Even");
    }

    #[test]
    fn test_pass_count_is_bounded() {
        let config = MultiPassConfig::new(100.0, Some(1e-9));
        assert!(config.required_passes() > MultiPassConfig::MAX_PASSES as f64);
        assert_eq!(config.calculate_passes(), MultiPassConfig::MAX_PASSES);

        let config = MultiPassConfig::new(100.0, Some(0.01));
        assert_eq!(config.calculate_passes(), MultiPassConfig::MAX_PASSES);
        assert_eq!(config.get_all_pass_depths().last(), Some(&100.0));
    }
}
