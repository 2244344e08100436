//! Configuration for the tile registrars.

use crate::phase_correlation::PhaseCorrelationConfig;

/// Minimum match value indicating an optimal shift.
pub const BEST_MATCH: f64 = 0.9;
/// Minimum match value for a shift to take part in the averaged position.
pub const GOOD_MATCH: f64 = 0.2;
/// Fraction of the overlap size tolerated around the expected shift length
/// before a shift is considered extreme.
pub const EXTREME_SHIFT: f64 = 0.6;

/// Which registration strategy `create_registrar` builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrarKind {
    /// Returns the declared positions unchanged.
    Identity,
    /// Cross-correlates overlapping neighbours.
    #[default]
    Shift,
}

/// Registration configuration.
#[derive(Debug, Clone)]
pub struct StitchConfig {
    pub registrar: RegistrarKind,
    /// A shift scoring at least this much is trusted outright and recorded in
    /// the shift history.
    pub best_match: f64,
    /// A shift scoring above this is usable, e.g. averaged with the estimate
    /// from the other axis.
    pub good_match: f64,
    /// Tolerance multiplier of the overlap size used by the plausible shift
    /// range check.
    pub extreme_shift: f64,
    /// Correlation kernel used to measure shifts.
    pub correlation: PhaseCorrelationConfig,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            registrar: RegistrarKind::default(),
            best_match: BEST_MATCH,
            good_match: GOOD_MATCH,
            extreme_shift: EXTREME_SHIFT,
            correlation: PhaseCorrelationConfig::default(),
        }
    }
}

impl StitchConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(
            (0.0..=1.0).contains(&self.good_match),
            "good_match must be within [0, 1], got {}",
            self.good_match
        );
        assert!(
            (0.0..=1.0).contains(&self.best_match),
            "best_match must be within [0, 1], got {}",
            self.best_match
        );
        assert!(
            self.good_match <= self.best_match,
            "good_match must be <= best_match"
        );
        assert!(
            self.extreme_shift >= 0.0,
            "extreme_shift must be non-negative, got {}",
            self.extreme_shift
        );

        self.correlation.validate();
    }
}
