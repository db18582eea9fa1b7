//! Arrangement Scorer
//!
//! Reduces arrangement metrics to a 0-100 score. Start at 100, subtract the
//! length overrun, crossings, utilization outside the target band and
//! unrouted connections, clamp.

use serde::{Deserialize, Serialize};

use crate::model::ArrangementMetrics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Expected channel length per connection (mm)
    pub reference_length: f64,
    /// Points lost per mm above the reference
    pub length_weight: f64,
    pub crossing_penalty: f64,
    pub utilization_min: f64,
    pub utilization_max: f64,
    /// Points lost per unit of utilization outside the band
    pub utilization_weight: f64,
    pub unrouted_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reference_length: 40.0,
            length_weight: 0.25,
            crossing_penalty: 10.0,
            utilization_min: 0.40,
            utilization_max: 0.70,
            utilization_weight: 30.0,
            unrouted_penalty: 15.0,
        }
    }
}

pub fn score_arrangement(
    metrics: &ArrangementMetrics,
    connection_count: usize,
    config: &ScoringConfig,
) -> f64 {
    let mut score = 100.0;

    let reference = config.reference_length * connection_count as f64;
    if metrics.total_route_length > reference {
        score -= config.length_weight * (metrics.total_route_length - reference);
    }

    score -= config.crossing_penalty * metrics.route_crossings as f64;

    let u = metrics.board_utilization;
    let outside = if u < config.utilization_min {
        config.utilization_min - u
    } else if u > config.utilization_max {
        u - config.utilization_max
    } else {
        0.0
    };
    score -= config.utilization_weight * outside;

    score -= config.unrouted_penalty * metrics.unrouted_connections as f64;

    score.clamp(0.0, 100.0)
}
