use crate::types::{JointLimit, RobotConfig};

/// Radical inverse of `index` in `base`, in `[0, 1)`.
fn halton(mut index: usize, base: usize) -> f64 {
    let mut result = 0.0;
    let mut fraction = 1.0 / base as f64;
    while index > 0 {
        result += (index % base) as f64 * fraction;
        index /= base;
        fraction /= base as f64;
    }
    result
}

fn first_primes(count: usize) -> Vec<usize> {
    let mut primes = Vec::with_capacity(count);
    let mut candidate = 2;
    while primes.len() < count {
        if primes.iter().all(|p| candidate % p != 0) {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// `count` configurations spread over the joint limits with a Halton sequence.
///
/// Deterministic, so the viewer shows the same sample for the same index on
/// every run.
pub fn halton_samples(limits: &[JointLimit], count: usize) -> Vec<Vec<f64>> {
    let bases = first_primes(limits.len());

    (1..=count)
        .map(|i| {
            limits
                .iter()
                .zip(&bases)
                .map(|(limit, &base)| {
                    limit.min_angle + halton(i, base) * (limit.max_angle - limit.min_angle)
                })
                .collect()
        })
        .collect()
}

/// Sample states for the collision viewer: the configured list when present,
/// otherwise generated ones.
pub fn sample_states(config: &RobotConfig) -> Vec<Vec<f64>> {
    if !config.viewer.sample_states.is_empty() {
        return config.viewer.sample_states.clone();
    }
    halton_samples(&config.joint_limits, config.viewer.sample_count)
}
