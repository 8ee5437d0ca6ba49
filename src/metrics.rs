/// Compute metrics (mean, median, 25th percentile, 75th percentile) from samples
pub fn compute_metrics(samples: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if samples.len() < 2 {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let mean = samples.iter().sum::<f64>() / n as f64;
    let median = sorted[n / 2];
    let p25 = sorted[n / 4];
    let p75 = sorted[3 * n / 4];
    Some((mean, median, p25, p75))
}

/// Metrics over the gaps between consecutive primes.
pub fn compute_gap_metrics(primes: &[u64]) -> Option<(f64, f64, f64, f64)> {
    let gaps: Vec<f64> = primes.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    compute_metrics(&gaps)
}

/// Primes found per second of wall time.
pub fn primes_per_second(found: u32, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    found as f64 / (elapsed_ms as f64 / 1000.0)
}
