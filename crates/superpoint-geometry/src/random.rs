use rand::Rng;

/// Draws are rejected beyond this many standard deviations from the mean.
pub const TRUNCATION_STDDEV: f64 = 2.0;

/// Draw a sample from the standard normal distribution.
///
/// Uses the Box-Muller transform over two uniform draws.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // u1 in (0, 1] to avoid ln(0)
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Draw a sample from a truncated normal distribution.
///
/// Samples further than [`TRUNCATION_STDDEV`] standard deviations from the mean
/// are dropped and re-drawn, so the result lies in the open interval
/// `(mean - 2 * stddev, mean + 2 * stddev)`.
pub fn truncated_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, stddev: f64) -> f64 {
    loop {
        let z = standard_normal(rng);
        if z.abs() < TRUNCATION_STDDEV {
            return mean + stddev * z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_truncated_normal_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let x = truncated_normal(&mut rng, 1.0, 0.375);
            assert!(x > 1.0 - 0.75 && x < 1.0 + 0.75);
        }
    }

    #[test]
    fn test_truncated_normal_moments() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let samples = (0..n)
            .map(|_| truncated_normal(&mut rng, 0.0, 1.0))
            .collect::<Vec<_>>();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

        // a normal truncated at 2 sigma has a variance of about 0.774
        assert!(mean.abs() < 0.03);
        assert!((var - 0.774).abs() < 0.03);
    }
}
