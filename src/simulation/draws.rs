use rand::Rng;
use rand_distr::{Distribution, Exp, Poisson};

/// Patients requesting care on one day, Poisson distributed around `mean`.
/// A non-positive or non-finite mean yields no demand.
pub fn daily_demand<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> f64 {
    if !(mean.is_finite() && mean > 0.0) {
        return 0.0;
    }
    match Poisson::new(mean) {
        Ok(dist) => dist.sample(rng),
        Err(_) => 0.0,
    }
}

/// Minutes spent on one attention, exponentially distributed with the given
/// mean. A non-positive or non-finite mean yields zero.
pub fn service_time<R: Rng + ?Sized>(rng: &mut R, mean_minutes: f64) -> f64 {
    if !(mean_minutes.is_finite() && mean_minutes > 0.0) {
        return 0.0;
    }
    match Exp::new(1.0 / mean_minutes) {
        Ok(dist) => dist.sample(rng),
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn degenerate_means_draw_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(daily_demand(&mut rng, 0.0), 0.0);
        assert_eq!(daily_demand(&mut rng, -4.0), 0.0);
        assert_eq!(daily_demand(&mut rng, f64::NAN), 0.0);
        assert_eq!(service_time(&mut rng, 0.0), 0.0);
        assert_eq!(service_time(&mut rng, f64::INFINITY), 0.0);
    }

    #[test]
    fn poisson_draws_center_on_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let n = 20_000;
        let total: f64 = (0..n).map(|_| daily_demand(&mut rng, 24.0)).sum();
        let mean = total / n as f64;
        assert!((mean - 24.0).abs() < 0.5, "mean was {mean}");
    }

    #[test]
    fn service_times_center_on_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 20_000;
        let total: f64 = (0..n).map(|_| service_time(&mut rng, 15.0)).sum();
        let mean = total / n as f64;
        assert!((mean - 15.0).abs() < 0.6, "mean was {mean}");
    }

    #[test]
    fn draws_are_non_negative() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..1_000 {
            assert!(daily_demand(&mut rng, 2.0) >= 0.0);
            assert!(service_time(&mut rng, 2.0) >= 0.0);
        }
    }
}
