use anyhow::{Result, anyhow};
use ndarray::ArrayView1;
use rand::Rng;

/**
 * Return a random index from 0 (inclusive) to the length of the weight
 * vector (exclusive). The likelihood of each index to be returned is
 * proportional to the weight at that index.
 *
 * The weights do not need to sum to 1; positive mass is normalised.
 * Negative, non-finite, and all-zero weight vectors are errors.
 */
pub fn choose_randomly<R: Rng + ?Sized>(weights: ArrayView1<f64>, rng: &mut R) -> Result<usize> {
    choose_with_variate(weights, rng.gen_range(0.0..=1.0))
}

/**
 * Deterministic core of `choose_randomly`: map a uniform variate in
 * [0, 1] onto the cumulative distribution of the normalised weights.
 */
pub fn choose_with_variate(weights: ArrayView1<f64>, variate: f64) -> Result<usize> {
    if weights.is_empty() {
        return Err(anyhow!("cannot draw from an empty distribution"));
    }

    let mut sum = 0f64;
    for (index, weight) in weights.iter().enumerate() {
        if !weight.is_finite() || *weight < 0f64 {
            return Err(anyhow!(
                "weight {} at index {} does not form a probability distribution",
                weight,
                index
            ));
        }
        sum += weight;
    }
    if sum <= 0f64 {
        return Err(anyhow!("distribution has no probability mass"));
    }

    //walk the cumulative distribution; remember the last index that carries
    //mass so that floating-point slack cannot select a zero-weight index
    let mut cumulative = 0f64;
    let mut last_positive = 0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight / sum;
        if *weight > 0f64 {
            last_positive = index;
        }
        if variate < cumulative {
            return Ok(index);
        }
    }
    Ok(last_positive)
}

/// Map raw RNG output onto the unit interval [0, 1).
pub fn unit_interval(bits: u64) -> f64 {
    (bits >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand_chacha::rand_core::{RngCore, SeedableRng};

    use crate::math::choose_randomly::{choose_randomly, choose_with_variate, unit_interval};

    #[test]
    fn degenerate_distribution_is_deterministic() {
        let weights = array![0.0, 0.0, 1.0, 0.0];
        for _ in 0..20 {
            assert_eq!(
                choose_randomly(weights.view(), &mut rand::thread_rng()).unwrap(),
                2
            );
        }
    }

    #[test]
    fn variate_edges() {
        let weights = array![1.0, 0.0, 0.0];
        //even a variate at the very top of the interval selects the mass
        assert_eq!(choose_with_variate(weights.view(), 1.0).unwrap(), 0);

        let weights = array![0.0, 1.0];
        assert_eq!(choose_with_variate(weights.view(), 0.0).unwrap(), 1);
    }

    #[test]
    fn unnormalised_mass_is_accepted() {
        //weights sum to 4; index 1 carries three quarters of the mass
        let weights = array![1.0, 3.0];
        assert_eq!(choose_with_variate(weights.view(), 0.1).unwrap(), 0);
        assert_eq!(choose_with_variate(weights.view(), 0.5).unwrap(), 1);
    }

    #[test]
    fn invalid_distributions_are_errors() {
        let empty = ndarray::Array1::<f64>::zeros(0);
        assert!(choose_with_variate(empty.view(), 0.5).is_err());

        let negative = array![0.5, -0.5, 1.0];
        assert!(choose_with_variate(negative.view(), 0.5).is_err());

        let nan = array![0.5, f64::NAN];
        assert!(choose_with_variate(nan.view(), 0.5).is_err());

        let no_mass = array![0.0, 0.0];
        assert!(choose_with_variate(no_mass.view(), 0.5).is_err());
    }

    #[test]
    fn unit_interval_bounds() {
        assert_eq!(unit_interval(0), 0.0);
        assert!(unit_interval(u64::MAX) < 1.0);

        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
        for _ in 0..100 {
            let v = unit_interval(rng.next_u64());
            assert!((0.0..1.0).contains(&v));
        }
    }
}
