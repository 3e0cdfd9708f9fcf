//! Free functions over `&[f64]` vectors.

use rand::Rng;

/// One draw from the uniform distribution over `[-range, range]`.
pub fn sample_uniform<R: Rng + ?Sized>(range: f64, rng: &mut R) -> f64 {
    if range == 0.0 {
        return 0.0;
    }
    rng.gen_range(-range..=range)
}

pub fn uniform<R: Rng + ?Sized>(len: usize, range: f64, rng: &mut R) -> Vec<f64> {
    (0..len).map(|_| sample_uniform(range, rng)).collect()
}

/// Element-wise (Hadamard) product of two same-length vectors.
pub fn hadamard(a: &[f64], b: &[f64]) -> Vec<f64> {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).collect()
}

pub fn add_assign(acc: &mut [f64], v: &[f64]) {
    assert_eq!(acc.len(), v.len());
    acc.iter_mut().zip(v).for_each(|(a, x)| *a += x);
}

pub fn scale(v: &[f64], s: f64) -> Vec<f64> {
    v.iter().map(|x| x * s).collect()
}

pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Index of the maximum element; ties go to the lowest index. NaN entries are skipped
/// (an all-NaN vector yields 0).
pub fn argmax(v: &[f64]) -> Option<usize> {
    if v.is_empty() {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in v.iter().enumerate() {
        if x.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if x <= b => {}
            _ => best = Some((i, x)),
        }
    }
    Some(best.map_or(0, |(i, _)| i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.1, 0.9, 0.9, 0.2]), Some(1));
        assert_eq!(argmax(&[3.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn argmax_skips_nan() {
        assert_eq!(argmax(&[f64::NAN, 0.2, 0.5]), Some(2));
        assert_eq!(argmax(&[0.4, f64::NAN, 0.1]), Some(0));
    }

    #[test]
    fn hadamard_and_l2() {
        assert_eq!(hadamard(&[1.0, 2.0], &[3.0, 4.0]), vec![3.0, 8.0]);
        assert!((l2_norm(&[3.0, 4.0]) - 5.0).abs() < 1e-12);
    }
}
