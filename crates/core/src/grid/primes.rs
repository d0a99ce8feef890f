//! Low-prime-factor sizing for the inverse transform length.
//!
//! FFT cost grows with the largest prime factor of the transform length, so
//! the synthesized series length is rounded up to a nearby even integer whose
//! prime factors are all small.

/// Default largest prime allowed in the factorization of `n_t`.
pub const DEFAULT_PRIME_MAX: usize = 31;

/// Largest prime factor of `n` (returns `n` for `n < 2`).
pub fn largest_prime_factor(mut n: usize) -> usize {
    if n < 2 {
        return n;
    }
    let mut largest = 1;
    let mut p = 2;
    while p * p <= n {
        while n % p == 0 {
            largest = p;
            n /= p;
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        largest = largest.max(n);
    }
    largest
}

/// True if every prime factor of `n` is at most `prime_max`.
pub fn has_low_prime_factors(n: usize, prime_max: usize) -> bool {
    n >= 1 && largest_prime_factor(n) <= prime_max
}

/// Smallest even integer `>= n` whose prime factors are all `<= prime_max`.
///
/// `prime_max` must be at least 2, otherwise no even number qualifies; the
/// caller validates this.
pub fn next_low_prime_even(n: usize, prime_max: usize) -> usize {
    let mut candidate = n.max(2);
    if candidate % 2 == 1 {
        candidate += 1;
    }
    while !has_low_prime_factors(candidate, prime_max) {
        candidate += 2;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn largest_factor_of_known_values() {
        assert_eq!(largest_prime_factor(1), 1);
        assert_eq!(largest_prime_factor(2), 2);
        assert_eq!(largest_prime_factor(2000), 5);
        assert_eq!(largest_prime_factor(2 * 37), 37);
        assert_eq!(largest_prime_factor(97), 97);
        assert_eq!(largest_prime_factor(31 * 31 * 2), 31);
    }

    #[test]
    fn rounds_up_to_even_low_prime_length() {
        // 2 * 37 has a large factor, the next even candidate 76 = 2^2 * 19 does not
        assert_eq!(next_low_prime_even(74, 31), 76);
        assert_eq!(next_low_prime_even(2000, 31), 2000);
        assert_eq!(next_low_prime_even(2001, 31), 2002);
        assert_eq!(next_low_prime_even(7, 2), 8);
    }

    #[test]
    fn result_never_below_request() {
        for n in 1..500 {
            let m = next_low_prime_even(n, DEFAULT_PRIME_MAX);
            assert!(m >= n);
            assert_eq!(m % 2, 0);
            assert!(largest_prime_factor(m) <= DEFAULT_PRIME_MAX);
        }
    }
}
