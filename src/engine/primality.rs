/// Trial division up to the integer square root of `n`.
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    let mut i = 2u64;
    // i <= n / i is i*i <= n without the overflow
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::is_prime;

    #[test]
    fn boundary_cases() {
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(is_prime(2));
        assert!(is_prime(3));
        assert!(!is_prime(4));
        assert!(is_prime(97));
    }

    #[test]
    fn perfect_squares_of_primes_are_composite() {
        for p in [2u64, 3, 5, 7, 11, 13, 97] {
            assert!(!is_prime(p * p), "{} should be composite", p * p);
        }
    }

    #[test]
    fn first_twenty_five_primes_are_below_one_hundred() {
        let primes: Vec<u64> = (0..100).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes.len(), 25);
        assert_eq!(&primes[..5], &[2, 3, 5, 7, 11]);
        assert_eq!(primes.last(), Some(&97));
    }

    #[test]
    fn large_values_do_not_overflow() {
        assert!(is_prime(1_000_000_007));
        assert!(!is_prime(u64::MAX));
    }
}
