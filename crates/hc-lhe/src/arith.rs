//! Big-integer helpers: sampling and primality.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::RngCore;

const SMALL_PRIMES: [u32; 54] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

const MILLER_RABIN_ROUNDS: usize = 32;

/// Uniform-ish sample in `[0, bound)`. Oversamples by 64 bits so the
/// modular bias is negligible.
pub(crate) fn random_below<R: RngCore + ?Sized>(rng: &mut R, bound: &BigUint) -> BigUint {
    let len = (bound.bits() as usize).div_ceil(8) + 8;
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    BigUint::from_bytes_le(&bytes) % bound
}

/// Sample with exactly `bits` bits (top bit set).
pub(crate) fn random_bits<R: RngCore + ?Sized>(rng: &mut R, bits: u64) -> BigUint {
    let len = (bits as usize).div_ceil(8);
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    let mut value = BigUint::from_bytes_le(&bytes);
    let excess = (len as u64) * 8 - bits;
    value >>= excess;
    value | (BigUint::one() << (bits - 1))
}

/// Sample a unit of Z_n.
pub(crate) fn random_unit<R: RngCore + ?Sized>(rng: &mut R, n: &BigUint) -> BigUint {
    loop {
        let x = random_below(rng, n);
        if !x.is_zero() && x.gcd(n).is_one() {
            return x;
        }
    }
}

pub(crate) fn is_probable_prime<R: RngCore + ?Sized>(rng: &mut R, n: &BigUint) -> bool {
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    for &p in SMALL_PRIMES.iter() {
        let p = BigUint::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    let n_minus_one = n - 1u32;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    let span = n - 3u32;
    'witness: for _ in 0..MILLER_RABIN_ROUNDS {
        let a = random_below(rng, &span) + &two;
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
