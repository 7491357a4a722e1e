//! Joye–Libert additively homomorphic encryption.
//!
//! Plaintexts live in Z_{2^k}. `N = p * q` with `p ≡ q ≡ 1 (mod 2^k)` and
//! `y` a quadratic non-residue modulo both primes. A ciphertext of `m` is
//! `y^m * x^(2^k) mod N`; multiplying ciphertexts adds plaintexts.

use crate::arith::{is_probable_prime, random_bits, random_unit};
use crate::error::{LheError, LheResult};
use hc_core::EvalParams;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand_core::RngCore;
use tracing::debug;

/// Headroom between the message size and the prime size.
const MIN_PRIME_MARGIN: u64 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    n: BigUint,
    y: BigUint,
    msg_bits: u32,
}

impl PublicKey {
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn y(&self) -> &BigUint {
        &self.y
    }

    pub fn msg_bits(&self) -> u32 {
        self.msg_bits
    }

    /// Parameters handed to evaluators and controllers.
    pub fn eval_params(&self) -> LheResult<EvalParams> {
        Ok(EvalParams::new(self.n.clone(), self.y.clone(), self.msg_bits)?)
    }

    pub fn encrypt<R: RngCore + ?Sized>(&self, rng: &mut R, m: &BigUint) -> BigUint {
        encrypt_raw(rng, &self.n, &self.y, self.msg_bits, m)
    }
}

#[derive(Clone)]
pub struct SecretKey {
    p: BigUint,
    msg_bits: u32,
    /// `(y^((p-1)/2^k))^(-1) mod p`
    d_inv: BigUint,
}

impl core::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SecretKey({} bits)", self.p.bits())
    }
}

impl SecretKey {
    fn new(p: BigUint, y: &BigUint, msg_bits: u32) -> LheResult<Self> {
        let exp = (&p - 1u32) >> msg_bits;
        let d = y.modpow(&exp, &p);
        let d_inv = d.modinv(&p).ok_or(LheError::KeyGen {
            what: "y has no inverse modulo p",
        })?;
        Ok(Self { p, msg_bits, d_inv })
    }

    /// Recover `m mod 2^k`, one bit per round.
    pub fn decrypt(&self, c: &BigUint) -> BigUint {
        let p = &self.p;
        let exp = (p - 1u32) >> self.msg_bits;
        let mut acc = c.modpow(&exp, p);
        let mut d = self.d_inv.clone();
        let mut m = BigUint::zero();
        for j in 1..=self.msg_bits {
            let z = acc.modpow(&(BigUint::one() << (self.msg_bits - j)), p);
            if !z.is_one() {
                m |= BigUint::one() << (j - 1);
                acc = acc * &d % p;
            }
            d = &d * &d % p;
        }
        m
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub secret: SecretKey,
}

impl KeyPair {
    /// Generate a key pair.
    ///
    /// # Arguments
    ///
    /// * `key_bits` - Bit size of `N`
    /// * `msg_bits` - Bit size `k` of the plaintext space
    pub fn generate<R: RngCore + ?Sized>(
        rng: &mut R,
        key_bits: u64,
        msg_bits: u32,
    ) -> LheResult<Self> {
        if msg_bits == 0 {
            return Err(LheError::InvalidArg {
                what: "msg_bits must be positive",
            });
        }
        let prime_bits = key_bits / 2;
        if prime_bits <= u64::from(msg_bits) + MIN_PRIME_MARGIN {
            return Err(LheError::InvalidArg {
                what: "key_bits too small for msg_bits",
            });
        }

        let p = congruent_prime(rng, prime_bits, msg_bits);
        let q = loop {
            let q = congruent_prime(rng, prime_bits, msg_bits);
            if q != p {
                break q;
            }
        };
        let n = &p * &q;

        let y = loop {
            let y = random_unit(rng, &n);
            if is_non_residue(&y, &p) && is_non_residue(&y, &q) {
                break y;
            }
        };
        debug!(n_bits = n.bits(), msg_bits, "generated Joye-Libert key pair");

        let secret = SecretKey::new(p, &y, msg_bits)?;
        Ok(Self {
            public: PublicKey { n, y, msg_bits },
            secret,
        })
    }
}

/// Encrypt `m` under `(N, y, k)` with fresh randomness.
pub fn encrypt_raw<R: RngCore + ?Sized>(
    rng: &mut R,
    n: &BigUint,
    y: &BigUint,
    msg_bits: u32,
    m: &BigUint,
) -> BigUint {
    let x = random_unit(rng, n);
    let blind = x.modpow(&(BigUint::one() << msg_bits), n);
    y.modpow(m, n) * blind % n
}

/// Random prime `p = p' * 2^k + 1` of `bits` bits.
fn congruent_prime<R: RngCore + ?Sized>(rng: &mut R, bits: u64, msg_bits: u32) -> BigUint {
    let mut attempts = 0u64;
    loop {
        attempts += 1;
        let cofactor = random_bits(rng, bits - u64::from(msg_bits));
        let candidate = (cofactor << msg_bits) + 1u32;
        if is_probable_prime(rng, &candidate) {
            debug!(bits, attempts, "found prime congruent to 1 mod 2^k");
            return candidate;
        }
    }
}

fn is_non_residue(y: &BigUint, p: &BigUint) -> bool {
    let p_minus_one = p - 1u32;
    y.modpow(&(&p_minus_one >> 1), p) == p_minus_one
}
