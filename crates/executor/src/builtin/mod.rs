// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Ethereum-compatible built-in contracts. These are pure functions over
//! input bytes with no storage side effects, so the host bridge invokes
//! them synchronously in-process instead of crossing the executive
//! boundary.

use num::{BigUint, Zero};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Execution error of a built-in contract.
#[derive(Debug)]
pub struct Error(pub String);

impl From<&'static str> for Error {
    fn from(val: &'static str) -> Self { Error(val.into()) }
}

/// A gas pricing scheme for built-in contracts.
pub trait Pricer: Send + Sync {
    /// The gas cost of running this built-in for the given input data.
    fn cost(&self, input: &[u8]) -> u64;
}

/// Native implementation of a built-in contract.
pub trait Implementation: Send + Sync {
    fn execute(&self, input: &[u8]) -> Result<Vec<u8>, Error>;
}

/// A built-in contract: pricing plus native code.
pub struct Builtin {
    pricer: Box<dyn Pricer>,
    native: Box<dyn Implementation>,
}

impl Builtin {
    pub fn cost(&self, input: &[u8]) -> u64 { self.pricer.cost(input) }

    pub fn execute(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        self.native.execute(input)
    }
}

/// Linear pricing: base plus a charge per 32-byte word.
pub struct Linear {
    pub base: u64,
    pub word: u64,
}

impl Pricer for Linear {
    fn cost(&self, input: &[u8]) -> u64 {
        self.base + self.word * ((input.len() as u64 + 31) / 32)
    }
}

/// Pricing for modular exponentiation, quadratic in the operand width.
pub struct ModexpPricer {
    pub divisor: u64,
}

impl Pricer for ModexpPricer {
    fn cost(&self, input: &[u8]) -> u64 {
        let base_len = read_len(input, 0);
        let exp_len = read_len(input, 32);
        let mod_len = read_len(input, 64);
        let width = base_len.max(mod_len);
        let multiplications = width.saturating_mul(width);
        multiplications
            .saturating_mul(exp_len.max(1))
            .checked_div(self.divisor)
            .unwrap_or(u64::MAX)
            .max(1)
    }
}

fn read_len(input: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 32];
    for (i, slot) in word.iter_mut().enumerate() {
        *slot = input.get(offset + i).copied().unwrap_or(0);
    }
    // lengths beyond 2^64 are unpayable anyway, clamp to the low quad
    if word[..24].iter().any(|b| *b != 0) {
        return u64::MAX;
    }
    u64::from_be_bytes(word[24..].try_into().expect("eight bytes"))
}

struct Identity;

impl Implementation for Identity {
    fn execute(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(input.to_vec())
    }
}

struct Sha256Hash;

impl Implementation for Sha256Hash {
    fn execute(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(Sha256::digest(input).to_vec())
    }
}

struct Ripemd160Hash;

impl Implementation for Ripemd160Hash {
    fn execute(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        // 20-byte digest, left-padded to a 32-byte word
        let mut output = vec![0u8; 12];
        output.extend_from_slice(&Ripemd160::digest(input));
        Ok(output)
    }
}

struct Modexp;

impl Implementation for Modexp {
    fn execute(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        let base_len = read_len(input, 0) as usize;
        let exp_len = read_len(input, 32) as usize;
        let mod_len = read_len(input, 64) as usize;
        if base_len.max(exp_len).max(mod_len) > 1024 {
            return Err("modexp operand too large".into());
        }

        let payload = |offset: usize, len: usize| -> Vec<u8> {
            let start = 96 + offset;
            (start..start + len)
                .map(|i| input.get(i).copied().unwrap_or(0))
                .collect()
        };
        let base = BigUint::from_bytes_be(&payload(0, base_len));
        let exp = BigUint::from_bytes_be(&payload(base_len, exp_len));
        let modulus =
            BigUint::from_bytes_be(&payload(base_len + exp_len, mod_len));

        let result = if modulus.is_zero() {
            BigUint::zero()
        } else {
            base.modpow(&exp, &modulus)
        };

        let bytes = result.to_bytes_be();
        let mut output = vec![0u8; mod_len.saturating_sub(bytes.len())];
        output.extend_from_slice(&bytes);
        output.truncate(mod_len);
        Ok(output)
    }
}

fn builtin_factory(name: &str) -> Builtin {
    match name {
        "identity" => Builtin {
            pricer: Box::new(Linear { base: 15, word: 3 }),
            native: Box::new(Identity),
        },
        "sha256" => Builtin {
            pricer: Box::new(Linear { base: 60, word: 12 }),
            native: Box::new(Sha256Hash),
        },
        "ripemd160" => Builtin {
            pricer: Box::new(Linear {
                base: 600,
                word: 120,
            }),
            native: Box::new(Ripemd160Hash),
        },
        "modexp" => Builtin {
            pricer: Box::new(ModexpPricer { divisor: 20 }),
            native: Box::new(Modexp),
        },
        _ => panic!("invalid builtin name: {}", name),
    }
}

/// The built-in table keyed by 40-hex-digit address. Addresses follow the
/// Ethereum convention (0x2 sha256, 0x3 ripemd160, 0x4 identity,
/// 0x5 modexp).
pub fn ethereum_builtins() -> BTreeMap<String, Builtin> {
    let mut map = BTreeMap::new();
    for (value, name) in [
        (2u64, "sha256"),
        (3, "ripemd160"),
        (4, "identity"),
        (5, "modexp"),
    ] {
        map.insert(format!("{:040x}", value), builtin_factory(name));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::{builtin_factory, ethereum_builtins};

    #[test]
    fn identity_echoes_input() {
        let builtin = builtin_factory("identity");
        assert_eq!(builtin.execute(b"abc").unwrap(), b"abc".to_vec());
        assert_eq!(builtin.cost(&[0u8; 33]), 15 + 3 * 2);
    }

    #[test]
    fn sha256_digest_of_empty_input() {
        let builtin = builtin_factory("sha256");
        let output = builtin.execute(b"").unwrap();
        assert_eq!(
            hex(&output),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn ripemd160_digest_is_left_padded() {
        let builtin = builtin_factory("ripemd160");
        let output = builtin.execute(b"").unwrap();
        assert_eq!(output.len(), 32);
        assert_eq!(&output[..12], &[0u8; 12]);
        assert_eq!(
            hex(&output[12..]),
            "9c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
    }

    #[test]
    fn modexp_small_case() {
        // 3 ^ 5 mod 7 == 5
        let mut input = Vec::new();
        for len in [1u64, 1, 1] {
            let mut word = [0u8; 32];
            word[24..].copy_from_slice(&len.to_be_bytes());
            input.extend_from_slice(&word);
        }
        input.extend_from_slice(&[3, 5, 7]);

        let builtin = builtin_factory("modexp");
        assert_eq!(builtin.execute(&input).unwrap(), vec![5]);
        assert!(builtin.cost(&input) >= 1);
    }

    #[test]
    fn table_is_keyed_by_padded_addresses() {
        let builtins = ethereum_builtins();
        assert!(builtins
            .contains_key("0000000000000000000000000000000000000004"));
        assert_eq!(builtins.len(), 4);
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
