//! Key Generator Module
//!
//! Produces the random identifiers handed out for new documents.

use rand::Rng;

use crate::config::KeyGeneratorType;

/// Uppercase letters without the easily confused ones (I, L, O, Q ...)
const UPPERCASE: &[u8] = b"ABCDEFGHJKMNPRSTWXYZ";
/// Lowercase letters without the easily confused ones (i, j, l, o ...)
const LOWERCASE: &[u8] = b"abcdefhkmnprstwxyz";

/// Alphabets cycled through position by position, giving keys like `AkwMrtCpp`.
const SEQUENCE: [&[u8]; 3] = [UPPERCASE, LOWERCASE, LOWERCASE];

const VOWELS: &[u8] = b"aeiou";
const CONSONANTS: &[u8] = b"bcdfghjklmnpqrstvwxyz";

// == Key Generator ==
/// Source of candidate document keys.
///
/// Implementations must not share mutable state between calls; concurrent
/// callers get independent keys. Keys must never contain `.`, which the read
/// path treats as an extension separator.
pub trait KeyGenerator: Send + Sync {
    /// Returns a key of exactly `length` characters.
    fn create_key(&self, length: usize) -> String;
}

/// Builds the generator selected in configuration.
pub fn from_type(kind: KeyGeneratorType) -> Box<dyn KeyGenerator> {
    match kind {
        KeyGeneratorType::Random => Box::new(RandomKeyGenerator),
        KeyGeneratorType::Phonetic => Box::new(PhoneticKeyGenerator),
    }
}

// == Random ==
/// Picks characters from unambiguous alphabets.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn create_key(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|i| pick(&mut rng, SEQUENCE[i % SEQUENCE.len()]))
            .collect()
    }
}

// == Phonetic ==
/// Alternates consonants and vowels so keys can be read aloud.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhoneticKeyGenerator;

impl KeyGenerator for PhoneticKeyGenerator {
    fn create_key(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        let start_with_vowel: bool = rng.gen();
        (0..length)
            .map(|i| {
                let vowel = (i % 2 == 0) == start_with_vowel;
                pick(&mut rng, if vowel { VOWELS } else { CONSONANTS })
            })
            .collect()
    }
}

fn pick<R: Rng>(rng: &mut R, alphabet: &[u8]) -> char {
    alphabet[rng.gen_range(0..alphabet.len())] as char
}
