#![forbid(unsafe_code)]

use rand::Rng;

use filegate_contracts::AccessKey;

/// External capability: collision-resistant generation of fresh access keys.
pub trait KeyMinter: Send + Sync {
    fn mint(&self) -> AccessKey;
}

const TOKEN_LEN: usize = 10;
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Production minter: 10-character lowercase alphanumeric token with an
/// alphabetic first character, drawn from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandKeyMinter;

impl KeyMinter for RandKeyMinter {
    fn mint(&self) -> AccessKey {
        let mut rng = rand::thread_rng();
        let mut token = String::with_capacity(TOKEN_LEN);
        token.push(LETTERS[rng.gen_range(0..LETTERS.len())] as char);
        for _ in 1..TOKEN_LEN {
            token.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
        }
        AccessKey::new(token).expect("minted tokens are always valid access keys")
    }
}
