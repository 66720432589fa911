use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Label mixed into per-match seed derivation.
const RNG_STREAM_MATCH: &str = "zone-forecast/match";

/// Generator backing the shared sequential stream of a run.
pub(crate) fn sequential_stream(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Independent generator owned by a single match number.
pub(crate) fn match_stream(base_seed: u64, match_number: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_match_seed(base_seed, match_number))
}

fn derive_match_seed(base_seed: u64, match_number: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base_seed.to_le_bytes());
    hasher.update(RNG_STREAM_MATCH.as_bytes());
    hasher.update(match_number.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
