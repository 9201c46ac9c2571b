use crate::error::MinerError;
use crate::template::Template;
use cerera_hash::{meets_target, rx_hash, Hash, TargetError};
use cerera_types::Block;

/// Outcome of one bounded proof-of-work search batch.
pub enum SearchOutcome {
    /// A nonce satisfying the target was found.
    Found { nonce: u64, hash: Hash },
    /// The batch ran out of attempts without finding one; the caller should
    /// bump `next_nonce` and try again on a later tick.
    Exhausted { next_nonce: u64 },
}

/// Searches for a nonce such that `rx_hash(canonical_bytes(template_with_nonce))`
/// is strictly below `target(difficulty)`.
///
/// Re-serializes the header on every attempt via `BlockHeader::with_nonce`
/// rather than splicing the nonce region in place: correctness before
/// cleverness.
pub fn search(
    template: &Template,
    start_nonce: u64,
    max_attempts: u64,
) -> Result<SearchOutcome, MinerError> {
    if template.header.difficulty == 0 {
        return Err(MinerError::DifficultyZero);
    }

    for offset in 0..max_attempts {
        let nonce = start_nonce.wrapping_add(offset);
        let header = template.header.with_nonce(nonce);
        let preimage = Block::hash_preimage(&header, &template.transactions);
        let hash = rx_hash(&preimage);
        match meets_target(&hash, template.header.difficulty) {
            Ok(true) => return Ok(SearchOutcome::Found { nonce, hash }),
            Ok(false) => continue,
            Err(TargetError::DifficultyZero) => return Err(MinerError::DifficultyZero),
        }
    }

    Ok(SearchOutcome::Exhausted {
        next_nonce: start_nonce.wrapping_add(max_attempts),
    })
}
