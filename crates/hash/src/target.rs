use crate::Hash;
use primitive_types::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("difficulty must be non-zero")]
    DifficultyZero,
}

/// `target = floor(2^256 / difficulty)`. Difficulty zero is rejected
/// rather than treated as "infinite target".
pub fn target_for_difficulty(difficulty: u64) -> Result<U256, TargetError> {
    if difficulty == 0 {
        return Err(TargetError::DifficultyZero);
    }
    Ok(U256::MAX / U256::from(difficulty))
}

fn hash_as_u256(hash: &Hash) -> U256 {
    U256::from_big_endian(hash.as_bytes())
}

/// A block's hash, read as a big-endian 256-bit unsigned integer, must be
/// strictly less than `target(difficulty)`.
pub fn meets_target(hash: &Hash, difficulty: u64) -> Result<bool, TargetError> {
    let target = target_for_difficulty(difficulty)?;
    Ok(hash_as_u256(hash) < target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rx_hash;

    #[test]
    fn difficulty_zero_is_rejected() {
        assert_eq!(target_for_difficulty(0), Err(TargetError::DifficultyZero));
        assert_eq!(
            meets_target(&rx_hash(b"x"), 0),
            Err(TargetError::DifficultyZero)
        );
    }

    #[test]
    fn higher_difficulty_shrinks_target() {
        let low = target_for_difficulty(1).unwrap();
        let high = target_for_difficulty(1_000_000).unwrap();
        assert!(high < low);
    }

    #[test]
    fn zero_hash_always_meets_target() {
        assert!(meets_target(&Hash::zero(), 1_000_000_000).unwrap());
    }
}
