use crate::error::ChainError;
use cerera_types::Block;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Reads the vault file line by line. Empty lines and lines that fail to
/// parse are skipped rather than aborting the load, a best-effort
/// recovery for a possibly truncated trailing write.
pub fn read_vault_file(path: &Path) -> Result<Vec<Block>, ChainError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut blocks = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Block>(&line) {
            Ok(block) => blocks.push(block),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unparseable vault file line");
            }
        }
    }
    Ok(blocks)
}

/// Appends a single JSON line for `block`, creating the file if absent.
pub fn append_block(path: &Path, block: &Block) -> Result<(), ChainError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(block).map_err(ChainError::VaultDecode)?;
    writeln!(file, "{line}")?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerera_hash::Address;
    use cerera_types::{Block as TBlock, BlockHeader, HEADER_VERSION};
    use std::io::Write as _;

    fn block(index: u64) -> TBlock {
        TBlock::seal(
            BlockHeader {
                index,
                height: index,
                prev_hash: cerera_hash::Hash::zero(),
                timestamp_ms: index,
                difficulty: 1,
                gas_limit: 1_000_000,
                gas_used: 0,
                chain_id: 1,
                producer: Address::zero(),
                nonce: 0,
                root: cerera_hash::Hash::zero(),
                size: 0,
                extra: Vec::new(),
                v: HEADER_VERSION,
            },
            Vec::new(),
        )
    }

    #[test]
    fn appends_and_reads_back_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.dat");
        append_block(&path, &block(0)).unwrap();
        append_block(&path, &block(1)).unwrap();

        let blocks = read_vault_file(&path).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].header.index, 0);
        assert_eq!(blocks[1].header.index, 1);
    }

    #[test]
    fn skips_corrupted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.dat");
        append_block(&path, &block(0)).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "not json at all").unwrap();
        }
        append_block(&path, &block(1)).unwrap();

        let blocks = read_vault_file(&path).unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn missing_file_yields_empty_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dat");
        assert!(read_vault_file(&path).unwrap().is_empty());
    }
}
