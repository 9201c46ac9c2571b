//! Stand-in wallet generator for `Vault::create`.
//!
//! The real key codec (keypair generation, mnemonic derivation per BIP-39 or
//! similar) is an external collaborator out of scope here; this module only
//! needs to hand back *something* shaped like `(pub_key, mnemonic, addr)` so
//! the vault can seed a fresh account deterministically enough to test
//! against.

use cerera_hash::{derive_from_pubkey, Address};
use rand::RngCore;

const WORDLIST: &[&str] = &[
    "anchor", "basalt", "cedar", "dune", "ember", "fjord", "glacier", "harbor", "ivy", "jasper",
    "kiln", "lattice", "meadow", "nectar", "onyx", "pebble", "quartz", "ridge", "summit", "talon",
    "umber", "vale", "willow", "xenon", "yarrow", "zephyr",
];

pub struct GeneratedWallet {
    pub public_key: Vec<u8>,
    pub mnemonic: String,
    pub address: Address,
}

/// Generates a random 32-byte "public key", derives its address the same
/// way a real key codec would, and produces a 12-word mnemonic out of it.
pub fn generate() -> GeneratedWallet {
    let mut public_key = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut public_key);

    let mnemonic = public_key
        .chunks(2)
        .take(12)
        .map(|chunk| {
            let idx = (chunk[0] as usize * 256 + *chunk.get(1).unwrap_or(&0) as usize)
                % WORDLIST.len();
            WORDLIST[idx]
        })
        .collect::<Vec<_>>()
        .join(" ");

    let address = derive_from_pubkey(&public_key);
    GeneratedWallet {
        public_key,
        mnemonic,
        address,
    }
}
