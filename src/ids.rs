use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const FOLDER_PREFIX: &str = "f";
pub const ROUTINE_PREFIX: &str = "r";
pub const WORKOUT_PREFIX: &str = "w";

const SHORT_HASH_LEN: usize = 6;

pub fn generate_id<F>(prefix: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    for _ in 0..64 {
        let seed = Uuid::now_v7().to_string();
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        let candidate = format!("{}-{}", prefix, &digest[..SHORT_HASH_LEN]);
        if !exists(&candidate) {
            return candidate;
        }
    }

    format!("{}-{}", prefix, &Uuid::now_v7().simple().to_string()[..16])
}
