use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;
const ROUNDS: usize = 10_000;

fn digest(password: &str, salt: &str) -> String {
    let mut state = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..ROUNDS {
        state = Sha256::new()
            .chain_update(state)
            .chain_update(salt.as_bytes())
            .finalize();
    }
    hex::encode(state)
}

/// 返回 (hash, salt)，均为十六进制字符串
pub fn hash_password(password: &str) -> (String, String) {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    (digest(password, &salt), salt)
}

pub fn verify_password(password: &str, hash: &str, salt: &str) -> bool {
    let candidate = digest(password, salt);
    // 逐字节比较，不提前返回
    candidate.len() == hash.len()
        && candidate
            .bytes()
            .zip(hash.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let (hash, salt) = hash_password("hunter2-but-longer");
        assert!(verify_password("hunter2-but-longer", &hash, &salt));
        assert!(!verify_password("hunter3-but-longer", &hash, &salt));
    }

    #[test]
    fn salts_differ_per_hash() {
        let (hash_a, salt_a) = hash_password("same password");
        let (hash_b, salt_b) = hash_password("same password");
        assert_ne!(salt_a, salt_b);
        assert_ne!(hash_a, hash_b);
    }
}
