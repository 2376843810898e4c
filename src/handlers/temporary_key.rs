use axum::Json;
use chrono::Utc;
use rand::Rng;

use crate::dtos::stats::TemporaryKeyResponse;

const KEY_LEN: usize = 6;
const KEY_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn generate_temporary_key<R: Rng>(rng: &mut R) -> String {
    (0..KEY_LEN)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

/// A fresh key on every call; nothing is stored.
pub async fn temporary_key() -> Json<TemporaryKeyResponse> {
    let key = generate_temporary_key(&mut rand::thread_rng());
    Json(TemporaryKeyResponse { key, timestamp: Utc::now() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_six_upper_case_base36_characters() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let key = generate_temporary_key(&mut rng);
            assert_eq!(key.len(), 6);
            assert!(key.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }
}
