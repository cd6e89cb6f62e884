use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::AuthError;

const SPECIALS: &str = "@$!%*?&";

/// Password policy: 8 to 100 characters with a lowercase letter, an uppercase
/// letter, a digit and one of `@$!%*?&`.
pub fn check_policy(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if !(8..=100).contains(&len) {
        return Err("Password must be between 8 and 100 characters.".to_string());
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIALS.contains(c));
    if has_lower && has_upper && has_digit && has_special {
        Ok(())
    } else {
        Err(format!(
            "Password must contain at least one lowercase letter, one uppercase letter, one number and one special character ({}).",
            SPECIALS
        ))
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// False for a wrong password; errors only when the stored hash is unreadable
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Random password for imported accounts; always satisfies [`check_policy`].
pub fn generate_random_password(len: usize) -> String {
    const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
    const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
    const DIGITS: &[u8] = b"23456789";
    let specials = SPECIALS.as_bytes();
    let len = len.clamp(8, 100);

    let mut rng = rand::thread_rng();
    let all: Vec<u8> = [LOWER, UPPER, DIGITS, specials].concat();
    let mut chars: Vec<u8> = [LOWER, UPPER, DIGITS, specials]
        .iter()
        .map(|set| set[rng.gen_range(0..set.len())])
        .collect();
    while chars.len() < len {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_requires_every_class() {
        assert!(check_policy("Str0ng@Pass").is_ok());
        assert!(check_policy("password123").is_err());
        assert!(check_policy("NoDigits@here").is_err());
        assert!(check_policy("Sh0rt@").is_err());
    }

    #[test]
    fn hashes_verify() {
        let hash = hash_password("Str0ng@Pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Str0ng@Pass", &hash).unwrap());
        assert!(!verify_password("Wr0ng@Pass", &hash).unwrap());
        assert!(verify_password("Str0ng@Pass", "not-a-hash").is_err());
    }

    #[test]
    fn generated_passwords_meet_policy() {
        for _ in 0..50 {
            let password = generate_random_password(12);
            assert_eq!(password.len(), 12);
            assert!(check_policy(&password).is_ok(), "{}", password);
        }
    }
}
