use std::num::NonZeroU32;

use base64::{engine::general_purpose, Engine};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use ring::{
    digest, pbkdf2,
    rand::{SecureRandom, SystemRandom},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    model::{CurrentUser, User},
};

static PBKDF2_ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const PBKDF2_ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
const SCHEME: &str = "pbkdf2-sha256";

/// Hashes a password into `pbkdf2-sha256$<rounds>$<salt>$<hash>` (base64 parts).
pub fn hash_password(password: &str) -> AppResult<String> {
    let rounds = NonZeroU32::new(PBKDF2_ROUNDS)
        .ok_or_else(|| AppError::Internal("PBKDF2 rounds must be non-zero".to_string()))?;

    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| AppError::Internal("failed to generate password salt".to_string()))?;

    let mut hash = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(PBKDF2_ALGORITHM, rounds, &salt, password.as_bytes(), &mut hash);

    Ok(format!(
        "{}${}${}${}",
        SCHEME,
        rounds,
        general_purpose::STANDARD.encode(salt),
        general_purpose::STANDARD.encode(hash)
    ))
}

/// False for a wrong password and for any stored value this module did not produce.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, rounds, salt, hash] = parts.as_slice() else {
        return false;
    };
    if *scheme != SCHEME {
        return false;
    }
    let Some(rounds) = rounds.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (
        general_purpose::STANDARD.decode(salt),
        general_purpose::STANDARD.decode(hash),
    ) else {
        return false;
    };
    pbkdf2::verify(PBKDF2_ALGORITHM, rounds, &salt, password.as_bytes(), &hash).is_ok()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub exp: u64,
}

/// Issues an HS256 bearer token naming `user`, valid for `ttl_secs`.
pub fn issue_token(user: &User, secret: &str, ttl_secs: u64) -> AppResult<String> {
    let exp = chrono::Utc::now().timestamp().max(0) as u64 + ttl_secs;
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        exp,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Checks signature and expiry and returns the acting user the token names.
pub fn verify_token(token: &str, secret: &str) -> AppResult<CurrentUser> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    let user_id = data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))?;
    Ok(CurrentUser {
        user_id,
        username: data.claims.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: "ada".to_string(),
            password_hash: String::new(),
            created_at: 0,
        }
    }

    #[test]
    fn password_hash_verifies_only_the_original_password() {
        let stored = hash_password("correct horse").unwrap();
        assert!(stored.starts_with("pbkdf2-sha256$100000$"));
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("battery staple", &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("pw").unwrap(), hash_password("pw").unwrap());
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "plain-text-password"));
        assert!(!verify_password("pw", "pbkdf2-sha256$0$AAAA$AAAA"));
        assert!(!verify_password("pw", "md5$1000$AAAA$AAAA"));
    }

    #[test]
    fn token_names_the_user() {
        let token = issue_token(&user(), "secret", 60).unwrap();
        let current = verify_token(&token, "secret").unwrap();
        assert_eq!(current.user_id, 7);
        assert_eq!(current.username, "ada");
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = issue_token(&user(), "secret", 60).unwrap();
        let err = verify_token(&token, "other").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
