use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Signs tokens the way the identity service does. Test-only: issuance lives elsewhere.
#[cfg(test)]
pub fn sign_token(
    user_id: u64,
    role: u8,
    token_type: crate::models::TokenType,
    secret: &str,
) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        user_id,
        sub: format!("user{user_id}"),
        role,
        exp: now + 900,
        jti: format!("test-{user_id}-{now}"),
        token_type,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenType;

    #[test]
    fn verifies_with_matching_secret_only() {
        let token = sign_token(7, 2, TokenType::Access, "right");

        let claims = verify_token(&token, "right").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, 2);
        assert_eq!(claims.token_type, TokenType::Access);

        assert!(verify_token(&token, "wrong").is_err());
    }
}
