//! User identity cookie.
//!
//! The token has the shape `{user_id}:{hex(sha512(user_id + salt))}`. It is
//! a keyed digest rather than an HMAC and carries no expiry of its own; the
//! cookie's max-age bounds its lifetime in the browser.

use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use tracing::warn;

fn digest(user_id: &str, salt: &str) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(user_id.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.finalize().to_vec()
}

/// Build the cookie value identifying `user_id`.
///
/// # Examples
/// ```
/// use recipebox::domain::security::{get_auth_cookie, get_user_id_from_cookie};
///
/// let token = get_auth_cookie("42", "salt");
/// assert_eq!(get_user_id_from_cookie(&token, "salt").as_deref(), Some("42"));
/// ```
#[must_use]
pub fn get_auth_cookie(user_id: &str, salt: &str) -> String {
    format!("{user_id}:{}", hex::encode(digest(user_id, salt)))
}

/// Recover the user id from a cookie value, or `None` when it was tampered with.
#[must_use]
pub fn get_user_id_from_cookie(token: &str, salt: &str) -> Option<String> {
    let parts: Vec<&str> = token.split(':').collect();
    let [user_id, signature] = parts.as_slice() else {
        return None;
    };
    let provided = hex::decode(signature).ok()?;
    let matches: bool = digest(user_id, salt).ct_eq(&provided).into();
    if !matches {
        warn!(user_id = %user_id, "auth cookie hash mismatch");
        return None;
    }
    Some((*user_id).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SALT: &str = "s3cret";

    #[rstest]
    fn token_embeds_id_and_hex_digest() {
        let token = get_auth_cookie("abc", SALT);
        let (id, hash) = token.split_once(':').expect("separator");
        assert_eq!(id, "abc");
        assert_eq!(hash.len(), 128);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[rstest]
    #[case::no_separator("abc")]
    #[case::extra_part("abc:def:ghi")]
    #[case::wrong_hash("abc:0000")]
    fn malformed_or_tampered_tokens_are_rejected(#[case] token: &str) {
        assert_eq!(get_user_id_from_cookie(token, SALT), None);
    }

    #[rstest]
    #[case::wrong_length("abc:00ff")]
    #[case::not_hex("abc:zz")]
    fn short_or_non_hex_hashes_are_rejected(#[case] token: &str) {
        assert_eq!(get_user_id_from_cookie(token, SALT), None);
    }

    #[rstest]
    fn different_salt_rejects() {
        let token = get_auth_cookie("abc", SALT);
        assert_eq!(get_user_id_from_cookie(&token, "other"), None);
    }

    #[rstest]
    #[case::first_char("abd")]
    #[case::appended("abcd")]
    #[case::emptied("")]
    fn rewritten_user_id_keeps_no_signature(#[case] forged_id: &str) {
        let token = get_auth_cookie("abc", SALT);
        let forged = token.replacen("abc", forged_id, 1);
        assert_ne!(forged, token);
        assert_eq!(get_user_id_from_cookie(&forged, SALT), None);
    }

    #[rstest]
    #[case("abc", SALT)]
    #[case("7f1d4c1e-7b5a-4c1e-9d0b-2f1e3c4d5a6b", "another salt")]
    #[case("42", "")]
    fn tokens_round_trip_for_their_salt(#[case] user_id: &str, #[case] salt: &str) {
        let token = get_auth_cookie(user_id, salt);
        assert_eq!(get_user_id_from_cookie(&token, salt).as_deref(), Some(user_id));
    }
}
