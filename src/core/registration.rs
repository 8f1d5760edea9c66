//! Nickname and e-mail validation for account creation

use sha2::{Digest, Sha256};
use url::Url;

use crate::constants::{GRAVATAR_BASE, NICKNAME_MAX_LENGTH, NICKNAME_MIN_LENGTH};
use crate::security::{decode_html, sanitize_text};

pub const NICKNAME_TOO_SHORT: &str = "Your nickname is to short";
pub const NICKNAME_TOO_LONG: &str = "Your nickname is to long";
pub const NICKNAME_TAKEN: &str = "This nickname is already taken";
pub const EMAIL_INVALID: &str = "Incorrect e-mail address";
pub const ACCOUNT_INCOMPLETE: &str =
    "Unable to create a account, make sure you filled in all details";

/// Characters allowed in the local part besides ASCII alphanumerics
const LOCAL_PART_SYMBOLS: &str = "!#$%&'*+/=?^_`{|}~-";

/// Canonical form of a nickname: lowercased, trimmed and HTML-encoded.
///
/// Registration, `private` targets and blacklist entries all go through
/// this one function. Raw input and input the message filter already
/// encoded map to the same string, and the result is a fixed point.
pub fn normalize_nickname(raw: &str) -> String {
    sanitize_text(&raw.to_lowercase())
}

/// Length check on a normalized nickname, counting the characters the
/// client typed rather than their encoded form
pub fn check_nickname_length(nickname: &str) -> Result<(), &'static str> {
    let length = decode_html(nickname).chars().count();
    if length < NICKNAME_MIN_LENGTH {
        Err(NICKNAME_TOO_SHORT)
    } else if length > NICKNAME_MAX_LENGTH {
        Err(NICKNAME_TOO_LONG)
    } else {
        Ok(())
    }
}

/// Full nickname validation: length and uniqueness
pub fn validate_nickname<F>(nickname: &str, is_taken: F) -> Result<(), &'static str>
where
    F: Fn(&str) -> bool,
{
    check_nickname_length(nickname)?;
    if is_taken(nickname) {
        return Err(NICKNAME_TAKEN);
    }
    Ok(())
}

/// Basic `local@domain.tld` shape check
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local.split('.').all(|atom| {
            !atom.is_empty()
                && atom
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SYMBOLS.contains(c))
        });

    let labels: Vec<&str> = domain.split('.').collect();
    let domain_ok = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    local_ok && domain_ok
}

/// URL-safe identity key: lowercase, whitespace runs collapsed to `-`
pub fn slugify(nickname: &str) -> String {
    let slug = nickname
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        // nothing URL-safe survived, fall back to the hex bytes
        nickname.bytes().map(|b| format!("{:02x}", b)).collect()
    } else {
        slug
    }
}

/// Gravatar image URL for an e-mail address
pub fn avatar_url(email: &str, size: u32) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    let base = format!("{}{}", GRAVATAR_BASE, hash);
    let size = size.to_string();

    match Url::parse_with_params(&base, &[("s", size.as_str()), ("r", "pg"), ("d", "404")]) {
        Ok(url) => url.to_string(),
        Err(e) => {
            log::warn!("Failed to build avatar url: {}", e);
            base
        }
    }
}
