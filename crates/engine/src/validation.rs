use sha3::{Digest, Keccak256};

/// Validate a USDT (BEP20) payout address.
///
/// Check order matters: structural rejects short-circuit before any
/// hashing happens. A checksummed (EIP-55 mixed-case) address is accepted
/// when its capitalization matches the Keccak-256 digest of the lowercase
/// body; otherwise only uniformly lower- or uppercase bodies pass. The
/// `0x` prefix is literal — `0X` is rejected.
pub fn is_valid_bep20_address(address: &str) -> bool {
    let trimmed = address.trim();

    if trimmed.is_empty() {
        return false;
    }

    if !trimmed.starts_with("0x") {
        return false;
    }

    // 0x + 40 hex characters
    if trimmed.len() != 42 {
        return false;
    }

    let body = &trimmed[2..];
    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    if passes_checksum(body) {
        return true;
    }

    // A checksum miss is not fatal: plain lower- or uppercase addresses
    // carry no case information and are accepted as-is.
    body == body.to_lowercase() || body == body.to_uppercase()
}

/// EIP-55 checksum test over the 40-char hex body.
///
/// Position i must be uppercase when nibble i of
/// keccak256(lowercase(body)) is 8..=15 and lowercase when it is 0..=7.
/// Digits satisfy both.
fn passes_checksum(body: &str) -> bool {
    let lowered = body.to_lowercase();
    let digest = Keccak256::digest(lowered.as_bytes());

    body.bytes().enumerate().all(|(i, c)| {
        let byte = digest[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if nibble > 7 {
            !c.is_ascii_lowercase()
        } else {
            !c.is_ascii_uppercase()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(!is_valid_bep20_address(""));
        assert!(!is_valid_bep20_address("   "));
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(!is_valid_bep20_address(
            "a7c15a46fa8feb53140844e0b31d847e6087d2ca"
        ));
    }

    #[test]
    fn prefix_is_case_sensitive() {
        // 0X is not 0x, even when the rest is fine
        assert!(!is_valid_bep20_address(
            "0XA7C15A46FA8FEB53140844E0B31D847E6087D2CA"
        ));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_bep20_address("0x123"));
        assert!(!is_valid_bep20_address(
            "0xa7c15a46fa8feb53140844e0b31d847e6087d2c" // 41 chars
        ));
        assert!(!is_valid_bep20_address(
            "0xa7c15a46fa8feb53140844e0b31d847e6087d2caa" // 43 chars
        ));
    }

    #[test]
    fn rejects_non_hex_characters() {
        assert!(!is_valid_bep20_address(
            "0xZ7c15a46fa8feb53140844e0b31d847e6087d2ca"
        ));
        assert!(!is_valid_bep20_address(
            "0xa7c15a46fa8feb53140844e0b31d847e6087d2cg"
        ));
    }

    #[test]
    fn accepts_all_lowercase() {
        assert!(is_valid_bep20_address(
            "0xa7c15a46fa8feb53140844e0b31d847e6087d2ca"
        ));
        assert!(is_valid_bep20_address(
            "0xde709f2102306220921060314715629080e2fb77"
        ));
    }

    #[test]
    fn accepts_all_uppercase_body() {
        assert!(is_valid_bep20_address(
            "0xA7C15A46FA8FEB53140844E0B31D847E6087D2CA"
        ));
    }

    #[test]
    fn accepts_checksummed_addresses() {
        // EIP-55 reference vectors
        assert!(is_valid_bep20_address(
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        ));
        assert!(is_valid_bep20_address(
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
        ));
        assert!(is_valid_bep20_address(
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB"
        ));
        assert!(is_valid_bep20_address(
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb"
        ));
    }

    #[test]
    fn rejects_mixed_case_with_broken_checksum() {
        // First letter flipped from the valid vector above
        assert!(!is_valid_bep20_address(
            "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        ));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert!(is_valid_bep20_address(
            "  0xa7c15a46fa8feb53140844e0b31d847e6087d2ca  "
        ));
    }
}
