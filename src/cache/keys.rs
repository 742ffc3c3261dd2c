//! Key layout shared by the rate limiter and the read-through cache.

pub const RATE_LIMIT_PREFIX: &str = "rate_limit";
pub const DELIVERY_PREFIX: &str = "pn_";

/// Bucket name for the delivery lookup endpoint.
pub const DELIVERY_BUCKET: &str = "utdelningar";

pub fn rate_limit_key(bucket: &str, identity: &str) -> String {
    format!("{}:{}:{}", RATE_LIMIT_PREFIX, bucket, identity)
}

/// Cache key for an already normalized postal code.
pub fn delivery_key(postal_code: &str) -> String {
    format!("{}{}", DELIVERY_PREFIX, postal_code)
}

/// Strips every whitespace character, so "123 45" and "12345" share an entry.
pub fn normalize_lookup(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_variants_share_a_key() {
        assert_eq!(
            delivery_key(&normalize_lookup("123 45")),
            delivery_key(&normalize_lookup("12345"))
        );
        assert_eq!(normalize_lookup(" 1\t23\n45 "), "12345");
    }

    #[test]
    fn rate_limit_key_includes_bucket() {
        assert_eq!(
            rate_limit_key(DELIVERY_BUCKET, "10.0.0.1"),
            "rate_limit:utdelningar:10.0.0.1"
        );
    }
}
