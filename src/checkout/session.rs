use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

const SESSION_SUFFIX_LEN: usize = 13;

/// Mints an opaque checkout session token: millisecond timestamp followed
/// by a random alphanumeric suffix. Unique with overwhelming probability;
/// the UNIQUE constraint on `pending_payments.session_id` is the backstop.
pub fn generate_session_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_SUFFIX_LEN)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("{}{}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_distinct() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_starts_with_millisecond_timestamp() {
        let before = Utc::now().timestamp_millis();
        let id = generate_session_id();
        let after = Utc::now().timestamp_millis();

        let digits: String = id.chars().take(13).collect();
        let stamp: i64 = digits.parse().expect("timestamp prefix");
        assert!(stamp >= before && stamp <= after);
    }

    #[test]
    fn session_id_suffix_is_lowercase_alphanumeric() {
        let id = generate_session_id();
        let suffix = &id[id.len() - SESSION_SUFFIX_LEN..];
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
