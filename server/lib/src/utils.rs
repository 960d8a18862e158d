use std::time::{Duration, SystemTime};

pub fn duration_from_epoch_now() -> Duration {
    #[allow(clippy::expect_used)]
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("invalid duration from epoch now")
}

/// Case folded equality for directory string values. Values in this server
/// core are matched with the caseIgnore rule, which is the default matching
/// behaviour for the attribute syntaxes the core manipulates.
pub fn value_eq_fold(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Case folded form of a directory string, used as a normalised map key.
pub fn value_fold(s: &str) -> String {
    s.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_fold() {
        assert!(value_eq_fold("Alice", "alice"));
        assert!(!value_eq_fold("alice", "allie"));
        assert_eq!(value_fold("CN"), "cn");
    }
}
