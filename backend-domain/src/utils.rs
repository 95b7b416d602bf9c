use chrono::{DateTime, Local, Utc};

/// Human-readable local timestamp stored next to the server timestamp.
pub fn display_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_has_date_and_meridiem() {
        let label = display_label(Utc::now());
        assert!(label.contains(", "));
        assert!(label.ends_with("AM") || label.ends_with("PM"));
        assert_eq!(label.matches('/').count(), 2);
    }
}
