/// Redact userinfo (`user:pass@`) from a URL for safe logging/Debug output.
/// Falls back to returning the input unchanged if it doesn't parse as
/// `scheme://[userinfo@]rest`.
pub fn redact_url(url: &str) -> String {
    let Some(scheme_split) = url.find("://") else {
        return url.to_string();
    };
    let (scheme, rest) = url.split_at(scheme_split + 3);
    match rest.find('@') {
        Some(at) => format!("{scheme}***@{}", &rest[at + 1..]),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_userinfo() {
        assert_eq!(
            redact_url("postgres://oj:swordfish@db:5432/oj"),
            "postgres://***@db:5432/oj"
        );
    }

    #[test]
    fn leaves_url_without_userinfo_unchanged() {
        assert_eq!(redact_url("http://sandbox:5050"), "http://sandbox:5050");
    }

    #[test]
    fn leaves_non_url_unchanged() {
        assert_eq!(redact_url("not-a-url"), "not-a-url");
    }
}
