/// Replace `${ENV_VAR}` and `${ENV_VAR:-default}` placeholders in raw config
/// text.
///
/// Unresolvable variables without a default are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with a custom lookup, so it can be tested
/// without touching the process environment.
pub fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: emit the remainder literally.
            result.push_str(&rest[start..]);
            return result;
        };

        let placeholder = &after[..end];
        let (name, default) = match placeholder.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (placeholder, None),
        };

        match (name.is_empty(), lookup(name).filter(|v| !v.is_empty()), default) {
            (false, Some(value), _) => result.push_str(&value),
            (false, None, Some(default)) => result.push_str(default),
            _ => result.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn lookup(name: &str) -> Option<String> {
        match name {
            "TELEGRAM_BOT_TOKEN" => Some("123:ABC".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[rstest]
    #[case("token = \"${TELEGRAM_BOT_TOKEN}\"", "token = \"123:ABC\"")]
    #[case("${POSTRELAY_NONEXISTENT_XYZ}", "${POSTRELAY_NONEXISTENT_XYZ}")]
    #[case("${MISSING:-2500}", "2500")]
    #[case("${TELEGRAM_BOT_TOKEN:-fallback}", "123:ABC")]
    #[case("${EMPTY:-fallback}", "fallback")]
    #[case("${}", "${}")]
    #[case("a ${unterminated", "a ${unterminated")]
    #[case("plain text", "plain text")]
    #[case("$HOME {not} a placeholder", "$HOME {not} a placeholder")]
    fn substitution(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(substitute_env_with(input, lookup), expected);
    }

    #[test]
    fn multiple_placeholders_on_one_line() {
        assert_eq!(
            substitute_env_with("${A:-1},${TELEGRAM_BOT_TOKEN},${B:-2}", lookup),
            "1,123:ABC,2"
        );
    }
}
