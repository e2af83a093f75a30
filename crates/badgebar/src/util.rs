#[macro_export]
macro_rules! print_result_err {
    ($context:expr, $result:expr $(,)?) => {{
        if let Err(err) = $result {
            log::error!("[{}:{}] Error {}: {:?}", ::std::file!(), ::std::line!(), $context, err);
        }
    }};
}

#[macro_export]
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

/// Log an error chain at the top level of the process.
pub fn print_error(err: anyhow::Error) {
    if let Some(json_err) = err.downcast_ref::<serde_json::Error>() {
        log::error!("{:?}\n  (line {}, column {})", err, json_err.line(), json_err.column());
    } else {
        log::error!("{:?}", err);
    }
}

/// Cut `text` down to at most `max_bytes` bytes, without splitting a character.
pub fn truncate_to(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

/// Read a small sysfs-style file, with surrounding whitespace removed.
pub fn read_trimmed(path: impl AsRef<std::path::Path>) -> std::io::Result<String> {
    Ok(std::fs::read_to_string(path)?.trim().to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncate_to() {
        let mut text = "hello world".to_string();
        truncate_to(&mut text, 5);
        assert_eq!("hello", text);

        let mut text = "short".to_string();
        truncate_to(&mut text, 50);
        assert_eq!("short", text);

        // 'ä' is two bytes, cutting in its middle has to back off
        let mut text = "aä".to_string();
        truncate_to(&mut text, 2);
        assert_eq!("a", text);
    }
}
