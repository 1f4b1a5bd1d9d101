use mac_address::get_mac_address;

/// Identifier derived from the first network interface, `MARS-<MAC>`.
pub fn get_device_mac() -> String {
    let mac = get_mac_address()
        .ok()
        .flatten()
        .map(|addr| {
            addr.bytes()
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<String>()
        })
        .unwrap_or_else(|| "UNKNOWN".to_string());
    format!("MARS-{}", mac)
}

/// Returns at most `max_chars` characters of `text`.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_prefix() {
        assert!(get_device_mac().starts_with("MARS-"));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("abcdef", 3), "abc");
        assert_eq!(preview("ab", 50), "ab");
        assert_eq!(preview("", 5), "");
    }
}
