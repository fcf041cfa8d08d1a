pub fn cache_key(parts: &[&str]) -> String {
    let mut combined = String::new();
    for part in parts {
        combined.push_str(part);
        combined.push('\u{1f}');
    }
    format!("{:x}", md5::compute(combined.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_keeps_part_boundaries() {
        assert_ne!(cache_key(&["ab", "c"]), cache_key(&["a", "bc"]));
        assert_eq!(cache_key(&["x", "y"]), cache_key(&["x", "y"]));
    }
}
