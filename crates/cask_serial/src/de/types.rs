//! Parsing of the composite type names written for arrays and maps.

/// `T[]` to `T`.
pub(super) fn array_element(static_type: &str) -> Option<&str> {
    static_type.strip_suffix("[]")
}

/// `map<K,V>` to `(K, V)`, splitting on the comma outside any nested `<>`.
pub(super) fn map_parts(static_type: &str) -> Option<(&str, &str)> {
    let inner = static_type.strip_prefix("map<")?.strip_suffix('>')?;
    let mut depth = 0_usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some((inner[..i].trim(), inner[i + 1..].trim())),
            _ => {}
        }
    }
    None
}

// -----------------------------------------------------------------------------
// Tests
