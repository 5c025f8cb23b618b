/// Canonicalize a free-form ticker string to vendor form: uppercase,
/// `[A-Z0-9-]` only, leading `$` stripped, dots converted to hyphens
/// (class shares, e.g. `brk.b` -> `BRK-B`).
///
/// Inputs that reduce to nothing after filtering yield an empty string;
/// callers drop those.
pub fn normalize_symbol(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('$');
    trimmed
        .chars()
        .map(|c| if c == '.' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_uppercase()
}
