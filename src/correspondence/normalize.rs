//! Bone name normalization and token extraction.

/// Left/right designation inferred from name tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Laterality {
    /// The bone belongs to the left side of the body.
    Left,
    /// The bone belongs to the right side of the body.
    Right,
}

const SEPARATORS: [char; 4] = ['.', '_', ' ', '-'];

/// Canonical form of a bone name: case-folded, with separator characters
/// collapsed away, so `"Upper_Leg.L"` and `"UpperLeg_L"` normalize equal.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !SEPARATORS.contains(c))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Splits a bone name into lowercase tokens at separator characters and
/// camelCase boundaries: `"LeftUpperLeg"` becomes `["left", "upper", "leg"]`.
pub fn split_tokens(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in name.chars() {
        if SEPARATORS.contains(&c) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }

        if c.is_uppercase() && prev_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }

        prev_lower = c.is_lowercase() || c.is_numeric();
        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Infers the left/right designation of a bone name, if any.
///
/// Probes whole tokens (`"left"`, `"l"`, `"right"`, `"r"`) rather than raw
/// substrings so that, e.g., `"ring"` does not read as right-handed.
pub fn laterality(name: &str) -> Option<Laterality> {
    for token in split_tokens(name) {
        match token.as_str() {
            "left" | "l" => return Some(Laterality::Left),
            "right" | "r" => return Some(Laterality::Right),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_styles_normalize_equal() {
        assert_eq!(normalize_name("Upper_Leg.L"), normalize_name("UpperLeg_L"));
        assert_eq!(normalize_name("spine 01"), "spine01");
    }

    #[test]
    fn camel_case_splits_into_tokens() {
        assert_eq!(split_tokens("LeftUpperLeg"), vec!["left", "upper", "leg"]);
        assert_eq!(split_tokens("upper_leg.L"), vec!["upper", "leg", "l"]);
    }

    #[test]
    fn laterality_requires_whole_tokens() {
        assert_eq!(laterality("LeftUpperLeg"), Some(Laterality::Left));
        assert_eq!(laterality("upper_leg.R"), Some(Laterality::Right));
        assert_eq!(laterality("RingFinger"), None);
        assert_eq!(laterality("Spine"), None);
    }
}
