//! Matching vocabulary injected into the correspondence resolver.

use crate::correspondence::normalize_name;
use crate::math::Real;

/// The keyword and alias tables driving name matching.
///
/// The vocabulary is immutable once constructed and passed to
/// [`CorrespondenceResolver::new`](crate::correspondence::CorrespondenceResolver::new),
/// so tests can substitute their own tables. All stored strings are in
/// normalized form.
#[derive(Clone, Debug)]
pub struct MatchVocabulary {
    /// Body-part buckets: a canonical token plus the probe substrings that
    /// select it.
    pub body_parts: Vec<(String, Vec<String>)>,
    /// Equivalence classes of interchangeable bone names
    /// (e.g. `"upperleg"` and `"thigh"`).
    pub aliases: Vec<Vec<String>>,
    /// Qualifier tokens scored as bonuses during semantic matching.
    pub qualifiers: Vec<String>,
    /// Substrings marking a bone as "important" for hierarchical
    /// propagation.
    pub important_keywords: Vec<String>,
    /// Exact (normalized) names that must never be dropped.
    pub critical_names: Vec<String>,
    /// Absolute world-space radius of the spatial nearest-neighbor fallback.
    pub spatial_radius: Real,
}

impl Default for MatchVocabulary {
    fn default() -> Self {
        Self::humanoid()
    }
}

impl MatchVocabulary {
    /// The built-in humanoid vocabulary.
    pub fn humanoid() -> Self {
        let parts = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        MatchVocabulary {
            body_parts: vec![
                ("leg".to_string(), parts(&["leg", "thigh", "shin", "calf", "knee"])),
                ("arm".to_string(), parts(&["arm", "elbow", "forearm"])),
                (
                    "hand".to_string(),
                    parts(&[
                        "hand", "wrist", "palm", "finger", "thumb", "index", "middle", "ring",
                        "pinky", "little",
                    ]),
                ),
                ("foot".to_string(), parts(&["foot", "ankle", "toe", "heel"])),
                (
                    "shoulder".to_string(),
                    parts(&["shoulder", "clavicle", "collar"]),
                ),
                (
                    "spine".to_string(),
                    parts(&["spine", "chest", "torso", "waist", "stomach"]),
                ),
                ("hips".to_string(), parts(&["hips", "hip", "pelvis"])),
                ("head".to_string(), parts(&["head", "neck", "skull", "eye", "jaw"])),
            ],
            aliases: vec![
                parts(&["upperleg", "thigh"]),
                parts(&["lowerleg", "shin", "calf"]),
                parts(&["lowerarm", "forearm"]),
                parts(&["hips", "pelvis"]),
                parts(&["chest", "upperchest"]),
                parts(&["shoulder", "clavicle", "collar"]),
            ],
            qualifiers: parts(&["upper", "lower", "fore", "inner", "outer", "end", "twist"]),
            important_keywords: parts(&["root", "twist", "breast", "tail", "ear"]),
            critical_names: Vec::new(),
            spatial_radius: 0.12,
        }
    }

    /// The canonical body-part token probed out of `normalized`, if any.
    pub fn body_part_of(&self, normalized: &str) -> Option<&str> {
        for (canonical, probes) in &self.body_parts {
            if probes.iter().any(|p| normalized.contains(p.as_str())) {
                return Some(canonical.as_str());
            }
        }
        None
    }

    /// Index of the alias equivalence class one of whose members occurs in
    /// `normalized`, if any.
    pub fn alias_class_of(&self, normalized: &str) -> Option<usize> {
        self.aliases
            .iter()
            .position(|class| class.iter().any(|a| normalized.contains(a.as_str())))
    }

    /// Number of qualifier tokens occurring in both names.
    pub fn shared_qualifiers(&self, normalized_a: &str, normalized_b: &str) -> usize {
        self.qualifiers
            .iter()
            .filter(|q| normalized_a.contains(q.as_str()) && normalized_b.contains(q.as_str()))
            .count()
    }

    /// Whether a bone matches the "important" predicate of the hierarchical
    /// propagation pass.
    pub fn is_important(&self, name: &str) -> bool {
        let normalized = normalize_name(name);
        self.critical_names.iter().any(|c| *c == normalized)
            || self
                .important_keywords
                .iter()
                .any(|k| normalized.contains(k.as_str()))
    }

    /// Whether a character bone matches the canonical skeleton vocabulary
    /// and is therefore considered by the direct name-matching passes.
    /// Important-but-unnamed bones are caught later by hierarchical
    /// propagation instead.
    pub fn is_relevant(&self, name: &str) -> bool {
        self.body_part_of(&normalize_name(name)).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_part_probes_aliases() {
        let vocab = MatchVocabulary::humanoid();
        assert_eq!(vocab.body_part_of("leftupperleg"), Some("leg"));
        assert_eq!(vocab.body_part_of("thighl"), Some("leg"));
        assert_eq!(vocab.body_part_of("prop01"), None);
    }

    #[test]
    fn alias_classes_join_equivalent_names() {
        let vocab = MatchVocabulary::humanoid();
        assert_eq!(
            vocab.alias_class_of("leftupperleg"),
            vocab.alias_class_of("thighl")
        );
        assert!(vocab.alias_class_of("head").is_none());
    }

    #[test]
    fn critical_names_count_as_important() {
        let mut vocab = MatchVocabulary::humanoid();
        assert!(!vocab.is_important("Prop_01"));
        vocab.critical_names.push("prop01".to_string());
        assert!(vocab.is_important("Prop_01"));
    }
}
