//! The five matching passes pairing character bones with clothing bones.

use crate::correspondence::{laterality, normalize_name, MatchVocabulary};
use crate::math::Real;
use crate::scene::{NodeId, Transform};
use crate::skeleton::SkeletonSnapshot;
use hashbrown::HashSet;
use rstar::primitives::GeomWithData;
use rstar::RTree;

/// One row of the bone correspondence table.
///
/// Every entry has a character-side bone; a `None` clothing side means "no
/// equivalent found", not an error.
#[derive(Clone, Debug)]
pub struct BoneCorrespondence {
    /// The normalized character bone name.
    pub canonical_name: String,
    /// The character bone.
    pub character: NodeId,
    /// The paired clothing bone, if one was found.
    pub clothing: Option<NodeId>,
    /// `true` if this entry was added by hierarchical propagation rather
    /// than direct name matching.
    pub synthesized: bool,
}

/// A clothing bone no correspondence consumed, recorded relative to its
/// nearest mapped ancestor so it can be reconstructed after alignment.
#[derive(Clone, Debug)]
pub struct UnmappedBone {
    /// The unmatched clothing bone.
    pub node: NodeId,
    /// The nearest ancestor that does appear in the table.
    pub anchor: NodeId,
    /// This bone's pose relative to `anchor`, captured at resolution time.
    /// Stale as soon as the scene changes; apply exactly once, strictly
    /// after `anchor` has been aligned.
    pub local_offset: Transform,
}

/// The output of one resolution pass.
#[derive(Default, Debug)]
pub struct CorrespondenceTable {
    /// One entry per relevant character bone, in traversal order.
    pub entries: Vec<BoneCorrespondence>,
    /// Clothing bones unused by any entry.
    pub unmapped: Vec<UnmappedBone>,
}

/// Pairs two skeleton snapshots using name and pose heuristics.
///
/// The vocabulary is fixed at construction; resolution itself is pure and
/// deterministic for identical snapshots.
pub struct CorrespondenceResolver {
    vocab: MatchVocabulary,
}

const FUZZY_SUBSTRING: i32 = 40;
const FUZZY_ALIAS: i32 = 30;
const FUZZY_BODY_PART: i32 = 20;
const FUZZY_LATERALITY: i32 = 15;
const FUZZY_LATERALITY_CONFLICT: i32 = -50;

const SEMANTIC_BASE: i32 = 100;
const SEMANTIC_QUALIFIER_BONUS: i32 = 25;

/// Pre-extracted name features of one clothing bone.
struct ClothingFeatures {
    normalized: String,
    laterality: Option<super::Laterality>,
    body_part: Option<String>,
    alias_class: Option<usize>,
}

impl CorrespondenceResolver {
    /// Creates a resolver with the given matching vocabulary.
    pub fn new(vocab: MatchVocabulary) -> Self {
        CorrespondenceResolver { vocab }
    }

    /// The vocabulary this resolver matches with.
    pub fn vocabulary(&self) -> &MatchVocabulary {
        &self.vocab
    }

    /// Runs all matching passes over the two snapshots.
    ///
    /// An empty snapshot on either side yields an empty table.
    pub fn resolve(
        &self,
        character: &SkeletonSnapshot,
        clothing: &SkeletonSnapshot,
    ) -> CorrespondenceTable {
        if character.is_empty() || clothing.is_empty() {
            return CorrespondenceTable::default();
        }

        let features: Vec<ClothingFeatures> = clothing
            .records()
            .iter()
            .map(|rec| {
                let normalized = normalize_name(&rec.name);
                ClothingFeatures {
                    laterality: laterality(&rec.name),
                    body_part: self.vocab.body_part_of(&normalized).map(str::to_owned),
                    alias_class: self.vocab.alias_class_of(&normalized),
                    normalized,
                }
            })
            .collect();

        // Character bones the direct name passes consider, in capture order.
        let relevant: Vec<usize> = (0..character.len())
            .filter(|i| self.vocab.is_relevant(&character.record(*i).name))
            .collect();

        let mut paired: Vec<Option<usize>> = vec![None; character.len()];
        let mut used: HashSet<usize> = HashSet::new();

        // Pass 1: equal normalized names.
        for &ci in &relevant {
            let name = normalize_name(&character.record(ci).name);
            if let Some(found) = (0..features.len())
                .find(|i| !used.contains(i) && features[*i].normalized == name)
            {
                paired[ci] = Some(found);
                let _ = used.insert(found);
            }
        }

        // Pass 2: shared body part and laterality, scored.
        for &ci in &relevant {
            if paired[ci].is_some() {
                continue;
            }
            if let Some(found) = self.semantic_match(&character.record(ci).name, &features, &used) {
                paired[ci] = Some(found);
                let _ = used.insert(found);
            }
        }

        // Pass 3: fuzzy fallback over every remaining clothing bone.
        for &ci in &relevant {
            if paired[ci].is_some() {
                continue;
            }
            if let Some(found) = self.fuzzy_match(&character.record(ci).name, &features, &used) {
                paired[ci] = Some(found);
                let _ = used.insert(found);
            }
        }

        let mut entries: Vec<BoneCorrespondence> = relevant
            .iter()
            .map(|&ci| {
                let rec = character.record(ci);
                BoneCorrespondence {
                    canonical_name: normalize_name(&rec.name),
                    character: rec.node,
                    clothing: paired[ci].map(|i| clothing.record(i).node),
                    synthesized: false,
                }
            })
            .collect();

        // Pass 4: hierarchical propagation, computed into a side buffer and
        // merged afterwards so the entry list is never appended to while a
        // pass is still reading it.
        let propagated =
            self.propagate_important(character, clothing, &features, &paired, &mut used);
        entries.extend(propagated);

        // Pass 5: residual unmapped clothing bones.
        let unmapped = self.collect_unmapped(clothing, &entries);

        CorrespondenceTable { entries, unmapped }
    }

    fn semantic_match(
        &self,
        character_name: &str,
        features: &[ClothingFeatures],
        used: &HashSet<usize>,
    ) -> Option<usize> {
        let normalized = normalize_name(character_name);
        let side = laterality(character_name);
        let part = self.vocab.body_part_of(&normalized)?;

        let mut best: Option<(usize, i32)> = None;
        for (i, f) in features.iter().enumerate() {
            if used.contains(&i) {
                continue;
            }
            if f.body_part.as_deref() != Some(part) || f.laterality != side {
                continue;
            }

            let len_diff = (normalized.len() as i32 - f.normalized.len() as i32).abs();
            let score = SEMANTIC_BASE - len_diff
                + SEMANTIC_QUALIFIER_BONUS
                    * self.vocab.shared_qualifiers(&normalized, &f.normalized) as i32;

            // Strict `>` keeps the first-found candidate on ties.
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((i, score));
            }
        }

        best.map(|(i, _)| i)
    }

    fn fuzzy_match(
        &self,
        character_name: &str,
        features: &[ClothingFeatures],
        used: &HashSet<usize>,
    ) -> Option<usize> {
        let normalized = normalize_name(character_name);
        let side = laterality(character_name);
        let part = self.vocab.body_part_of(&normalized);
        let alias = self.vocab.alias_class_of(&normalized);

        let mut best: Option<(usize, i32)> = None;
        for (i, f) in features.iter().enumerate() {
            if used.contains(&i) {
                continue;
            }

            let mut score = 0;
            if normalized.contains(f.normalized.as_str())
                || f.normalized.contains(normalized.as_str())
            {
                score += FUZZY_SUBSTRING;
            }
            if alias.is_some() && alias == f.alias_class {
                score += FUZZY_ALIAS;
            }
            if part.is_some() && part.as_deref() == f.body_part.as_deref() {
                score += FUZZY_BODY_PART;
            }
            match (side, f.laterality) {
                (Some(a), Some(b)) if a == b => score += FUZZY_LATERALITY,
                (Some(_), Some(_)) => score += FUZZY_LATERALITY_CONFLICT,
                _ => {}
            }

            if score > 0 && best.is_none_or(|(_, b)| score > b) {
                best = Some((i, score));
            }
        }

        best.map(|(i, _)| i)
    }

    /// Walks the character hierarchy for important bones the name passes
    /// missed, resolving each through the paired parent's clothing children
    /// first and a bounded spatial search second.
    fn propagate_important(
        &self,
        character: &SkeletonSnapshot,
        clothing: &SkeletonSnapshot,
        features: &[ClothingFeatures],
        paired: &[Option<usize>],
        used: &mut HashSet<usize>,
    ) -> Vec<BoneCorrespondence> {
        let listed: HashSet<usize> = (0..character.len())
            .filter(|i| self.vocab.is_relevant(&character.record(*i).name))
            .collect();

        let tree: RTree<GeomWithData<[Real; 3], usize>> = RTree::bulk_load(
            clothing
                .records()
                .iter()
                .enumerate()
                .map(|(i, rec)| {
                    let t = rec.world.translation;
                    GeomWithData::new([t.x, t.y, t.z], i)
                })
                .collect(),
        );

        let mut extra = Vec::new();
        for ci in 0..character.len() {
            let rec = character.record(ci);
            if listed.contains(&ci) || !self.vocab.is_important(&rec.name) {
                continue;
            }

            let clothing_idx = self
                .match_under_paired_ancestor(ci, character, clothing, features, paired, used)
                .or_else(|| self.spatial_match(rec, &tree, clothing, used));

            if let Some(found) = clothing_idx {
                let _ = used.insert(found);
            }

            extra.push(BoneCorrespondence {
                canonical_name: normalize_name(&rec.name),
                character: rec.node,
                clothing: clothing_idx.map(|i| clothing.record(i).node),
                synthesized: true,
            });
        }

        extra
    }

    /// Looks for a plausible clothing bone among the children of the
    /// clothing bone paired with the nearest paired character ancestor.
    fn match_under_paired_ancestor(
        &self,
        ci: usize,
        character: &SkeletonSnapshot,
        clothing: &SkeletonSnapshot,
        features: &[ClothingFeatures],
        paired: &[Option<usize>],
        used: &HashSet<usize>,
    ) -> Option<usize> {
        let mut ancestor = character.record(ci).parent;
        let paired_clothing = loop {
            let a = ancestor?;
            if let Some(p) = paired[a] {
                break p;
            }
            ancestor = character.record(a).parent;
        };

        let name = normalize_name(&character.record(ci).name);
        let side = laterality(&character.record(ci).name);
        let part = self.vocab.body_part_of(&name).map(str::to_owned);

        let mut containment: Option<usize> = None;
        let mut by_part: Option<usize> = None;
        for &child in clothing.children_of(paired_clothing) {
            if used.contains(&child) {
                continue;
            }
            let f = &features[child];
            if f.normalized == name {
                return Some(child);
            }
            if containment.is_none()
                && (f.normalized.contains(name.as_str()) || name.contains(f.normalized.as_str()))
            {
                containment = Some(child);
            }
            if by_part.is_none()
                && part.is_some()
                && f.body_part == part
                && f.laterality == side
            {
                by_part = Some(child);
            }
        }

        containment.or(by_part)
    }

    /// Nearest unused clothing bone within the vocabulary's absolute search
    /// radius, so unrelated bones are never paired by distance alone.
    fn spatial_match(
        &self,
        rec: &crate::skeleton::BoneRecord,
        tree: &RTree<GeomWithData<[Real; 3], usize>>,
        clothing: &SkeletonSnapshot,
        used: &HashSet<usize>,
    ) -> Option<usize> {
        let t = rec.world.translation;
        let radius_sq = self.vocab.spatial_radius * self.vocab.spatial_radius;

        for candidate in tree.nearest_neighbor_iter(&[t.x, t.y, t.z]) {
            let idx = candidate.data;
            if used.contains(&idx) {
                continue;
            }
            let d = clothing.record(idx).world.translation - t;
            if d.norm_squared() > radius_sq {
                // Iteration is by increasing distance; past the radius
                // nothing closer is coming.
                return None;
            }
            return Some(idx);
        }
        None
    }

    /// Records every clothing bone unused by the table, and not a leaf
    /// render node, relative to its nearest used ancestor.
    fn collect_unmapped(
        &self,
        clothing: &SkeletonSnapshot,
        entries: &[BoneCorrespondence],
    ) -> Vec<UnmappedBone> {
        let used_nodes: HashSet<NodeId> = entries.iter().filter_map(|e| e.clothing).collect();

        let mut unmapped = Vec::new();
        for (i, rec) in clothing.records().iter().enumerate() {
            if used_nodes.contains(&rec.node) || (rec.has_mesh && clothing.children_of(i).is_empty())
            {
                continue;
            }

            let mut ancestor = rec.parent;
            let anchor = loop {
                match ancestor {
                    Some(a) => {
                        let a_rec = clothing.record(a);
                        if used_nodes.contains(&a_rec.node) {
                            break Some(a_rec);
                        }
                        ancestor = a_rec.parent;
                    }
                    None => break None,
                }
            };

            let Some(anchor) = anchor else {
                log::debug!(
                    "clothing bone `{}` has no mapped ancestor; leaving it untouched",
                    rec.name
                );
                continue;
            };

            unmapped.push(UnmappedBone {
                node: rec.node,
                anchor: anchor.node,
                local_offset: rec.world.relative_to(&anchor.world),
            });
        }

        unmapped
    }
}
