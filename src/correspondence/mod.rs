//! Skeleton correspondence resolution between a character and a clothing rig.

pub use self::normalize::{laterality, normalize_name, split_tokens, Laterality};
pub use self::resolver::{
    BoneCorrespondence, CorrespondenceResolver, CorrespondenceTable, UnmappedBone,
};
pub use self::vocabulary::MatchVocabulary;

mod normalize;
mod resolver;
mod vocabulary;
