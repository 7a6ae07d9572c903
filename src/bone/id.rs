use serde::{Deserialize, Serialize};

/// Index of a bone in a host scene graph.
///
/// Ids are handed out by the host in insertion order; a parent always has a
/// smaller id than its children in [`Skeleton`](super::Skeleton), which keeps
/// ancestor walks finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoneId(pub u32);

impl BoneId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Convert to array index
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bone#{}", self.0)
    }
}
