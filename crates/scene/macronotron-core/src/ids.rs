//! Identifiers for puppet members.

use serde::{Deserialize, Serialize};

/// Dense index of a member inside its puppet's arena.
/// Only meaningful for the puppet that handed it out.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub u32);

impl MemberId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(i: usize) -> Self {
        MemberId(i as u32)
    }
}
