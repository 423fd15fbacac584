//! Keyframe bracketing for a query frame.
//!
//! Model:
//! - `prev` is the keyframe with the greatest index <= F.
//! - `next` is the keyframe with the smallest index > F.
//! - With both present, `t = (F - prev) / (next - prev)` clamped to [0, 1].
//!
//! Step channels (variants) also need to look further back than `prev`; see
//! [`carried_back`].

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use crate::data::Keyframe;

/// The keyframes surrounding a query frame.
#[derive(Clone, Copy, Debug)]
pub enum Bracket<'a> {
    /// No keyframes at all.
    Empty,
    /// F precedes every keyframe.
    Before { next: &'a Keyframe },
    /// F is at or after the last keyframe.
    Hold { prev: &'a Keyframe },
    Between {
        prev: &'a Keyframe,
        next: &'a Keyframe,
        t: f64,
    },
}

impl<'a> Bracket<'a> {
    pub fn prev(&self) -> Option<&'a Keyframe> {
        match *self {
            Bracket::Hold { prev } | Bracket::Between { prev, .. } => Some(prev),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<&'a Keyframe> {
        match *self {
            Bracket::Before { next } | Bracket::Between { next, .. } => Some(next),
            _ => None,
        }
    }

    /// Keyframe whose values apply directly when no blending happens.
    pub fn governing(&self) -> Option<&'a Keyframe> {
        self.prev().or_else(|| self.next())
    }
}

/// Locate `prev`/`next` for `frame`.
pub fn find_bracket(keyframes: &BTreeMap<u32, Keyframe>, frame: u32) -> Bracket<'_> {
    let prev = keyframes.range(..=frame).next_back().map(|(_, k)| k);
    let next = keyframes
        .range((Excluded(frame), Unbounded))
        .next()
        .map(|(_, k)| k);
    match (prev, next) {
        (None, None) => Bracket::Empty,
        (None, Some(next)) => Bracket::Before { next },
        (Some(prev), None) => Bracket::Hold { prev },
        (Some(prev), Some(next)) => {
            let span = f64::from(next.index - prev.index);
            let t = (f64::from(frame - prev.index) / span).clamp(0.0, 1.0);
            Bracket::Between { prev, next, t }
        }
    }
}

/// Latest value of a step channel at or before `frame`, scanning backwards
/// through keyframes and skipping those that did not record one.
pub fn carried_back<'a, T, F>(
    keyframes: &'a BTreeMap<u32, Keyframe>,
    frame: u32,
    mut pick: F,
) -> Option<&'a T>
where
    F: FnMut(&'a Keyframe) -> Option<&'a T>,
    T: ?Sized,
{
    keyframes
        .range(..=frame)
        .rev()
        .find_map(|(_, kf)| pick(kf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(indices: &[u32]) -> BTreeMap<u32, Keyframe> {
        indices.iter().map(|&i| (i, Keyframe::new(i))).collect()
    }

    #[test]
    fn empty_store() {
        assert!(matches!(find_bracket(&BTreeMap::new(), 3), Bracket::Empty));
    }

    #[test]
    fn before_between_and_hold() {
        let kfs = store(&[10, 20]);
        match find_bracket(&kfs, 4) {
            Bracket::Before { next } => assert_eq!(next.index, 10),
            other => panic!("unexpected {other:?}"),
        }
        match find_bracket(&kfs, 15) {
            Bracket::Between { prev, next, t } => {
                assert_eq!((prev.index, next.index), (10, 20));
                assert_eq!(t, 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
        // Landing exactly on a keyframe makes it `prev` with t = 0.
        match find_bracket(&kfs, 10) {
            Bracket::Between { prev, t, .. } => {
                assert_eq!(prev.index, 10);
                assert_eq!(t, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        match find_bracket(&kfs, 20) {
            Bracket::Hold { prev } => assert_eq!(prev.index, 20),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn carried_back_skips_gaps() {
        let mut kfs = store(&[0, 5, 9]);
        kfs.get_mut(&0).unwrap().member_mut("p", "main").variant = Some("open".into());
        let found = carried_back(&kfs, 9, |kf| {
            kf.member("p", "main").and_then(|m| m.variant.as_deref())
        });
        assert_eq!(found, Some("open"));
        let none = carried_back(&kfs, 9, |kf| {
            kf.member("p", "pied").and_then(|m| m.variant.as_deref())
        });
        assert_eq!(none, None);
    }
}
