//! `CodePointSet`: a sorted, de-duplicated set of Unicode scalar values (spec §3).

use std::collections::BTreeSet;

/// The compiler only ever reasons about code points in the Basic Multilingual
/// Plane -- see the BMP-only design note in SPEC_FULL.md §9. Surrogate pairs
/// encountered while scanning rule text are skipped rather than decoded.
pub const BMP_MAX: u32 = 0xFFFF;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodePointSet(BTreeSet<u32>);

impl CodePointSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn from_char(ch: char) -> Self {
        let mut s = BTreeSet::new();
        s.insert(ch as u32);
        Self(s)
    }

    pub fn from_range(lo: char, hi: char) -> Self {
        let (lo, hi) = (lo as u32, hi as u32);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Self((lo..=hi).collect())
    }

    /// The full Basic Multilingual Plane -- the initial ambient filter (spec §3).
    pub fn full_bmp() -> Self {
        Self((0..=BMP_MAX).collect())
    }

    pub fn insert(&mut self, cp: u32) {
        self.0.insert(cp);
    }

    pub fn insert_char(&mut self, ch: char) {
        self.0.insert(ch as u32);
    }

    pub fn contains(&self, cp: u32) -> bool {
        self.0.contains(&cp)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).copied().collect())
    }

    pub fn union_with(&mut self, other: &Self) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).copied().collect())
    }

    /// `filter \ self`, used for the `[^X]` negation form (spec §4.C step 5).
    pub fn complement_within(&self, filter: &Self) -> Self {
        filter.difference(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().filter_map(|&cp| char::from_u32(cp))
    }

    pub fn as_sorted_vec(&self) -> Vec<u32> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<u32> for CodePointSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<char> for CodePointSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self(iter.into_iter().map(|c| c as u32).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive() {
        let s = CodePointSet::from_range('a', 'c');
        assert_eq!(s.as_sorted_vec(), vec!['a' as u32, 'b' as u32, 'c' as u32]);
    }

    #[test]
    fn union_is_commutative() {
        let a = CodePointSet::from_range('a', 'c');
        let b = CodePointSet::from_range('b', 'd');
        assert_eq!(a.union(&b), b.union(&a));
    }

    #[test]
    fn intersection_is_subset_of_either_operand() {
        let a = CodePointSet::from_range('a', 'f');
        let b = CodePointSet::from_range('d', 'z');
        let i = a.intersection(&b);
        assert!(i.iter().all(|c| a.contains(c)));
        assert!(i.iter().all(|c| b.contains(c)));
    }

    #[test]
    fn difference_excludes_subtrahend() {
        let a = CodePointSet::from_range('a', 'f');
        let b = CodePointSet::from_range('d', 'z');
        let d = a.difference(&b);
        assert!(d.iter().all(|c| !b.contains(c)));
    }
}
