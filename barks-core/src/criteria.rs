//! Criteria sets and the per-decision category marks.
//!
//! A [`CriteriaSet`] is the bag of contextual tags handed to the concept
//! resolver together with a concept. It only ever grows: keys may repeat and
//! the last appended value wins at resolution time.
//!
//! [`CategoryMarks`] is the dirty-flag half of the composition protocol.
//! Every routine that contributes a semantic category marks it first, and
//! secondary contributors check the mark before appending. The marks never
//! deduplicate on their own; they only expose the primitive.

use std::fmt;

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Criteria Set
// ---------------------------------------------------------------------------

/// Ordered, append-only key/value tags for one decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaSet {
    entries: Vec<(String, String)>,
}

impl CriteriaSet {
    /// Empty criteria set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag. Existing tags with the same key are kept.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// The effective value for `key`: the last one appended.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether any tag with `key` was appended.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// How many times `key` was appended.
    #[must_use]
    pub fn count_key(&self, key: &str) -> usize {
        self.entries.iter().filter(|(k, _)| k == key).count()
    }

    /// All tags in append order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of appended tags (including repeats).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every tag of `other`, in order.
    pub fn extend_from(&mut self, other: &Self) {
        self.entries.extend(other.entries.iter().cloned());
    }
}

impl fmt::Display for CriteriaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{k}:{v}")?;
            first = false;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Category Marks
// ---------------------------------------------------------------------------

bitflags! {
    /// Semantic categories of criteria that may be contributed at most once
    /// per decision.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SpeechCategoryFlags: u8 {
        /// Damage amount, type and hit group.
        const DAMAGE        = 1 << 0;
        /// Enemy identity, distance and visibility.
        const ENEMY         = 1 << 1;
        /// Squad size.
        const SQUAD         = 1 << 2;
        /// Weapon class.
        const WEAPON        = 1 << 3;
        /// Who the line is addressed to.
        const SPEECH_TARGET = 1 << 4;
    }
}

/// Dirty flags for one decision, plus a count of how often each category
/// was marked so tests can prove exclusivity.
#[derive(Debug, Clone, Default)]
pub struct CategoryMarks {
    flags: SpeechCategoryFlags,
    marks: [u8; 5],
}

impl CategoryMarks {
    /// No categories marked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `category` as contributed. Returns `true` if it was not yet marked.
    pub fn mark(&mut self, category: SpeechCategoryFlags) -> bool {
        let fresh = !self.flags.contains(category);
        self.flags.insert(category);
        for (i, flag) in SpeechCategoryFlags::all().iter().enumerate() {
            if category.contains(flag) {
                self.marks[i] = self.marks[i].saturating_add(1);
            }
        }
        fresh
    }

    /// Whether `category` was already contributed this decision.
    #[must_use]
    pub fn is_marked(&self, category: SpeechCategoryFlags) -> bool {
        self.flags.contains(category)
    }

    /// Clear everything for a new decision.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The raw flag set.
    #[must_use]
    pub fn flags(&self) -> SpeechCategoryFlags {
        self.flags
    }

    /// How many times `category` was marked since the last reset. More than
    /// one means two contributors both appended it.
    #[must_use]
    pub fn times_marked(&self, category: SpeechCategoryFlags) -> u8 {
        SpeechCategoryFlags::all()
            .iter()
            .enumerate()
            .filter(|(_, flag)| category.contains(*flag))
            .map(|(i, _)| self.marks[i])
            .max()
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Decision scratch
// ---------------------------------------------------------------------------

/// Scratch state for a single speech decision: the criteria being built and
/// the categories already contributed. Created fresh per attempt, so marks
/// are reset at the start of every decision.
#[derive(Debug, Clone, Default)]
pub struct Decision {
    /// Criteria accumulated so far.
    pub criteria: CriteriaSet,
    /// Categories already contributed.
    pub marks: CategoryMarks,
}

impl Decision {
    /// A fresh decision.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag that belongs to no category.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.criteria.append(key, value);
    }

    /// Mark `category`, and report whether the caller is the first contributor.
    pub fn claim(&mut self, category: SpeechCategoryFlags) -> bool {
        self.marks.mark(category)
    }

    /// Whether `category` was already contributed.
    #[must_use]
    pub fn has(&self, category: SpeechCategoryFlags) -> bool {
        self.marks.is_marked(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_append_wins() {
        let mut c = CriteriaSet::new();
        c.append("enemy", "npc_zombie");
        c.append("enemy", "npc_combine");
        assert_eq!(c.get("enemy"), Some("npc_combine"));
        assert_eq!(c.count_key("enemy"), 2);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn display_is_ordered() {
        let mut c = CriteriaSet::new();
        c.append("a", "1");
        c.append("b", "2");
        assert_eq!(c.to_string(), "a:1,b:2");
    }

    #[test]
    fn mark_reports_first_contributor() {
        let mut marks = CategoryMarks::new();
        assert!(!marks.is_marked(SpeechCategoryFlags::ENEMY));
        assert!(marks.mark(SpeechCategoryFlags::ENEMY));
        assert!(!marks.mark(SpeechCategoryFlags::ENEMY));
        assert_eq!(marks.times_marked(SpeechCategoryFlags::ENEMY), 2);
        assert_eq!(marks.times_marked(SpeechCategoryFlags::SQUAD), 0);
    }

    #[test]
    fn reset_clears_marks_and_counts() {
        let mut marks = CategoryMarks::new();
        marks.mark(SpeechCategoryFlags::DAMAGE);
        marks.reset();
        assert!(!marks.is_marked(SpeechCategoryFlags::DAMAGE));
        assert_eq!(marks.times_marked(SpeechCategoryFlags::DAMAGE), 0);
    }

    #[test]
    fn fresh_decision_has_no_marks() {
        let mut d = Decision::new();
        assert!(d.claim(SpeechCategoryFlags::WEAPON));
        let d2 = Decision::new();
        assert!(!d2.has(SpeechCategoryFlags::WEAPON));
        assert!(d.has(SpeechCategoryFlags::WEAPON));
    }
}
