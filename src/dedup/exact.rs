//! Stage 1: collapse records whose normalized `(url, title)` keys are equal.

use crate::models::DigestRecord;
use crate::normalize::NormalizedKey;
use std::collections::HashMap;

/// Hash key for stage-1 grouping.
///
/// A record without a URL still carries its title in the full key, so it
/// groups with other URL-less records of the same title. A record with no
/// signal at all keys on its own identity and stays alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Normalized(NormalizedKey),
    Record(usize),
}

impl GroupKey {
    fn of(record: &DigestRecord) -> Self {
        if record.key.is_empty() {
            GroupKey::Record(record.index)
        } else {
            GroupKey::Normalized(record.key.clone())
        }
    }
}

/// Records sharing one key, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactGroup {
    pub members: Vec<DigestRecord>,
}

impl ExactGroup {
    /// The earliest member; clustering compares groups through it.
    pub fn first(&self) -> &DigestRecord {
        &self.members[0]
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.members.len()
    }
}

/// Group records by key in one pass. Groups are ordered by the arrival of
/// their first member and never empty.
pub fn group_exact(records: Vec<DigestRecord>) -> Vec<ExactGroup> {
    let mut slots: HashMap<GroupKey, usize> = HashMap::with_capacity(records.len());
    let mut groups: Vec<ExactGroup> = Vec::new();

    for record in records {
        let key = GroupKey::of(&record);
        match slots.get(&key) {
            Some(&slot) => groups[slot].members.push(record),
            None => {
                slots.insert(key, groups.len());
                groups.push(ExactGroup {
                    members: vec![record],
                });
            }
        }
    }
    groups
}
