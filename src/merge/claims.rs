//! Ownership of output directories.
//!
//! Two raw items can declare the same `base_id` (for example `rare_lamp` and
//! `rare_lamp_old` both publishing `rare_lamp*1`). Exactly one of them may
//! write `<out>/<base_id>/`. The owner is the item whose classname equals the
//! base id; otherwise the lexicographically smallest classname.

use std::collections::BTreeMap;

/// Resolved owner per base id.
#[derive(Debug, Clone, Default)]
pub struct Claims {
    owners: BTreeMap<String, String>,
}

impl Claims {
    /// Create an empty claim table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `classname` as a claimant of `base_id`.
    ///
    /// The result does not depend on registration order.
    pub fn claim(&mut self, base_id: &str, classname: &str) {
        match self.owners.get_mut(base_id) {
            Some(owner) => {
                if rank(base_id, classname) < rank(base_id, owner) {
                    *owner = classname.to_string();
                }
            }
            None => {
                self.owners.insert(base_id.to_string(), classname.to_string());
            }
        }
    }

    /// Owner of `base_id`, if anyone claimed it.
    pub fn owner(&self, base_id: &str) -> Option<&str> {
        self.owners.get(base_id).map(String::as_str)
    }

    /// Number of distinct base ids.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether no base id was claimed.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Claims {
    /// Build from `(base_id, classname)` pairs.
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut claims = Self::new();
        for (base_id, classname) in iter {
            claims.claim(base_id, classname);
        }
        claims
    }
}

// Exact match first, then classname order.
fn rank<'a>(base_id: &str, classname: &'a str) -> (bool, &'a str) {
    (classname != base_id, classname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_claim() {
        let claims: Claims = [("lamp", "lamp_old")].into_iter().collect();
        assert_eq!(claims.owner("lamp"), Some("lamp_old"));
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn test_exact_classname_wins() {
        let claims: Claims =
            [("lamp", "a_lamp"), ("lamp", "lamp"), ("lamp", "b_lamp")].into_iter().collect();
        assert_eq!(claims.owner("lamp"), Some("lamp"));
    }

    #[test]
    fn test_smallest_classname_wins() {
        let forward: Claims = [("lamp", "lamp_x"), ("lamp", "lamp_b")].into_iter().collect();
        let backward: Claims = [("lamp", "lamp_b"), ("lamp", "lamp_x")].into_iter().collect();
        assert_eq!(forward.owner("lamp"), Some("lamp_b"));
        assert_eq!(backward.owner("lamp"), Some("lamp_b"));
    }

    #[test]
    fn test_unclaimed() {
        let claims = Claims::new();
        assert!(claims.is_empty());
        assert_eq!(claims.owner("lamp"), None);
    }
}
