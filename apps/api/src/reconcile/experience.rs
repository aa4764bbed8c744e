//! Locates the text an experience suggestion refers to and rewrites it.
//!
//! Lookup order per entry:
//! 1. responsibility equal to / containing / contained in the original text
//! 2. best responsibility by token overlap (>= `MATCH_THRESHOLD`)
//! 3. the description: whole-text match, literal splice, then token overlap
//!    against the new text
//!
//! The first entry that changes ends the scan.

use tracing::debug;

use crate::models::resume::Experience;
use crate::reconcile::text::{loosely_equal, normalize, token_overlap, MATCH_THRESHOLD};

/// The edit to perform once a location is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Replace,
    Remove,
}

pub struct ExperienceEdit<'a> {
    pub original: &'a str,
    pub updated: &'a str,
    pub edit: Edit,
}

impl<'a> ExperienceEdit<'a> {
    /// Applies the edit to the first matching entry. Returns true if any entry changed.
    pub fn apply(&self, entries: &mut [Experience]) -> bool {
        let norm_original = normalize(self.original);
        let norm_updated = normalize(self.updated);

        for (index, entry) in entries.iter_mut().enumerate() {
            if self.apply_to_responsibilities(entry, &norm_original, &norm_updated) {
                debug!("Applied experience edit to responsibilities of entry {index}");
                return true;
            }
            if self.apply_to_description(entry, &norm_original, &norm_updated) {
                debug!("Applied experience edit to description of entry {index}");
                return true;
            }
        }
        false
    }

    fn apply_to_responsibilities(
        &self,
        entry: &mut Experience,
        norm_original: &str,
        norm_updated: &str,
    ) -> bool {
        let Some(responsibilities) = entry.responsibilities.as_mut() else {
            return false;
        };

        let normalized: Vec<String> = responsibilities.iter().map(|r| normalize(r)).collect();

        let index = normalized
            .iter()
            .position(|r| loosely_equal(r, norm_original))
            .or_else(|| {
                let target = if norm_original.is_empty() {
                    norm_updated
                } else {
                    norm_original
                };
                best_overlap(&normalized, target)
            });

        let Some(index) = index else {
            return false;
        };

        match self.edit {
            Edit::Remove => {
                responsibilities.remove(index);
            }
            Edit::Replace => {
                if !self.updated.is_empty() {
                    responsibilities[index] = self.updated.to_string();
                }
            }
        }
        true
    }

    fn apply_to_description(
        &self,
        entry: &mut Experience,
        norm_original: &str,
        norm_updated: &str,
    ) -> bool {
        let Some(description) = entry.description.as_mut().filter(|d| !d.is_empty()) else {
            return false;
        };
        let norm_description = normalize(description);

        if loosely_equal(&norm_description, norm_original) {
            self.rewrite_whole(description);
            return true;
        }

        if !self.original.is_empty() {
            if let Some(start) = description.find(self.original) {
                let end = start + self.original.len();
                let replacement = match self.edit {
                    Edit::Remove => "",
                    Edit::Replace => self.updated,
                };
                description.replace_range(start..end, replacement);
                return true;
            }
        }

        if !norm_updated.is_empty()
            && !norm_description.is_empty()
            && token_overlap(&norm_description, norm_updated) >= MATCH_THRESHOLD
        {
            self.rewrite_whole(description);
            return true;
        }

        false
    }

    fn rewrite_whole(&self, description: &mut String) {
        match self.edit {
            Edit::Remove => description.clear(),
            Edit::Replace => {
                if !self.updated.is_empty() {
                    *description = self.updated.to_string();
                }
            }
        }
    }
}

/// Index of the highest-scoring candidate, earliest on ties, if it clears the threshold.
fn best_overlap(candidates: &[String], target: &str) -> Option<usize> {
    if target.is_empty() {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let score = token_overlap(candidate, target);
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((i, score));
        }
    }
    best.filter(|(_, score)| *score >= MATCH_THRESHOLD)
        .map(|(i, score)| {
            debug!("Fuzzy matched responsibility {i} with score {score:.2}");
            i
        })
}
