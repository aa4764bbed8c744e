//! Suggestion Reconciler: merges a free-form suggestion into a structured résumé.
//!
//! Suggestions come from a text generator and rarely quote the résumé
//! verbatim, so experience edits go through normalize → exact/substring →
//! token-overlap matching (see `experience`). A miss is never an error: the
//! document is left as it was and the miss is logged.

pub mod experience;
pub mod text;

use tracing::{debug, warn};

use crate::models::resume::{ResumeDocument, Skill};
use crate::models::suggestion::{Suggestion, SuggestionAction, SuggestionKind};
use crate::reconcile::experience::{Edit, ExperienceEdit};

/// Applies `suggestion` to `curated` in place.
/// Returns true if a target was found and the document changed.
pub fn apply(curated: &mut ResumeDocument, suggestion: &Suggestion) -> bool {
    let applied = match (suggestion.kind, suggestion.action) {
        (SuggestionKind::Skill, SuggestionAction::Add) => add_skill(curated, &suggestion.new_text),
        (SuggestionKind::Skill, SuggestionAction::Remove) => {
            remove_skill(curated, &suggestion.original_text)
        }
        (SuggestionKind::Summary, action) if action.is_edit() => {
            debug!("Replacing curated summary");
            curated.summary = Some(suggestion.new_text.clone());
            true
        }
        (SuggestionKind::Experience, action)
            if action.is_edit() || action == SuggestionAction::Remove =>
        {
            let edit = if action == SuggestionAction::Remove {
                Edit::Remove
            } else {
                Edit::Replace
            };
            ExperienceEdit {
                original: &suggestion.original_text,
                updated: &suggestion.new_text,
                edit,
            }
            .apply(&mut curated.experience)
        }
        (kind, action) => {
            warn!("Unsupported suggestion {kind:?}/{action:?}; skipping");
            return false;
        }
    };

    if !applied {
        let text = if suggestion.original_text.is_empty() {
            &suggestion.new_text
        } else {
            &suggestion.original_text
        };
        warn!(
            "No change for {:?}/{:?} suggestion: {text:?}",
            suggestion.kind, suggestion.action
        );
    }
    applied
}

fn add_skill(doc: &mut ResumeDocument, name: &str) -> bool {
    if name.is_empty() || doc.has_skill(name) {
        return false;
    }
    debug!("Adding skill {name:?}");
    doc.skills.push(Skill::named(name));
    true
}

fn remove_skill(doc: &mut ResumeDocument, name: &str) -> bool {
    let target = name.to_lowercase();
    let before = doc.skills.len();
    doc.skills.retain(|s| s.name.to_lowercase() != target);
    let removed = before - doc.skills.len();
    if removed > 0 {
        debug!("Removed {removed} skill(s) matching {name:?}");
    }
    removed > 0
}
