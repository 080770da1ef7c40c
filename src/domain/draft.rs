// src/domain/draft.rs

use crate::domain::filters::{FilterField, FilterSpec};

/// The applied filter specification and its scratch draft.
///
/// Every transition consumes the session and returns the next one, so the
/// two values are never mutated behind a caller's back.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSession {
    applied: FilterSpec,
    draft: FilterSpec,
    editing: bool,
}

impl FilterSession {
    pub fn new(applied: FilterSpec) -> Self {
        Self {
            draft: applied.clone(),
            applied,
            editing: false,
        }
    }

    pub fn applied(&self) -> &FilterSpec {
        &self.applied
    }

    pub fn draft(&self) -> &FilterSpec {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Show the editing surface. The draft is always re-copied from the
    /// applied value, discarding whatever was there.
    pub fn open_draft(self) -> Self {
        Self {
            draft: self.applied.clone(),
            applied: self.applied,
            editing: true,
        }
    }

    pub fn set_draft_field(self, field: FilterField) -> Self {
        Self {
            draft: self.draft.with(field),
            ..self
        }
    }

    /// Clear all: the draft becomes the canonical default, not the applied value.
    pub fn reset_draft(self) -> Self {
        Self {
            draft: FilterSpec::default(),
            ..self
        }
    }

    /// Commit the draft. `search` runs with the newly applied value.
    pub fn apply_draft<F>(self, search: F) -> Self
    where
        F: FnOnce(&FilterSpec),
    {
        let applied = self.draft;
        search(&applied);
        Self {
            draft: applied.clone(),
            applied,
            editing: false,
        }
    }

    /// Discard the draft and close the surface. No search is triggered.
    pub fn cancel_draft(self) -> Self {
        Self {
            draft: self.applied.clone(),
            applied: self.applied,
            editing: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::{FilterKey, IncomeType, SortBy};

    fn applied() -> FilterSpec {
        FilterSpec::default()
            .with(FilterField::PriceMax(Some(500_000.0)))
            .with(FilterField::IncomeType(IncomeType::Actual))
    }

    #[test]
    fn open_copies_applied_into_draft() {
        let session = FilterSession::new(applied()).open_draft();
        assert!(session.is_editing());
        assert_eq!(session.draft(), session.applied());
    }

    #[test]
    fn reopening_discards_stale_draft() {
        let session = FilterSession::new(applied())
            .open_draft()
            .set_draft_field(FilterField::RoiMin(Some(9.0)))
            .cancel_draft()
            .open_draft();

        assert_eq!(session.draft().roi_min, None);
        assert_eq!(session.draft(), &applied());
    }

    #[test]
    fn edits_touch_only_the_draft() {
        let session = FilterSession::new(applied())
            .open_draft()
            .set_draft_field(FilterField::UnitsMin(Some(3)));

        assert_eq!(session.draft().units_min, Some(3));
        assert_eq!(session.applied().units_min, None);
    }

    #[test]
    fn reset_yields_default_not_applied() {
        let session = FilterSession::new(applied()).open_draft().reset_draft();

        assert_eq!(session.draft(), &FilterSpec::default());
        assert_eq!(session.draft().active_filter_count(), 0);
        assert_eq!(session.applied(), &applied());
        assert!(session.is_editing());
    }

    #[test]
    fn apply_searches_with_new_value_and_closes() {
        let mut searched = Vec::new();
        let session = FilterSession::new(applied())
            .open_draft()
            .set_draft_field(FilterField::SortBy(SortBy::Price))
            .apply_draft(|spec| searched.push(spec.clone()));

        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].sort_by, SortBy::Price);
        assert_eq!(session.applied(), &searched[0]);
        assert!(!session.is_editing());
    }

    #[test]
    fn cancel_keeps_applied_and_closes() {
        let session = FilterSession::new(applied())
            .open_draft()
            .set_draft_field(FilterField::City(Some("Moncton".into())))
            .cancel_draft();

        assert_eq!(session.applied(), &applied());
        assert_eq!(session.draft(), &applied());
        assert!(!session.is_editing());
    }

    #[test]
    fn active_count_agrees_between_draft_and_applied() {
        let session = FilterSession::new(applied())
            .open_draft()
            .set_draft_field(FilterField::IncomeType(IncomeType::Actual));

        assert_eq!(
            session.draft().active_filter_count(),
            session.applied().active_filter_count()
        );
        let session = session.set_draft_field(FilterField::cleared(FilterKey::PriceMax));
        assert_eq!(session.draft().active_filter_count(), 1);
    }
}
