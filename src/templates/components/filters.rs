// templates/components/filters.rs
use maud::{html, Markup};

use crate::domain::filters::{FilterKey, FilterSpec, SortBy, SortOrder};
use crate::templates::components::badge;

const PROPERTIES_PATH: &str = "/properties";

/// One removable chip per active filter. Removing resets just that field.
pub fn active_filter_chips(applied: &FilterSpec) -> Markup {
    let active = applied.active_filters();
    html! {
        div class="filter-chips" {
            span class="filters-label" { "Filters " (badge(applied.active_filter_count())) }
            @for field in &active {
                @let key = field.key();
                a class="chip" href=(applied.without(key).to_href(PROPERTIES_PATH)) title="Remove filter" {
                    (key.label()) ": " (field.wire_value().unwrap_or_default()) " ×"
                }
            }
            @if !active.is_empty() {
                a class="chip chip-clear" href=(FilterSpec {
                    city: applied.city.clone(),
                    ..FilterSpec::default()
                }.to_href(PROPERTIES_PATH)) { "Clear all" }
            }
        }
    }
}

fn sort_label(sort_by: SortBy) -> &'static str {
    match sort_by {
        SortBy::CashFlow => "Cash flow",
        SortBy::CapRate => "Cap rate",
        SortBy::Price => "Price",
        SortBy::Roi => "ROI",
        SortBy::YearlyRoi => "Yearly ROI",
    }
}

pub fn sort_bar(applied: &FilterSpec) -> Markup {
    html! {
        div class="sort-bar" {
            "Sort: "
            @for sort_by in SortBy::VARIANTS {
                @let current = applied.sort_by == *sort_by;
                a class=(if current { "sort current" } else { "sort" })
                  href=(applied.select_sort(*sort_by).to_href(PROPERTIES_PATH)) {
                    (sort_label(*sort_by))
                    @if current {
                        @match applied.sort_order {
                            SortOrder::Asc => " ↑",
                            SortOrder::Desc => " ↓",
                        }
                    }
                }
            }
        }
    }
}

fn field_input(key: FilterKey, draft: &FilterSpec) -> Markup {
    let field = draft.get(key);
    let selected = field.choice_label().unwrap_or_default();
    html! {
        label class="filter-field" {
            span { (key.label()) }
            @if key.is_enumerated() {
                select name=(key.param()) {
                    @for choice in key.choices() {
                        option value=(choice) selected[choice == selected] { (choice) }
                    }
                }
            } @else {
                input type="text" name=(key.param()) value=(field.wire_value().unwrap_or_default());
            }
        }
    }
}

/// The draft editor. `applied` rides along so cancel can restore it.
pub fn filter_form(applied: &FilterSpec, draft: &FilterSpec) -> Markup {
    html! {
        form class="filter-form" method="post" action="/properties/filters" {
            input type="hidden" name="applied" value=(applied.to_query_string());
            div class="filter-grid" {
                @for key in FilterKey::ALL {
                    (field_input(key, draft))
                }
            }
            div class="filter-actions" {
                span { "Draft filters " (badge(draft.active_filter_count())) }
                button type="submit" name="intent" value="reset" { "Reset" }
                button type="submit" name="intent" value="cancel" { "Cancel" }
                button type="submit" name="intent" value="apply" class="primary" { "Apply" }
            }
        }
    }
}
