use maud::{html, Markup};

pub mod error;
pub mod filters;

pub fn card(title: &str, body: Markup) -> Markup {
    html! {
        div class="card" {
            h2 { (title) }
            div class="card-body" {
                (body)
            }
        }
    }
}

/// Small pill with a count, hidden when zero.
pub fn badge(count: usize) -> Markup {
    html! {
        @if count > 0 {
            span class="badge" data-count=(count) { (count) }
        }
    }
}
