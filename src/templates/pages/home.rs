// templates/pages/home.rs

use crate::templates::{components::card, desktop_layout};
use maud::{html, Markup};

pub fn home_page() -> Markup {
    desktop_layout(
        "Home",
        html! {
            main class="container" {
                h1 { "Find income properties that pay for themselves" }
                p { "Filter listings by cash flow, cap rate and return on cash, with your own mortgage terms." }

                a href="/properties" class="btn primary" { "Browse properties" }

                (card("How the numbers work", html! {
                    p {
                        "Each listing is run through a standard mortgage at your rate, amortization and down payment. "
                        "Cash flow is rent minus expenses minus the payment; cap rate and ROI follow from there."
                    }
                }))
            }
        },
    )
}
