// templates/pages/properties.rs
use maud::{html, Markup};

use crate::domain::filters::FilterSpec;
use crate::domain::search::SearchResult;
use crate::templates::components::filters::{active_filter_chips, filter_form, sort_bar};
use crate::templates::desktop_layout;

pub struct PropertiesVm<'a> {
    pub applied: &'a FilterSpec,
    /// Present while the filter editor is open.
    pub draft: Option<&'a FilterSpec>,
    pub results: &'a [SearchResult],
}

fn money(v: f64) -> String {
    let rounded = v.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn pct(v: f64) -> String {
    format!("{v:.2}%")
}

pub fn properties_page(vm: &PropertiesVm<'_>) -> Markup {
    let city = vm.applied.city.clone().unwrap_or_default();
    desktop_layout(
        "Properties",
        html! {
            main class="container" {
                h1 { "Properties" }

                form class="search-bar" method="get" action="/properties" {
                    @for (name, value) in vm.applied.without(crate::domain::filters::FilterKey::City).to_query_pairs() {
                        input type="hidden" name=(name) value=(value);
                    }
                    input type="search" name="city" placeholder="City" value=(city);
                    button type="submit" { "Search" }
                }

                (active_filter_chips(vm.applied))
                (sort_bar(vm.applied))

                @match vm.draft {
                    Some(draft) => (filter_form(vm.applied, draft)),
                    None => {
                        @let edit_href = format!("/properties?{}", edit_query(vm.applied));
                        a class="btn" href=(edit_href) { "Edit filters" }
                    }
                }

                p class="result-count" { (vm.results.len()) " properties" }

                div style="overflow-x: auto;" {
                    table class="results" {
                        thead {
                            tr {
                                th { "Property" }
                                th { "City" }
                                th { "Price" }
                                th { "Units" }
                                th { "Cash flow / mo" }
                                th { "Cap rate" }
                                th { "ROI" }
                                th { "Yearly ROI" }
                                th { "DSR" }
                            }
                        }
                        tbody {
                            @for r in vm.results {
                                tr {
                                    td { strong { (r.property.title) } br; small { (r.property.address_line) } }
                                    td { (r.property.city) ", " (r.property.province) }
                                    td { (money(r.property.price)) }
                                    td { (r.property.units) }
                                    td { (money(r.metrics.monthly_cash_flow)) }
                                    td { (pct(r.metrics.cap_rate)) }
                                    td { (pct(r.metrics.roi)) }
                                    td { (pct(r.metrics.yearly_roi)) }
                                    td {
                                        @match r.metrics.debt_service_ratio {
                                            Some(dsr) => (format!("{dsr:.2}")),
                                            None => "n/a",
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

/// Query that reopens the page with the editor showing.
pub fn edit_query(applied: &FilterSpec) -> String {
    let query = applied.to_query_string();
    if query.is_empty() {
        "edit=1".to_string()
    } else {
        format!("{query}&edit=1")
    }
}
