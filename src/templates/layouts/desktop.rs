// templates/layouts/desktop.rs
use maud::{html, Markup, DOCTYPE};

const STYLES: &str = "\
body { font-family: system-ui, sans-serif; margin: 0; color: #222; }\
header { display: flex; align-items: center; gap: 1rem; padding: 0.75rem 1.5rem; box-shadow: 0 1px 3px #0002; }\
header nav ul { display: flex; gap: 1rem; list-style: none; margin: 0; padding: 0; }\
.container { max-width: 1200px; margin: 0 auto; padding: 1.5rem; }\
.chip { display: inline-block; padding: 0.2rem 0.6rem; margin: 0.2rem; border-radius: 1rem; background: #eef; text-decoration: none; }\
.badge { background: #524ed2; color: #fff; border-radius: 1rem; padding: 0 0.5rem; font-size: 0.8rem; }\
.sort.current { font-weight: bold; }\
.filter-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(14rem, 1fr)); gap: 0.75rem; }\
.filter-field span { display: block; font-size: 0.85rem; color: #555; }\
table.results { border-collapse: collapse; width: 100%; }\
table.results td, table.results th { padding: 0.4rem 0.6rem; border-bottom: 1px solid #ddd; text-align: left; }\
";

pub fn desktop_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | Investor Portal" }
                style { (STYLES) }
            }
            body {
              header class="flex items-center justify-between px-6 py-3 shadow" {
                  svg
                      xmlns="http://www.w3.org/2000/svg"
                      width="24"
                      height="24"
                      viewBox="0 0 24 24"
                      fill="none"
                      stroke="#524ed2"
                      stroke-width="2"
                      stroke-linecap="round"
                      stroke-linejoin="round"
                      class="icon icon-tabler icon-tabler-building"
                  {
                      path stroke="none" d="M0 0h24v24H0z" fill="none" {}
                      path d="M3 21l18 0" {}
                      path d="M9 8l1 0" {}
                      path d="M9 12l1 0" {}
                      path d="M9 16l1 0" {}
                      path d="M14 8l1 0" {}
                      path d="M14 12l1 0" {}
                      path d="M14 16l1 0" {}
                      path d="M5 21v-16a2 2 0 0 1 2 -2h10a2 2 0 0 1 2 2v16" {}
                  }
                  h3 { "Investor Portal" }
                  nav {
                      ul {
                          li { a href="/" { "Home" } }
                          li { a href="/properties" { "Properties" } }
                      }
                  }
              }
                (content)
            }
        }
    }
}
