//! twig App - Counter demo
//!
//! Three views behind a hash router: a counter page whose button broadcasts
//! to two distant `count` subscribers, a test page echoing an optional slug,
//! and a custom not-found page.

use std::path::Path;

use anyhow::Context;
use twig_dom::{children, Document, Node, TagKind};
use twig_router::{Params, RouterConfig, Routes};

/// Demo application state
#[derive(Debug, Default)]
pub struct Counter {
    pub count: i32,
    pub likes: u32,
}

/// The counter page
pub fn home(doc: &Document<Counter>) -> Node<Counter> {
    doc.element(
        TagKind::Div,
        children![
            doc.element(
                TagKind::Div,
                children![
                    doc.reactive(TagKind::Div, |doc| {
                        children![format!("The Current Count is {}", doc.state().count)]
                    })
                    .scope("count"),
                    doc.reactive(TagKind::Button, |_| children!["Click Me"])
                        .handle_scoped(["count"], "click", |app: &mut Counter, _| app.count += 1),
                ],
            ),
            doc.element(
                TagKind::Div,
                children![
                    doc.element(TagKind::A, children!["click me to go to test"])
                        .attr("href", "#/test")
                ],
            )
            .class("red"),
            doc.reactive(TagKind::Div, |doc| {
                children![format!("Distant Count {}", doc.state().count)]
            })
            .scope("count"),
            doc.reactive(TagKind::Section, |doc| {
                let likes = doc.state().likes;
                children![
                    doc.element(TagKind::Span, children![format!("{likes} likes")]),
                    doc.element(TagKind::Button, children!["Like"])
                        .handle_local("click", |app: &mut Counter, _| app.likes += 1),
                ]
            }),
        ],
    )
}

/// Test page; `/test/:slug` shows the slug
pub fn test_page(doc: &Document<Counter>, params: &Params) -> Node<Counter> {
    let count = doc.state().count;
    let mut content = children![
        "test",
        doc.element(TagKind::A, children!["Nav to home"]).attr("href", "#/"),
        doc.element(TagKind::A, children!["Go to something unknown"]).attr("href", "#/unknown"),
        count.to_string(),
    ];
    if let Some(slug) = params.get("slug") {
        content.push(doc.element(TagKind::P, children![format!("slug: {slug}")]).into());
    }
    doc.element(TagKind::Div, content).class("flex")
}

/// Custom not-found page
pub fn not_found(doc: &Document<Counter>) -> Node<Counter> {
    doc.element(
        TagKind::Div,
        children![
            "This is what it would be like if there was a custom 404 page",
            doc.element(
                TagKind::Div,
                children![doc.element(TagKind::A, children!["Go home"]).attr("href", "#/")],
            ),
        ],
    )
}

/// Route table for the demo, keyed per `config`
pub fn routes(config: &RouterConfig) -> Routes<Counter> {
    let slug = format!("/test/{}slug", config.param_marker);
    Routes::<Counter>::new()
        .route("/", |doc, _| home(doc))
        .route("/test", test_page)
        .route(&slug, test_page)
        .route(&config.not_found_key, |doc, _| not_found(doc))
}

/// Read a router configuration from a JSON file; missing keys keep defaults
pub fn load_config(path: &Path) -> anyhow::Result<RouterConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
