//! Integration tests - counter page built from plain and reactive nodes
//!
//! Exercises construction, scoped broadcast and local reaction together on
//! the headless surface.

use twig_dom::{children, Child, Document, HeadlessSurface, Reactive, TagKind};

#[derive(Default)]
struct App {
    count: i32,
    likes: u32,
}

fn page(doc: &Document<App>) -> twig_dom::Node<App> {
    doc.element(
        TagKind::Div,
        children![
            doc.element(
                TagKind::Div,
                vec![Child::thunk(|doc: &Document<App>| {
                    children![
                        doc.reactive(TagKind::Div, |doc| {
                            children![format!("The Current Count is {}", doc.state().count)]
                        })
                        .scope("count"),
                        doc.reactive(TagKind::Button, |_| children!["Click Me"])
                            .handle_scoped(["count"], "click", |app: &mut App, _| app.count += 1),
                    ]
                })],
            ),
            doc.element(
                TagKind::Div,
                children![doc.element(TagKind::A, children!["to test"]).attr("href", "#/test")],
            )
            .class("red"),
            doc.reactive(TagKind::Div, |doc| {
                children![format!("Distant Count {}", doc.state().count)]
            })
            .scope("count"),
            likes(doc),
        ],
    )
}

fn likes(doc: &Document<App>) -> Reactive<App> {
    doc.reactive(TagKind::Section, |doc| {
        let likes = doc.state().likes;
        children![
            doc.element(TagKind::Span, children![format!("{likes} likes")]),
            doc.element(TagKind::Button, children!["Like"])
                .handle_local("click", |app: &mut App, _| app.likes += 1),
        ]
    })
}

#[test]
fn test_initial_render() {
    let surface = HeadlessSurface::new().with_host("main");
    let doc = Document::new(App::default(), surface.clone());
    let root = page(&doc);
    doc.mount("main", &root).unwrap();

    let html = surface.host_html("main");
    assert!(html.starts_with(
        "<div><div><div>The Current Count is 0</div><button>Click Me</button></div>"
    ));
    assert!(html.contains("<div class=\"red\"><a href=\"#/test\">to test</a></div>"));
    assert!(html.contains("<div>Distant Count 0</div>"));
    assert_eq!(doc.scopes().len("count"), 2);
}

#[test]
fn test_broadcast_updates_distant_subtrees() {
    let surface = HeadlessSurface::new().with_host("main");
    let doc = Document::new(App::default(), surface.clone());
    let root = page(&doc);
    doc.mount("main", &root).unwrap();

    let button = surface.find_by_text("main", TagKind::Button, "Click Me").unwrap();
    surface.dispatch(button, "click");
    surface.dispatch(button, "click");

    let html = surface.host_html("main");
    assert!(html.contains("The Current Count is 2"));
    assert!(html.contains("Distant Count 2"));
    assert_eq!(doc.state().count, 2);
    assert!(doc.take_diagnostics().is_empty());
}

#[test]
fn test_local_reaction_leaves_siblings_alone() {
    let surface = HeadlessSurface::new().with_host("main");
    let doc = Document::new(App::default(), surface.clone());
    let root = page(&doc);
    doc.mount("main", &root).unwrap();

    // Count changes without a broadcast are not picked up by the like section
    doc.update(|app| app.count = 10);
    let like = surface.find_by_text("main", TagKind::Button, "Like").unwrap();
    surface.dispatch(like, "click");

    let html = surface.host_html("main");
    assert!(html.contains("<span>1 likes</span>"));
    assert!(html.contains("Distant Count 0"));
}

#[test]
fn test_unmount_leaves_stale_subscribers() {
    let surface = HeadlessSurface::new().with_host("main");
    let doc = Document::new(App::default(), surface.clone());
    let root = page(&doc);
    doc.mount("main", &root).unwrap();
    let button = surface.find_by_text("main", TagKind::Button, "Click Me").unwrap();

    // destroy() keeps subscriptions; reacting them afterwards is reported
    doc.unmount(&root).unwrap();
    assert_eq!(doc.scopes().len("count"), 2);

    surface.dispatch(button, "click");
    let diagnostics = doc.take_diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert!(surface.host_html("main").is_empty());
}
