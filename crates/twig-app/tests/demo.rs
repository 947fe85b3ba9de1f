//! Integration tests - the demo application behind its router

use std::rc::Rc;

use twig_app::{load_config, routes, Counter};
use twig_dom::{Document, HeadlessSurface, TagKind};
use twig_router::{HashLocation, Router, RouterConfig};

type Demo = (HeadlessSurface, Document<Counter>, HashLocation, Rc<Router<Counter>>);

fn start(config: RouterConfig, href: &str) -> Demo {
    let surface = HeadlessSurface::new().with_host(&config.mount_point);
    let doc = Document::new(Counter::default(), surface.clone());
    let location = HashLocation::new(href).unwrap();
    let router = Router::attach(&doc, routes(&config), config, &location).unwrap();
    (surface, doc, location, router)
}

#[test]
fn test_counter_then_test_page() {
    let (surface, doc, location, _router) = start(RouterConfig::default(), "http://localhost/");
    let button = surface.find_by_text("main", TagKind::Button, "Click Me").unwrap();
    surface.dispatch(button, "click");
    surface.dispatch(button, "click");
    assert!(surface.host_html("main").contains("Distant Count 2"));

    let link = surface.find_all("main", TagKind::A)[0];
    location.push(&surface.attribute(link, "href").unwrap()).unwrap();
    let html = surface.host_html("main");
    assert!(html.starts_with("<div class=\"flex\">test"));
    assert!(html.ends_with("2</div>"));
    assert!(doc.scopes().is_empty());
}

#[test]
fn test_slug_and_custom_not_found() {
    let (surface, _doc, location, _router) =
        start(RouterConfig::default(), "http://localhost/#/test/abc");
    assert!(surface.host_html("main").contains("<p>slug: abc</p>"));

    location.push("#/unknown").unwrap();
    assert!(surface.host_html("main").contains("custom 404 page"));
}

#[test]
fn test_config_file_changes_mount_point_and_marker() {
    let path = std::env::temp_dir().join(format!("twig-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"mount_point": "app", "param_marker": "$"}"#).unwrap();
    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let (surface, _doc, _location, _router) = start(config, "http://localhost/#/test/xyz");
    assert!(surface.host_html("app").contains("<p>slug: xyz</p>"));
}
