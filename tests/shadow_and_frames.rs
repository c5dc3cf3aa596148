use rfinspect::{Document, InspectConfig, ShadowRootMode};

fn parse(html: &str) -> Document {
    Document::parse(html, InspectConfig::default()).expect("parse failed")
}

#[test]
fn test_shadow_content_is_scoped() {
    let doc = parse(
        "<style>p { color: red }</style>\
         <my-card id=card style='color: green'>\
           <template shadowrootmode=open>\
             <style>span { font-weight: bold }</style>\
             <p>shadow para</p><span>label</span>\
           </template>\
           <p>light para</p>\
         </my-card>",
    );
    let card = doc.query("#card").unwrap().unwrap();

    // Document queries never enter the shadow tree.
    assert_eq!(doc.query_all("p").unwrap().len(), 1);
    assert!(doc.query("span").unwrap().is_none());

    let shadow_p = card.shadow_element("p").unwrap().unwrap();
    assert_eq!(shadow_p.text(), "shadow para");
    // Document rules do not reach into the shadow tree; color inherits from the host.
    assert_eq!(shadow_p.style_property("color", None), "rgb(0, 128, 0)");

    let span = card.shadow_element("span").unwrap().unwrap();
    assert_eq!(span.style_property("font-weight", None), "700");
    assert_eq!(span.css_selector(), "span:nth-of-type(1)");
    assert!(span.parent().is_none());

    let light = card.query("p").unwrap().unwrap();
    assert_eq!(light.style_property("color", None), "rgb(255, 0, 0)");
}

#[test]
fn test_attached_shadow_root_modes() {
    let doc = parse("<div id=open></div><div id=closed></div>");
    let open = doc.query("#open").unwrap().unwrap();
    let closed = doc.query("#closed").unwrap().unwrap();
    assert!(open.attach_shadow(ShadowRootMode::Open, "<b>a</b><b>b</b>"));
    assert!(closed.attach_shadow(ShadowRootMode::Closed, "<b>c</b>"));

    assert_eq!(open.shadow_elements("b").unwrap().len(), 2);
    assert!(closed.shadow_elements("b").unwrap().is_empty());
    assert!(open.shadow_element("[[").is_err());
}

#[test]
fn test_nested_srcdoc_frames() {
    let doc = parse(
        "<iframe id=outer srcdoc=\"<h2>level one</h2><iframe srcdoc='<h3>level two</h3>'></iframe>\"></iframe>\
         <iframe id=blank></iframe>",
    );
    let outer = doc.query("#outer").unwrap().unwrap().content_frame().unwrap();
    assert_eq!(outer.query("h2").unwrap().unwrap().text(), "level one");
    let inner = outer.query("iframe").unwrap().unwrap().content_frame().unwrap();
    assert_eq!(inner.query("h3").unwrap().unwrap().text(), "level two");

    let blank = doc.query("#blank").unwrap().unwrap().content_frame().unwrap();
    assert_eq!(blank.url().as_deref(), Some("about:blank"));
    assert!(blank.body().is_some());
}

#[test]
fn test_frame_documents_are_independent() {
    let doc = parse("<style>p{color:red}</style><iframe srcdoc='<p>x</p>'></iframe>");
    let frame = doc.query("iframe").unwrap().unwrap().content_frame().unwrap();
    let p = frame.query("p").unwrap().unwrap();
    assert_eq!(p.style_property("color", None), "rgb(0, 0, 0)");
    assert!(!p.document().ptr_eq(&doc));
}
