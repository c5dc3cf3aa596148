#![cfg(feature = "fetch")]

use rfinspect::{Document, Error, InspectConfig, Loader};
use tiny_http::{Response, Server};

/// Serve a small site: a page linking a stylesheet and framing another page.
fn serve() -> String {
    let server = Server::http("0.0.0.0:0").unwrap();
    let addr = server.server_addr();

    std::thread::spawn(move || {
        for req in server.incoming_requests() {
            let path = req.url().to_string();
            let response = match path.as_str() {
                "/" => Response::from_string(
                    "<html><head><title>Home</title>\
                     <link rel=\"stylesheet\" href=\"/css/site.css\"></head>\
                     <body><h1 class=\"brand\">Hi</h1>\
                     <iframe id=\"f\" src=\"/frame.html\"></iframe></body></html>",
                ),
                "/css/site.css" => Response::from_string(".brand { color: rgb(1, 2, 3) }"),
                "/frame.html" => Response::from_string("<p id=\"inner\">framed</p>"),
                _ => Response::from_string("missing").with_status_code(404),
            };
            let _ = req.respond(response);
        }
    });

    format!("http://{}", addr)
}

#[test]
fn test_load_url_fetches_stylesheets_and_frames() {
    // Skip on CI where network may be unreliable
    if std::env::var("CI").is_ok() {
        return;
    }

    let base = serve();
    let doc = Document::load_url(&format!("{}/", base), InspectConfig::default()).expect("load failed");
    assert_eq!(doc.title(), "Home");

    let h1 = doc.query(".brand").unwrap().unwrap();
    assert_eq!(h1.style_property("color", None), "rgb(1, 2, 3)");

    let frame = doc.query("#f").unwrap().unwrap().content_frame().expect("frame loaded");
    assert_eq!(frame.url().as_deref(), Some(format!("{}/frame.html", base).as_str()));
    assert_eq!(frame.query("#inner").unwrap().unwrap().text(), "framed");
}

#[test]
fn test_frames_can_be_disabled() {
    if std::env::var("CI").is_ok() {
        return;
    }

    let base = serve();
    let config = InspectConfig {
        load_frames: false,
        fetch_stylesheets: false,
        ..Default::default()
    };
    let doc = Document::load_url(&base, config).expect("load failed");
    assert!(doc.query("#f").unwrap().unwrap().content_frame().is_none());
    let h1 = doc.query(".brand").unwrap().unwrap();
    assert_eq!(h1.style_property("color", None), "rgb(0, 0, 0)");
}

#[test]
fn test_http_errors_are_reported() {
    if std::env::var("CI").is_ok() {
        return;
    }

    let base = serve();
    let loader = Loader::new(&InspectConfig::default()).unwrap();
    assert!(matches!(
        loader.fetch_text(&format!("{}/nope", base)),
        Err(Error::NetworkError(_))
    ));
    assert!(matches!(
        Document::load_url(&format!("{}/nope", base), InspectConfig::default()),
        Err(Error::LoadError(_))
    ));
}
