use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use rfinspect::{BoundingBox, Document, DocumentMetrics, Element, InspectConfig, Viewport};

/// Inspect the elements of an HTML page
#[derive(Parser, Debug)]
#[command(name = "rfinspect", version, about)]
struct Args {
    /// HTML file, or http(s) URL
    input: String,

    /// Elements to report
    #[arg(short, long, default_value = "body *")]
    selector: String,

    /// Computed style properties to include (repeatable)
    #[arg(long = "style", value_name = "PROPERTY")]
    styles: Vec<String>,

    /// Viewport size as WxH
    #[arg(long, value_parser = parse_viewport, default_value = "1280x720")]
    viewport: (u32, u32),

    /// Vertical viewport scroll offset in CSS px
    #[arg(long, default_value = "0")]
    scroll_y: f64,

    /// Override the User-Agent header
    #[arg(long)]
    user_agent: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Do not fetch linked stylesheets
    #[arg(long)]
    no_stylesheets: bool,

    /// Do not fetch iframe documents
    #[arg(long)]
    no_frames: bool,

    /// Only report elements the off-screen heuristic flags
    #[arg(long)]
    off_screen: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Report {
    url: Option<String>,
    title: String,
    metrics: DocumentMetrics,
    elements: Vec<ElementReport>,
}

#[derive(Serialize)]
struct ElementReport {
    selector: String,
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    bounding_box: BoundingBox,
    off_screen: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    styles: BTreeMap<String, String>,
}

impl ElementReport {
    fn new(element: &Element, styles: &[String]) -> Self {
        Self {
            selector: element.css_selector(),
            tag: element.tag_name(),
            attributes: element.attributes().into_iter().collect(),
            text: element.text().split_whitespace().collect::<Vec<_>>().join(" "),
            bounding_box: element.bounding_box(),
            off_screen: element.is_off_screen(),
            styles: styles
                .iter()
                .map(|p| (p.clone(), element.style_property(p, None)))
                .collect(),
        }
    }
}

fn parse_viewport(raw: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {raw:?}"))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height: {e}"))?;
    Ok((w, h))
}

fn load(args: &Args, config: InspectConfig) -> Result<Document> {
    let remote = args.input.starts_with("http://") || args.input.starts_with("https://");
    if remote {
        #[cfg(feature = "fetch")]
        return Document::load_url(&args.input, config)
            .with_context(|| format!("loading {}", args.input));
        #[cfg(not(feature = "fetch"))]
        bail!("{} is a URL but rfinspect was built without the `fetch` feature", args.input);
    }
    Document::from_file(&args.input, config).with_context(|| format!("reading {}", args.input))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = InspectConfig {
        viewport: Viewport {
            width: args.viewport.0,
            height: args.viewport.1,
        },
        timeout_ms: args.timeout_ms,
        fetch_stylesheets: !args.no_stylesheets,
        load_frames: !args.no_frames,
        ..Default::default()
    };
    if let Some(agent) = &args.user_agent {
        config.user_agent = agent.clone();
    }
    config.validate()?;

    let doc = load(&args, config)?;
    if args.scroll_y != 0.0 {
        doc.scroll_to(0.0, args.scroll_y);
    }

    let elements = doc
        .query_all(&args.selector)
        .with_context(|| format!("selector {:?}", args.selector))?;
    if elements.is_empty() {
        bail!("no element matches {:?}", args.selector);
    }

    let report = Report {
        url: doc.url(),
        title: doc.title(),
        metrics: doc.metrics(),
        elements: elements
            .iter()
            .filter(|el| !args.off_screen || el.is_off_screen())
            .map(|el| ElementReport::new(el, &args.styles))
            .collect(),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
