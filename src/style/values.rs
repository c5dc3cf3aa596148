//! Computed value normalization: colors and lengths

/// An sRGB color with alpha in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rgba {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: f64,
}

impl Rgba {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Serialize the way browsers report computed colors.
    pub(crate) fn to_css(self) -> String {
        if self.a >= 1.0 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, format_number(self.a))
        }
    }
}

const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("black", Rgba::rgb(0, 0, 0)),
    ("silver", Rgba::rgb(192, 192, 192)),
    ("gray", Rgba::rgb(128, 128, 128)),
    ("grey", Rgba::rgb(128, 128, 128)),
    ("white", Rgba::rgb(255, 255, 255)),
    ("maroon", Rgba::rgb(128, 0, 0)),
    ("red", Rgba::rgb(255, 0, 0)),
    ("purple", Rgba::rgb(128, 0, 128)),
    ("fuchsia", Rgba::rgb(255, 0, 255)),
    ("magenta", Rgba::rgb(255, 0, 255)),
    ("green", Rgba::rgb(0, 128, 0)),
    ("lime", Rgba::rgb(0, 255, 0)),
    ("olive", Rgba::rgb(128, 128, 0)),
    ("yellow", Rgba::rgb(255, 255, 0)),
    ("navy", Rgba::rgb(0, 0, 128)),
    ("blue", Rgba::rgb(0, 0, 255)),
    ("teal", Rgba::rgb(0, 128, 128)),
    ("aqua", Rgba::rgb(0, 255, 255)),
    ("cyan", Rgba::rgb(0, 255, 255)),
    ("orange", Rgba::rgb(255, 165, 0)),
    ("darkorange", Rgba::rgb(255, 140, 0)),
    ("gold", Rgba::rgb(255, 215, 0)),
    ("pink", Rgba::rgb(255, 192, 203)),
    ("hotpink", Rgba::rgb(255, 105, 180)),
    ("brown", Rgba::rgb(165, 42, 42)),
    ("chocolate", Rgba::rgb(210, 105, 30)),
    ("tan", Rgba::rgb(210, 180, 140)),
    ("beige", Rgba::rgb(245, 245, 220)),
    ("ivory", Rgba::rgb(255, 255, 240)),
    ("khaki", Rgba::rgb(240, 230, 140)),
    ("coral", Rgba::rgb(255, 127, 80)),
    ("salmon", Rgba::rgb(250, 128, 114)),
    ("crimson", Rgba::rgb(220, 20, 60)),
    ("darkred", Rgba::rgb(139, 0, 0)),
    ("indigo", Rgba::rgb(75, 0, 130)),
    ("violet", Rgba::rgb(238, 130, 238)),
    ("orchid", Rgba::rgb(218, 112, 214)),
    ("plum", Rgba::rgb(221, 160, 221)),
    ("lavender", Rgba::rgb(230, 230, 250)),
    ("darkblue", Rgba::rgb(0, 0, 139)),
    ("mediumblue", Rgba::rgb(0, 0, 205)),
    ("royalblue", Rgba::rgb(65, 105, 225)),
    ("steelblue", Rgba::rgb(70, 130, 180)),
    ("skyblue", Rgba::rgb(135, 206, 235)),
    ("lightblue", Rgba::rgb(173, 216, 230)),
    ("dodgerblue", Rgba::rgb(30, 144, 255)),
    ("cornflowerblue", Rgba::rgb(100, 149, 237)),
    ("darkgreen", Rgba::rgb(0, 100, 0)),
    ("forestgreen", Rgba::rgb(34, 139, 34)),
    ("seagreen", Rgba::rgb(46, 139, 87)),
    ("lightgreen", Rgba::rgb(144, 238, 144)),
    ("limegreen", Rgba::rgb(50, 205, 50)),
    ("darkgray", Rgba::rgb(169, 169, 169)),
    ("darkgrey", Rgba::rgb(169, 169, 169)),
    ("dimgray", Rgba::rgb(105, 105, 105)),
    ("dimgrey", Rgba::rgb(105, 105, 105)),
    ("lightgray", Rgba::rgb(211, 211, 211)),
    ("lightgrey", Rgba::rgb(211, 211, 211)),
    ("gainsboro", Rgba::rgb(220, 220, 220)),
    ("whitesmoke", Rgba::rgb(245, 245, 245)),
    ("slategray", Rgba::rgb(112, 128, 144)),
    ("linen", Rgba::rgb(250, 240, 230)),
    ("rebeccapurple", Rgba::rgb(102, 51, 153)),
    ("transparent", Rgba { r: 0, g: 0, b: 0, a: 0.0 }),
];

pub(crate) fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim().to_ascii_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_args(args);
    }
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, color)| *color)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 | 4 => {
            let a = if hex.len() == 4 { digit(3)? as f64 / 255.0 } else { 1.0 };
            Some(Rgba { r: digit(0)?, g: digit(1)?, b: digit(2)?, a: round_alpha(a) })
        }
        6 | 8 => {
            let a = if hex.len() == 8 { pair(6)? as f64 / 255.0 } else { 1.0 };
            Some(Rgba { r: pair(0)?, g: pair(2)?, b: pair(4)?, a: round_alpha(a) })
        }
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Rgba> {
    // Accept both `r, g, b[, a]` and `r g b[ / a]`.
    let normalized = args.replace('/', " ").replace(',', " ");
    let parts: Vec<&str> = normalized.split_whitespace().collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |raw: &str| -> Option<u8> {
        let v = match raw.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? * 255.0 / 100.0,
            None => raw.parse::<f64>().ok()?,
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let a = match parts.get(3) {
        Some(raw) => match raw.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? / 100.0,
            None => raw.parse::<f64>().ok()?,
        },
        None => 1.0,
    };
    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: round_alpha(a.clamp(0.0, 1.0)),
    })
}

fn round_alpha(a: f64) -> f64 {
    (a * 1000.0).round() / 1000.0
}

/// Format a number with at most three decimals and no trailing zeros.
pub(crate) fn format_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let text = format!("{:.3}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

pub(crate) fn format_px(value: f64) -> String {
    format!("{}px", format_number(value))
}

/// Context needed to resolve relative lengths.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LengthContext {
    pub(crate) font_size: f64,
    pub(crate) root_font_size: f64,
    pub(crate) viewport_width: f64,
    pub(crate) viewport_height: f64,
}

/// A length as specified: absolute pixels or a percentage of some base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Length {
    Px(f64),
    Percent(f64),
}

pub(crate) fn parse_length(value: &str, ctx: &LengthContext) -> Option<Length> {
    let value = value.trim().to_ascii_lowercase();
    if value == "0" {
        return Some(Length::Px(0.0));
    }
    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse::<f64>().ok().map(Length::Percent);
    }
    let units: [(&str, f64); 10] = [
        ("px", 1.0),
        ("rem", ctx.root_font_size),
        ("em", ctx.font_size),
        ("pt", 4.0 / 3.0),
        ("pc", 16.0),
        ("in", 96.0),
        ("cm", 96.0 / 2.54),
        ("mm", 96.0 / 25.4),
        ("vw", ctx.viewport_width / 100.0),
        ("vh", ctx.viewport_height / 100.0),
    ];
    for (unit, factor) in units {
        if let Some(number) = value.strip_suffix(unit) {
            // "rem" also ends with "em"; the ordering above resolves it first.
            return number.trim().parse::<f64>().ok().map(|n| Length::Px(n * factor));
        }
    }
    None
}

/// Pixel value of a computed `Npx` string.
pub(crate) fn px_value(value: &str) -> Option<f64> {
    value.trim().strip_suffix("px")?.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> LengthContext {
        LengthContext {
            font_size: 20.0,
            root_font_size: 16.0,
            viewport_width: 1000.0,
            viewport_height: 500.0,
        }
    }

    #[test]
    fn colors_normalize_to_rgb() {
        assert_eq!(parse_color("#f00").unwrap().to_css(), "rgb(255, 0, 0)");
        assert_eq!(parse_color("#00ff00").unwrap().to_css(), "rgb(0, 255, 0)");
        assert_eq!(parse_color("Blue").unwrap().to_css(), "rgb(0, 0, 255)");
        assert_eq!(parse_color("rgba(1, 2, 3, 0.5)").unwrap().to_css(), "rgba(1, 2, 3, 0.5)");
        assert_eq!(parse_color("rgb(10 20 30 / 50%)").unwrap().to_css(), "rgba(10, 20, 30, 0.5)");
        assert_eq!(parse_color("transparent").unwrap().to_css(), "rgba(0, 0, 0, 0)");
        assert!(parse_color("#ggg").is_none());
        assert!(parse_color("notacolor").is_none());
    }

    #[test]
    fn lengths_resolve_units() {
        let c = ctx();
        assert_eq!(parse_length("12px", &c), Some(Length::Px(12.0)));
        assert_eq!(parse_length("2em", &c), Some(Length::Px(40.0)));
        assert_eq!(parse_length("2rem", &c), Some(Length::Px(32.0)));
        assert_eq!(parse_length("50%", &c), Some(Length::Percent(50.0)));
        assert_eq!(parse_length("10vw", &c), Some(Length::Px(100.0)));
        assert_eq!(parse_length("0", &c), Some(Length::Px(0.0)));
        assert_eq!(parse_length("auto", &c), None);
    }

    #[test]
    fn numbers_format_without_trailing_zeros() {
        assert_eq!(format_px(12.0), "12px");
        assert_eq!(format_px(18.72), "18.72px");
        assert_eq!(format_number(1.0 / 3.0), "0.333");
        assert_eq!(format_number(-0.0001), "0");
    }
}
