/// Block layout for certificate fragments

use scraper::{ElementRef, Html, Selector};

use crate::error::SnapshotError;

/// Horizontal advance of one narrow glyph at scale 1
pub const GLYPH_WIDTH: u32 = 8;
/// Line height at scale 1
pub const LINE_HEIGHT: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        let total = self.box_model.margin + self.box_model.border + self.box_model.padding;
        self.rect.width.saturating_sub(total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Title,
    Paragraph,
    Image,
}

/// What a layout node paints
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// Wrapped lines of text, drawn at `scale`
    Text { lines: Vec<String>, scale: u32 },
    /// An image; `src` is replaced by an inline data URL before painting
    Image { src: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    pub elem_type: ElementType,
    pub content: NodeContent,
}

/// An RGBA color
pub type Rgba = (u8, u8, u8, u8);

pub const WHITE: Rgba = (255, 255, 255, 255);
pub const INK: Rgba = (34, 34, 34, 255);

/// Laid-out certificate: page size, colors and boxes in paint order
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
    pub color: Rgba,
    pub nodes: Vec<LayoutNode>,
}

impl Layout {
    /// Image sources in paint order, for rewriting before painting
    pub fn image_sources_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.nodes.iter_mut().filter_map(|n| match &mut n.content {
            NodeContent::Image { src } => Some(src),
            _ => None,
        })
    }
}

fn selector(s: &str) -> Result<Selector, SnapshotError> {
    Selector::parse(s).map_err(|e| SnapshotError::Layout(format!("bad selector {s}: {e:?}")))
}

/// Width in glyph units: wide (CJK) characters take two units
fn glyph_units(s: &str) -> u32 {
    s.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

/// Greedy word wrap to `max_units` glyph units per line
fn wrap(text: &str, max_units: u32) -> Vec<String> {
    let max_units = max_units.max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if !cur.is_empty() && glyph_units(&cur) + glyph_units(word) + 1 > max_units {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

/// Parse a color from a CSS declaration value: `#rgb`, `#rrggbb` or a few names
pub fn parse_color(value: &str) -> Option<Rgba> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        return match digits.as_slice() {
            [r, g, b] => Some((r * 17, g * 17, b * 17, 255)),
            [r1, r2, g1, g2, b1, b2] => Some((r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2, 255)),
            _ => None,
        };
    }
    match v.as_str() {
        "white" => Some(WHITE),
        "black" => Some((0, 0, 0, 255)),
        "ivory" => Some((255, 255, 240, 255)),
        "beige" => Some((245, 245, 220, 255)),
        "gray" | "grey" => Some((128, 128, 128, 255)),
        _ => None,
    }
}

fn style_property<'a>(el: &'a ElementRef<'_>, name: &str) -> Option<&'a str> {
    let style = el.value().attr("style")?;
    style.split(';').find_map(|decl| {
        let (k, v) = decl.split_once(':')?;
        (k.trim().eq_ignore_ascii_case(name)).then(|| v.trim())
    })
}

fn dimension_attr(el: &ElementRef<'_>, name: &str) -> Option<u32> {
    el.value()
        .attr(name)
        .and_then(|v| v.trim().trim_end_matches("px").parse::<u32>().ok())
        .filter(|v| *v > 0)
}

/// Lay out a markup fragment into a `width` x `height` page.
///
/// - Headings (`h1`-`h3`) become title boxes drawn at scale 2
/// - `p` and `li` become wrapped paragraph boxes at scale 1
/// - `img` becomes an image box sized from its attributes (64px default),
///   clamped to the content width
/// - `background`/`background-color` and `color` on the root element set the
///   page colors
///
/// Boxes stack vertically; layout stops once the page height is exhausted.
/// No box is taller than the page.
pub fn layout_fragment(html: &str, width: u32, height: u32) -> Result<Layout, SnapshotError> {
    let fragment = Html::parse_fragment(html);
    let root = fragment
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .next()
        .ok_or(SnapshotError::Detached)?;

    let background = style_property(&root, "background-color")
        .or_else(|| style_property(&root, "background"))
        .and_then(parse_color)
        .unwrap_or(WHITE);
    let color = style_property(&root, "color").and_then(parse_color).unwrap_or(INK);

    let blocks = selector("h1, h2, h3, p, li, img")?;
    let mut y = 8u32;
    let mut nodes = Vec::new();

    let mut candidates: Vec<ElementRef<'_>> = root.select(&blocks).collect();
    if blocks.matches(&root) && candidates.first().map(|c| c.id()) != Some(root.id()) {
        candidates.insert(0, root);
    }

    let box_width = width.saturating_sub(16);
    for el in candidates {
        if y >= height {
            break;
        }

        if el.value().name() == "img" {
            let Some(src) = el.value().attr("src").filter(|s| !s.trim().is_empty()) else {
                continue;
            };
            let img_w = dimension_attr(&el, "width").unwrap_or(64).min(box_width.max(1));
            let img_h = dimension_attr(&el, "height").unwrap_or(64).min(height);
            let margin = 6;
            nodes.push(LayoutNode {
                lb: LayoutBox {
                    rect: Rect { x: 8, y: y as i32, width: img_w, height: img_h },
                    box_model: BoxModel { margin, border: 0, padding: 0 },
                },
                elem_type: ElementType::Image,
                content: NodeContent::Image { src: src.trim().to_string() },
            });
            y = y.saturating_add(img_h).saturating_add(margin);
            continue;
        }

        let (elem_type, scale, margin, padding) = match el.value().name() {
            "h1" | "h2" | "h3" => (ElementType::Title, 2, 8u32, 8u32),
            _ => (ElementType::Paragraph, 1, 6, 6),
        };
        let mut lb = LayoutBox {
            rect: Rect { x: 8, y: y as i32, width: box_width, height: 0 },
            box_model: BoxModel { margin, border: 0, padding },
        };
        let text = el.text().collect::<Vec<_>>().join(" ");
        let lines = wrap(&text, lb.content_width() / (GLYPH_WIDTH * scale));
        if lines.is_empty() {
            continue;
        }
        let line_count = u32::try_from(lines.len()).unwrap_or(u32::MAX);
        lb.rect.height = line_count
            .saturating_mul(LINE_HEIGHT * scale)
            .saturating_add(padding * 2)
            .min(height);
        y = y.saturating_add(lb.rect.height).saturating_add(margin);
        nodes.push(LayoutNode { lb, elem_type, content: NodeContent::Text { lines, scale } });
    }

    Ok(Layout { width, height, background, color, nodes })
}
