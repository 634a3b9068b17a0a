/// Paint commands for a laid-out certificate and their SVG serialization

use std::fmt::Write as _;

use crate::rendering::layout::{Layout, NodeContent, Rgba, LINE_HEIGHT};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        size: u32,
        rgba: Rgba,
        text: String,
    },
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        href: String,
    },
}

/// Build the display list for a layout: page background first, then boxes
/// in layout order.
pub fn paint_layout(layout: &Layout) -> Vec<PaintCommand> {
    let mut cmds = vec![PaintCommand::SolidRect {
        x: 0,
        y: 0,
        width: layout.width,
        height: layout.height,
        rgba: layout.background,
    }];

    for node in &layout.nodes {
        let rect = &node.lb.rect;
        match &node.content {
            NodeContent::Text { lines, scale } => {
                let size = LINE_HEIGHT * scale * 3 / 4;
                let line_h = (LINE_HEIGHT * scale) as i32;
                let pad = node.lb.box_model.padding as i32;
                for (i, line) in lines.iter().enumerate() {
                    cmds.push(PaintCommand::Text {
                        x: rect.x + pad,
                        // baseline of line i
                        y: rect.y + pad + line_h * (i as i32 + 1) - line_h / 4,
                        size,
                        rgba: layout.color,
                        text: line.clone(),
                    });
                }
            }
            NodeContent::Image { src } => cmds.push(PaintCommand::Image {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                href: src.clone(),
            }),
        }
    }
    cmds
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn css_color((r, g, b, a): Rgba) -> String {
    if a == 255 {
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    } else {
        format!("rgba({},{},{},{:.3})", r, g, b, a as f32 / 255.0)
    }
}

/// Serialize a display list as a standalone SVG document of `width` x `height`.
pub fn to_svg(width: u32, height: u32, cmds: &[PaintCommand]) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    for cmd in cmds {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                    x,
                    y,
                    width,
                    height,
                    css_color(*rgba)
                );
            }
            PaintCommand::Text { x, y, size, rgba, text } => {
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" font-family="sans-serif" font-size="{}" fill="{}">{}</text>"#,
                    x,
                    y,
                    size,
                    css_color(*rgba),
                    escape_xml(text)
                );
            }
            PaintCommand::Image { x, y, width, height, href } => {
                let _ = write!(
                    svg,
                    r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid meet" xlink:href="{}"/>"#,
                    x,
                    y,
                    width,
                    height,
                    escape_xml(href)
                );
            }
        }
    }
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::layout_fragment;

    #[test]
    fn paint_command_debug() {
        let cmd = PaintCommand::SolidRect {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            rgba: (255, 0, 0, 255),
        };
        match cmd {
            PaintCommand::SolidRect { width, .. } => assert_eq!(width, 10),
            _ => panic!("unexpected"),
        }
    }

    #[test]
    fn background_is_painted_first() {
        let layout = layout_fragment("<div><p>a &amp; b</p></div>", 100, 100).unwrap();
        let cmds = paint_layout(&layout);
        assert!(matches!(cmds[0], PaintCommand::SolidRect { width: 100, height: 100, .. }));
        assert!(matches!(&cmds[1], PaintCommand::Text { text, .. } if text == "a & b"));
    }

    #[test]
    fn svg_escapes_text() {
        let cmds = vec![PaintCommand::Text {
            x: 1,
            y: 2,
            size: 12,
            rgba: (0, 0, 0, 255),
            text: "<b>&</b>".into(),
        }];
        let svg = to_svg(10, 10, &cmds);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
        assert!(svg.ends_with("</svg>"));
    }
}
