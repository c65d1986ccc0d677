use std::sync::Arc;

use eframe::egui::{self, Color32, FontFamily, FontId, Pos2, Stroke};

use crate::theme::Theme;

const BLOCK_GAP: f32 = 18.0;
const BULLET_INDENT: f32 = 36.0;
const QUOTE_BAR: f32 = 6.0;
const QUOTE_PAD: f32 = 20.0;
const CODE_PAD: f32 = 14.0;

/// A block of slide content, as far as the presenter needs to draw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Bullet { depth: usize, text: String },
    Paragraph(String),
    Quote(String),
    Code(String),
}

/// Break a slide body into drawable blocks. Consecutive text lines join into
/// one paragraph; fenced code is kept verbatim.
pub fn parse_blocks(body: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut code: Option<Vec<&str>> = None;

    let flush = |paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>| {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(paragraph.join(" ")));
            paragraph.clear();
        }
    };

    for line in body.lines() {
        let trimmed = line.trim();

        if let Some(lines) = code.as_mut() {
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                blocks.push(Block::Code(lines.join("\n")));
                code = None;
            } else {
                lines.push(line);
            }
            continue;
        }

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            flush(&mut paragraph, &mut blocks);
            code = Some(Vec::new());
            continue;
        }

        if trimmed.is_empty() {
            flush(&mut paragraph, &mut blocks);
            continue;
        }

        if let Some((level, text)) = heading(trimmed) {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading {
                level,
                text: text.to_string(),
            });
        } else if let Some(text) = bullet(trimmed) {
            flush(&mut paragraph, &mut blocks);
            let indent = line.len() - line.trim_start().len();
            blocks.push(Block::Bullet {
                depth: indent / 2,
                text: text.to_string(),
            });
        } else if let Some(text) = trimmed.strip_prefix('>') {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::Quote(text.trim().to_string()));
        } else {
            paragraph.push(trimmed);
        }
    }

    // Unterminated fence: keep what we have
    if let Some(lines) = code {
        blocks.push(Block::Code(lines.join("\n")));
    }
    flush(&mut paragraph, &mut blocks);
    blocks
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&level) {
        line[level..]
            .strip_prefix(' ')
            .map(|text| (level as u8, text.trim()))
    } else {
        None
    }
}

fn bullet(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "+ "] {
        if let Some(text) = line.strip_prefix(marker) {
            return Some(text.trim());
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        return line[digits..].strip_prefix(". ").map(str::trim);
    }
    None
}

fn layout_text(
    ui: &egui::Ui,
    text: &str,
    font: FontId,
    color: Color32,
    max_width: f32,
) -> Arc<egui::Galley> {
    ui.painter()
        .layout(text.to_string(), font, color, max_width.max(1.0))
}

/// A block with its text already laid out.
struct Laid<'a> {
    block: &'a Block,
    galley: Arc<egui::Galley>,
    height: f32,
}

fn lay_out<'a>(
    ui: &egui::Ui,
    blocks: &'a [Block],
    theme: &Theme,
    max_width: f32,
    scale: f32,
) -> Vec<Laid<'a>> {
    blocks
        .iter()
        .map(|block| {
            let (galley, extra) = match block {
                Block::Heading { level, text } => {
                    let font =
                        FontId::new(theme.heading_size(*level) * scale, FontFamily::Proportional);
                    (layout_text(ui, text, font, theme.heading_color, max_width), 0.0)
                }
                Block::Paragraph(text) => {
                    let font = FontId::new(theme.body_size * scale, FontFamily::Proportional);
                    (layout_text(ui, text, font, theme.foreground, max_width), 0.0)
                }
                Block::Bullet { depth, text } => {
                    let indent = bullet_indent(*depth, scale);
                    let font = FontId::new(theme.body_size * scale, FontFamily::Proportional);
                    (
                        layout_text(ui, text, font, theme.foreground, max_width - indent),
                        0.0,
                    )
                }
                Block::Quote(text) => {
                    let font = FontId::new(theme.body_size * scale, FontFamily::Proportional);
                    let inset = (QUOTE_BAR + QUOTE_PAD) * scale;
                    (layout_text(ui, text, font, theme.muted, max_width - inset), 0.0)
                }
                Block::Code(code) => {
                    let pad = CODE_PAD * scale;
                    let font = FontId::new(theme.code_size * scale, FontFamily::Monospace);
                    (
                        layout_text(ui, code, font, theme.code_foreground, max_width - pad * 2.0),
                        pad * 2.0,
                    )
                }
            };
            let height = galley.rect.height() + extra;
            Laid {
                block,
                galley,
                height,
            }
        })
        .collect()
}

fn bullet_indent(depth: usize, scale: f32) -> f32 {
    BULLET_INDENT * scale * (depth as f32 + 1.0)
}

fn total_height(laid: &[Laid<'_>], scale: f32) -> f32 {
    let gaps = laid.len().saturating_sub(1) as f32 * BLOCK_GAP * scale;
    laid.iter().map(|l| l.height).sum::<f32>() + gaps
}

/// Height `blocks` would take when drawn `max_width` wide.
pub fn measure_blocks(
    ui: &egui::Ui,
    blocks: &[Block],
    theme: &Theme,
    max_width: f32,
    scale: f32,
) -> f32 {
    total_height(&lay_out(ui, blocks, theme, max_width, scale), scale)
}

/// Paint `blocks` top-down from `origin`. Returns the total height used.
pub fn draw_blocks(
    ui: &egui::Ui,
    blocks: &[Block],
    theme: &Theme,
    origin: Pos2,
    max_width: f32,
    scale: f32,
) -> f32 {
    let laid = lay_out(ui, blocks, theme, max_width, scale);
    let painter = ui.painter();
    let mut y = origin.y;

    for (i, item) in laid.iter().enumerate() {
        if i > 0 {
            y += BLOCK_GAP * scale;
        }
        let galley = Arc::clone(&item.galley);
        match item.block {
            Block::Heading { .. } => {
                painter.galley(egui::pos2(origin.x, y), galley, theme.heading_color);
            }
            Block::Paragraph(_) => {
                painter.galley(egui::pos2(origin.x, y), galley, theme.foreground);
            }
            Block::Bullet { depth, .. } => {
                let indent = bullet_indent(*depth, scale);
                let dot = egui::pos2(
                    origin.x + indent - 16.0 * scale,
                    y + theme.body_size * scale * 0.6,
                );
                painter.circle_filled(dot, 4.0 * scale, theme.accent);
                painter.galley(egui::pos2(origin.x + indent, y), galley, theme.foreground);
            }
            Block::Quote(_) => {
                let bar = egui::Rect::from_min_size(
                    egui::pos2(origin.x, y),
                    egui::vec2(QUOTE_BAR * scale, item.height),
                );
                painter.rect_filled(bar, 0.0, theme.accent);
                let x = origin.x + (QUOTE_BAR + QUOTE_PAD) * scale;
                painter.galley(egui::pos2(x, y), galley, theme.muted);
            }
            Block::Code(_) => {
                let pad = CODE_PAD * scale;
                let rect = egui::Rect::from_min_size(
                    egui::pos2(origin.x, y),
                    egui::vec2(max_width, item.height),
                );
                painter.rect(
                    rect,
                    6.0 * scale,
                    theme.code_background,
                    Stroke::new(1.0, theme.border),
                    egui::StrokeKind::Inside,
                );
                painter.galley(rect.min + egui::vec2(pad, pad), galley, theme.code_foreground);
            }
        }
        y += item.height;
    }

    y - origin.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_blocks() {
        let body = "# Title\n\nFirst line\nsecond line\n\n- one\n  - nested\n1. ordered\n> quoted";
        let blocks = parse_blocks(body);
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Title".into()
                },
                Block::Paragraph("First line second line".into()),
                Block::Bullet {
                    depth: 0,
                    text: "one".into()
                },
                Block::Bullet {
                    depth: 1,
                    text: "nested".into()
                },
                Block::Bullet {
                    depth: 0,
                    text: "ordered".into()
                },
                Block::Quote("quoted".into()),
            ]
        );
    }

    #[test]
    fn test_code_fence_kept_verbatim() {
        let body = "```rust\nfn main() {\n    # not a heading\n}\n```";
        assert_eq!(
            parse_blocks(body),
            vec![Block::Code("fn main() {\n    # not a heading\n}".into())]
        );
    }

    #[test]
    fn test_hash_without_space_is_text() {
        assert_eq!(
            parse_blocks("#hashtag"),
            vec![Block::Paragraph("#hashtag".into())]
        );
    }

    #[test]
    fn test_unterminated_fence() {
        assert_eq!(
            parse_blocks("```\nlet x = 1;"),
            vec![Block::Code("let x = 1;".into())]
        );
    }
}
