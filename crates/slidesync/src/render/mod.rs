pub mod text;

use eframe::egui;

use crate::deck::Slide;
use crate::theme::Theme;

const REF_WIDTH: f32 = 1920.0;
const REF_HEIGHT: f32 = 1080.0;
const SLIDE_PADDING: f32 = 80.0;

pub fn compute_scale(rect: egui::Rect) -> f32 {
    (rect.width() / REF_WIDTH).min(rect.height() / REF_HEIGHT)
}

/// Returns `(content_height, available_height)` for a slide laid out in
/// `rect`. Content taller than the available height scrolls.
pub fn measure_slide(
    ui: &egui::Ui,
    slide: &Slide,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
) -> (f32, f32) {
    let padding = SLIDE_PADDING * scale;
    let blocks = text::parse_blocks(&slide.body);
    let content = text::measure_blocks(ui, &blocks, theme, rect.width() - padding * 2.0, scale);
    (content, rect.height() - padding * 2.0)
}

/// Largest useful scroll offset for a slide.
pub fn max_scroll(content_height: f32, available_height: f32) -> f32 {
    (content_height - available_height).max(0.0)
}

/// Draw one slide into `rect`, shifted up by `scroll` points. Content that
/// fits is centered vertically.
pub fn render_slide(
    ui: &mut egui::Ui,
    slide: &Slide,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
    scroll: f32,
) {
    let padding = SLIDE_PADDING * scale;
    let blocks = text::parse_blocks(&slide.body);
    let width = rect.width() - padding * 2.0;
    let content = text::measure_blocks(ui, &blocks, theme, width, scale);
    let available = rect.height() - padding * 2.0;

    let top = if content < available {
        rect.top() + padding + (available - content) / 2.0
    } else {
        rect.top() + padding - scroll.clamp(0.0, max_scroll(content, available))
    };

    ui.painter_at(rect).rect_filled(rect, 0.0, theme.background);

    let mut child = ui.new_child(egui::UiBuilder::new().max_rect(rect));
    child.set_clip_rect(rect.intersect(ui.clip_rect()));
    text::draw_blocks(
        &child,
        &blocks,
        theme,
        egui::pos2(rect.left() + padding, top),
        width,
        scale,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_scale_tracks_smaller_axis() {
        let full = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1920.0, 1080.0));
        assert_eq!(compute_scale(full), 1.0);

        let wide = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(3840.0, 1080.0));
        assert_eq!(compute_scale(wide), 1.0);

        let half = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(960.0, 540.0));
        assert_eq!(compute_scale(half), 0.5);
    }

    #[test]
    fn test_render_and_measure_in_headless_frame() {
        let deck = crate::deck::Deck::builder("t")
            .slide("# Title\n\n- one\n- two\n\n```\nlet x = 1;\n```")
            .build();
        let slide = deck.get(0).expect("one slide");
        let theme = Theme::dark();
        let ctx = egui::Context::default();
        let mut measured = (0.0, 0.0);
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let rect = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(960.0, 540.0));
                let scale = compute_scale(rect);
                measured = measure_slide(ui, slide, &theme, rect, scale);
                render_slide(ui, slide, &theme, rect, scale, 0.0);
            });
        });
        assert!(measured.0 > 0.0);
        assert!(measured.1 > 0.0);
    }

    #[test]
    fn test_max_scroll() {
        assert_eq!(max_scroll(500.0, 800.0), 0.0);
        assert_eq!(max_scroll(1200.0, 800.0), 400.0);
    }
}
