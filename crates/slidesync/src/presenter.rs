use eframe::egui;

use crate::deck::Deck;
use crate::render;
use crate::theme::Theme;

const PANEL_WIDTH: f32 = 320.0;
const PANEL_WIDTH_EXPANDED: f32 = 600.0;
const PREVIEW_HEIGHT: f32 = 240.0;
const PREVIEW_HEIGHT_EXPANDED: f32 = 400.0;
const HEADER_HEIGHT: f32 = 36.0;
const MARGIN: f32 = 16.0;

/// Index of the slide to preview, if the preview should be shown at all.
pub fn next_preview(presenter_mode: bool, current: usize, len: usize) -> Option<usize> {
    let next = current + 1;
    (presenter_mode && next < len).then_some(next)
}

/// Local display state of the presenter panel. Never synchronized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenterPanel {
    pub expanded: bool,
    pub minimized: bool,
}

impl PresenterPanel {
    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn minimize(&mut self) {
        self.minimized = true;
    }

    pub fn restore(&mut self) {
        self.minimized = false;
    }

    fn size(&self) -> egui::Vec2 {
        if self.expanded {
            egui::vec2(PANEL_WIDTH_EXPANDED, HEADER_HEIGHT + PREVIEW_HEIGHT_EXPANDED)
        } else {
            egui::vec2(PANEL_WIDTH, HEADER_HEIGHT + PREVIEW_HEIGHT)
        }
    }

    /// Draw the panel in the bottom-right corner of `area`, previewing slide
    /// `next`. Draws nothing when there is no slide to preview.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        area: egui::Rect,
        deck: &Deck,
        next: Option<usize>,
        theme: &Theme,
    ) {
        let Some(slide) = next.and_then(|i| deck.get(i)) else {
            return;
        };

        if self.minimized {
            self.show_restore_button(ui, area, theme);
            return;
        }

        let size = self.size();
        let panel = egui::Rect::from_min_size(
            area.right_bottom() - size - egui::vec2(MARGIN, MARGIN),
            size,
        );
        let header = egui::Rect::from_min_size(panel.min, egui::vec2(size.x, HEADER_HEIGHT));
        let preview = egui::Rect::from_min_max(
            egui::pos2(panel.left(), header.bottom()),
            panel.max,
        );

        let painter = ui.painter_at(panel.expand(1.0));
        painter.rect(
            panel,
            8.0,
            theme.panel_background,
            egui::Stroke::new(1.0, theme.border),
            egui::StrokeKind::Outside,
        );

        let mut header_ui = ui.new_child(
            egui::UiBuilder::new()
                .max_rect(header.shrink2(egui::vec2(10.0, 4.0)))
                .layout(egui::Layout::left_to_right(egui::Align::Center)),
        );
        header_ui.label(egui::RichText::new("Next Slide").strong().color(theme.foreground));
        header_ui.label(
            egui::RichText::new(format!("\u{203A} {} / {}", slide.index + 1, deck.len()))
                .small()
                .color(theme.muted),
        );
        header_ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .small_button("\u{2715}")
                .on_hover_text("Minimize presenter view")
                .clicked()
            {
                self.minimize();
            }
            let (icon, hint) = if self.expanded {
                ("\u{2199}", "Collapse preview")
            } else {
                ("\u{2197}", "Expand preview")
            };
            if ui.small_button(icon).on_hover_text(hint).clicked() {
                self.toggle_expanded();
            }
        });

        let preview = preview.shrink(1.0);
        let mut preview_ui = ui.new_child(egui::UiBuilder::new().max_rect(preview));
        render::render_slide(
            &mut preview_ui,
            slide,
            theme,
            preview,
            render::compute_scale(preview),
            0.0,
        );
    }

    fn show_restore_button(&mut self, ui: &mut egui::Ui, area: egui::Rect, theme: &Theme) {
        let size = egui::vec2(160.0, 32.0);
        let rect = egui::Rect::from_min_size(
            area.right_bottom() - size - egui::vec2(MARGIN, MARGIN),
            size,
        );
        let button = egui::Button::new(
            egui::RichText::new("Presenter View").color(theme.foreground),
        )
        .fill(theme.panel_background);
        if ui.put(rect, button).clicked() {
            self.restore();
        }
    }
}

/// Speaker notes for the current slide, shown only in presenter mode.
pub fn show_notes(ui: &mut egui::Ui, area: egui::Rect, notes: &str, theme: &Theme) {
    let width = (area.width() * 0.35).clamp(240.0, 520.0);
    let rect = egui::Rect::from_min_size(
        egui::pos2(area.left() + MARGIN, area.top() + MARGIN),
        egui::vec2(width, (area.height() * 0.4).max(80.0)),
    );
    ui.painter()
        .rect_filled(rect, 8.0, Theme::with_opacity(theme.panel_background, 0.92));
    let mut notes_ui = ui.new_child(egui::UiBuilder::new().max_rect(rect.shrink(12.0)));
    notes_ui.label(egui::RichText::new("Notes").strong().color(theme.muted));
    egui::ScrollArea::vertical()
        .id_salt("speaker-notes")
        .show(&mut notes_ui, |ui| {
            ui.label(egui::RichText::new(notes).color(theme.foreground));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_requires_presenter_mode() {
        assert_eq!(next_preview(false, 0, 5), None);
        assert_eq!(next_preview(true, 0, 5), Some(1));
    }

    #[test]
    fn test_no_preview_on_last_slide() {
        assert_eq!(next_preview(true, 3, 5), Some(4));
        assert_eq!(next_preview(true, 4, 5), None);
    }

    #[test]
    fn test_no_preview_for_empty_or_single_deck() {
        assert_eq!(next_preview(true, 0, 0), None);
        assert_eq!(next_preview(true, 0, 1), None);
    }

    #[test]
    fn test_panel_state_is_independent() {
        let mut panel = PresenterPanel::default();
        panel.toggle_expanded();
        panel.minimize();
        assert!(panel.expanded && panel.minimized);
        panel.restore();
        assert!(panel.expanded && !panel.minimized);
        assert_eq!(
            panel.size(),
            egui::vec2(PANEL_WIDTH_EXPANDED, HEADER_HEIGHT + PREVIEW_HEIGHT_EXPANDED)
        );
    }
}
