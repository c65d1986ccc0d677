use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui;

use crate::config::Config;
use crate::deck::{Deck, DeckSource, DeckWatcher};
use crate::keymap;
use crate::location::{PRESENTER_PARAM, ViewLocation};
use crate::presenter;
use crate::render;
use crate::sync::{self, DEFAULT_TOPIC, Transport, TransportKind};
use crate::theme::Theme;
use crate::view::{DeckView, WindowEffect};

const HEADER_HEIGHT: f32 = 56.0;
const FOOTER_HEIGHT: f32 = 40.0;

/// How the presenter was asked to start.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub file: PathBuf,
    pub windowed: bool,
    /// 1-indexed
    pub start_slide: Option<usize>,
    pub presenter: bool,
    pub console: bool,
    pub topic: Option<String>,
    pub transport: Option<TransportKind>,
}

struct SlideSyncApp {
    source: DeckSource,
    watcher: Option<DeckWatcher>,
    theme: Theme,
    main: DeckView,
    console: Option<DeckView>,
}

impl SlideSyncApp {
    fn reload_if_changed(&mut self) {
        if !self.watcher.as_ref().is_some_and(DeckWatcher::take_changed) {
            return;
        }
        match self.source.reload() {
            Ok(true) => {
                let len = self.source.deck().len();
                tracing::info!(slides = len, path = %self.source.path().display(), "Deck reloaded");
                self.main.resize(len);
                if let Some(console) = self.console.as_mut() {
                    console.resize(len);
                }
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Keeping previous deck: {e:#}"),
        }
    }
}

impl eframe::App for SlideSyncApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.reload_if_changed();

        let deck = self.source.deck();
        show_view(ctx, &mut self.main, deck, &self.theme);

        let mut console_closed = false;
        if let Some(console) = self.console.as_mut() {
            let theme = &self.theme;
            ctx.show_viewport_immediate(
                egui::ViewportId::from_hash_of("presenter-console"),
                egui::ViewportBuilder::default()
                    .with_title(format!("{} - Presenter Console", deck.title))
                    .with_inner_size([1100.0, 700.0]),
                |ctx, _class| {
                    show_view(ctx, console, deck, theme);
                    if ctx.input(|i| i.viewport().close_requested()) {
                        console_closed = true;
                    }
                },
            );
        }
        if console_closed {
            if let Some(mut console) = self.console.take() {
                tracing::info!(sender = %console.sender_id(), "Presenter console closed");
                console.close();
            }
        }
    }
}

/// Run one frame of a view in the viewport `ctx` belongs to.
fn show_view(ctx: &egui::Context, view: &mut DeckView, deck: &Deck, theme: &Theme) {
    view.apply_remote();

    // Viewport commands are sent after input handling; sending inside an
    // input closure deadlocks
    let effects: Vec<WindowEffect> = keymap::take_actions(ctx)
        .into_iter()
        .filter_map(|action| view.handle_action(action))
        .collect();
    let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
    for effect in effects {
        match effect {
            WindowEffect::ToggleFullscreen => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
            }
            WindowEffect::ExitFullscreen if fullscreen => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
            }
            WindowEffect::ExitFullscreen => {}
        }
    }

    let viewport = ctx.viewport_id();
    egui::TopBottomPanel::top(egui::Id::new(("header", viewport)))
        .exact_height(HEADER_HEIGHT)
        .frame(egui::Frame::new().fill(theme.background).inner_margin(egui::Margin::symmetric(16, 8)))
        .show(ctx, |ui| {
            ui.vertical(|ui| {
                ui.label(
                    egui::RichText::new(&deck.title)
                        .size(22.0)
                        .strong()
                        .color(theme.heading_color),
                );
                if let Some(subtitle) = &deck.subtitle {
                    ui.label(egui::RichText::new(subtitle).color(theme.muted));
                }
            });
        });

    egui::TopBottomPanel::bottom(egui::Id::new(("footer", viewport)))
        .exact_height(FOOTER_HEIGHT)
        .frame(egui::Frame::new().fill(theme.background).inner_margin(egui::Margin::symmetric(16, 8)))
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                let position = if deck.is_empty() {
                    "0 / 0".to_string()
                } else {
                    format!("{} / {}", view.current() + 1, deck.len())
                };
                ui.label(egui::RichText::new(position).color(theme.muted));
                if let Some(section) = deck.get(view.current()).and_then(|s| s.section.as_deref()) {
                    ui.label(egui::RichText::new(section).color(theme.accent));
                }
                if view.is_presenter() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(view.location().to_string())
                                .small()
                                .color(theme.muted),
                        );
                    });
                }
            });
        });

    egui::CentralPanel::default()
        .frame(egui::Frame::new().fill(theme.background).inner_margin(0.0))
        .show(ctx, |ui| {
            let rect = ui.max_rect();
            let Some(slide) = deck.get(view.current()) else {
                return;
            };

            let scale = render::compute_scale(rect);
            let (content, available) = render::measure_slide(ui, slide, theme, rect, scale);
            if ui.rect_contains_pointer(rect) {
                let delta = ui.input(|i| i.smooth_scroll_delta.y);
                if delta != 0.0 {
                    view.scroll_by(-delta, render::max_scroll(content, available));
                }
            }
            render::render_slide(ui, slide, theme, rect, scale, view.scroll_offset());

            if view.is_presenter() {
                if let Some(notes) = slide.notes.as_deref() {
                    presenter::show_notes(ui, rect, notes, theme);
                }
            }
            let next = view.preview_index();
            view.panel_mut().show(ui, rect, deck, next, theme);
        });
}

/// Pick the sync topic: explicit flag, then the deck's own setting, then the
/// config, then the shared default.
pub fn resolve_topic(
    cli_topic: Option<&str>,
    deck_topic: Option<&str>,
    config: &Config,
    deck_name: &str,
) -> String {
    if let Some(topic) = cli_topic.or(deck_topic) {
        return topic.to_string();
    }
    let sync = config.sync.as_ref();
    if let Some(topic) = sync.and_then(|s| s.topic.as_deref()) {
        return topic.to_string();
    }
    if sync.and_then(|s| s.per_deck).unwrap_or(false) {
        return format!("{DEFAULT_TOPIC}/{deck_name}");
    }
    DEFAULT_TOPIC.to_string()
}

pub fn run(options: LaunchOptions) -> anyhow::Result<()> {
    let source = DeckSource::load(&options.file)?;
    let deck = source.deck();
    if deck.is_empty() {
        tracing::warn!("No slides found in {}", options.file.display());
    }

    let config = Config::load_or_default();
    let deck_name = options
        .file
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let theme_name = source
        .meta()
        .theme
        .clone()
        .or_else(|| config.defaults.as_ref().and_then(|d| d.theme.clone()))
        .unwrap_or_else(|| "light".to_string());
    let theme = Theme::from_name(&theme_name);

    let topic = resolve_topic(
        options.topic.as_deref(),
        source.meta().topic.as_deref(),
        &config,
        &deck_name,
    );
    let kind = options.transport.unwrap_or_else(|| config.transport_kind());
    let sync_dir = config.sync.as_ref().and_then(|s| s.dir.clone());
    let transport: Arc<dyn Transport> = sync::open_transport(kind, sync_dir);
    tracing::info!(topic = %topic, transport = kind.name(), "Sync configured");

    let start = options.start_slide.unwrap_or(1).saturating_sub(1);
    let presenter = options.presenter
        || config
            .defaults
            .as_ref()
            .and_then(|d| d.presenter)
            .unwrap_or(false);

    let title = format!("{} - slidesync", deck.title);
    let viewport = if options.windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };
    let native = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let path = options.file.clone();
    let open_console = options.console;
    eframe::run_native(
        &title,
        native,
        Box::new(move |cc| {
            let len = source.deck().len();

            let mut location = ViewLocation::for_deck(&deck_name);
            if presenter {
                location.set_param(PRESENTER_PARAM, "true");
            }
            let ctx = cc.egui_ctx.clone();
            let main = DeckView::open(
                len,
                start,
                location,
                Arc::clone(&transport),
                &topic,
                move || ctx.request_repaint(),
            );

            let console = open_console.then(|| {
                let mut location = ViewLocation::for_deck(&deck_name);
                location.set_param(PRESENTER_PARAM, "true");
                let ctx = cc.egui_ctx.clone();
                DeckView::open(
                    len,
                    start,
                    location,
                    Arc::clone(&transport),
                    &topic,
                    move || ctx.request_repaint(),
                )
            });

            let ctx = cc.egui_ctx.clone();
            let watcher = match DeckWatcher::start(&path, move || ctx.request_repaint()) {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!("Live reload disabled: {e:#}");
                    None
                }
            };

            Ok(Box::new(SlideSyncApp {
                source,
                watcher,
                theme,
                main,
                console,
            }))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;

    fn config_with(sync: SyncConfig) -> Config {
        Config {
            sync: Some(sync),
            ..Config::default()
        }
    }

    #[test]
    fn test_topic_defaults_to_shared_name() {
        assert_eq!(
            resolve_topic(None, None, &Config::default(), "talk"),
            "presentation-sync"
        );
    }

    #[test]
    fn test_topic_precedence() {
        let config = config_with(SyncConfig {
            topic: Some("from-config".into()),
            ..SyncConfig::default()
        });
        assert_eq!(
            resolve_topic(Some("cli"), Some("deck"), &config, "talk"),
            "cli"
        );
        assert_eq!(resolve_topic(None, Some("deck"), &config, "talk"), "deck");
        assert_eq!(resolve_topic(None, None, &config, "talk"), "from-config");
    }

    #[test]
    fn test_topic_per_deck() {
        let config = config_with(SyncConfig {
            per_deck: Some(true),
            ..SyncConfig::default()
        });
        assert_eq!(
            resolve_topic(None, None, &config, "talk"),
            "presentation-sync/talk"
        );
    }
}
