//! One mounted view of a deck: its position, its presenter flag, and its
//! membership in the sync topic.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use crate::keymap::Action;
use crate::location::{History, ViewLocation};
use crate::nav::{IndexChange, Navigator, Transition};
use crate::presenter::{self, PresenterPanel};
use crate::sync::{PresenterChannel, SenderId, Transport};

/// Something the window, rather than the view, has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEffect {
    ToggleFullscreen,
    ExitFullscreen,
}

pub struct DeckView {
    nav: Navigator,
    history: History,
    panel: PresenterPanel,
    channel: PresenterChannel,
    inbound: Receiver<i64>,
    scroll_offset: f32,
}

impl DeckView {
    /// Mount a view of a deck with `len` slides and join `topic`.
    ///
    /// `wake` is called from whichever thread delivers a remote change, so the
    /// UI can schedule a repaint.
    pub fn open(
        len: usize,
        start: usize,
        location: ViewLocation,
        transport: Arc<dyn Transport>,
        topic: &str,
        wake: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        let (tx, inbound) = mpsc::channel();
        let channel = PresenterChannel::open(transport, topic, move |index| {
            if tx.send(index).is_ok() {
                wake();
            }
        });

        tracing::info!(
            sender = %channel.sender_id(),
            topic = channel.topic(),
            location = %location,
            "Opened deck view"
        );

        Self {
            nav: Navigator::starting_at(len, start),
            history: History::new(location),
            panel: PresenterPanel::default(),
            channel,
            inbound,
            scroll_offset: 0.0,
        }
    }

    pub fn current(&self) -> usize {
        self.nav.current()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn len(&self) -> usize {
        self.nav.len()
    }

    pub fn sender_id(&self) -> &SenderId {
        self.channel.sender_id()
    }

    pub fn location(&self) -> &ViewLocation {
        self.history.current()
    }

    pub fn is_presenter(&self) -> bool {
        self.history.is_presenter()
    }

    /// Local presenter panel state. Never synchronized.
    pub fn panel_mut(&mut self) -> &mut PresenterPanel {
        &mut self.panel
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Scroll by `delta` points, kept within `0..=max`.
    pub fn scroll_by(&mut self, delta: f32, max: f32) {
        self.scroll_offset = (self.scroll_offset + delta).clamp(0.0, max.max(0.0));
    }

    /// Slide to preview in the presenter panel, if any.
    pub fn preview_index(&self) -> Option<usize> {
        presenter::next_preview(self.is_presenter(), self.nav.current(), self.nav.len())
    }

    /// Local navigation: on change, scroll to top and tell the other views.
    pub fn navigate(&mut self, transition: Transition) -> Option<IndexChange> {
        let change = self.nav.apply(transition)?;
        self.on_local_change(change);
        Some(change)
    }

    pub fn handle_action(&mut self, action: Action) -> Option<WindowEffect> {
        match action {
            Action::Navigate(t) => {
                self.navigate(t);
                None
            }
            Action::TogglePresenter => {
                self.history.toggle_presenter();
                None
            }
            Action::ToggleFullscreen => Some(WindowEffect::ToggleFullscreen),
            Action::ExitFullscreen => Some(WindowEffect::ExitFullscreen),
        }
    }

    /// Apply every change received from other views since the last call.
    /// Remote changes are never re-broadcast. Returns `true` if the index moved.
    pub fn apply_remote(&mut self) -> bool {
        let mut moved = false;
        while let Ok(index) = self.inbound.try_recv() {
            if let Some(change) = self.nav.apply(Transition::GoTo(index)) {
                tracing::debug!(from = change.from, to = change.to, "Applied remote slide change");
                self.scroll_offset = 0.0;
                moved = true;
            }
        }
        moved
    }

    /// The deck was rebuilt with `len` slides.
    pub fn resize(&mut self, len: usize) {
        if let Some(change) = self.nav.resize(len) {
            self.on_local_change(change);
        }
    }

    /// Leave the sync topic. Nothing is received afterwards.
    pub fn close(&mut self) {
        self.channel.close();
        while self.inbound.try_recv().is_ok() {}
    }

    fn on_local_change(&mut self, change: IndexChange) {
        tracing::debug!(from = change.from, to = change.to, "Slide change");
        self.scroll_offset = 0.0;
        self.channel.broadcast(change.to);
    }
}
