/// A requested move within the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next,
    Previous,
    First,
    Last,
    /// Jump to an arbitrary position. Out-of-range targets clamp to the nearest end.
    GoTo(i64),
}

/// An index change that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexChange {
    pub from: usize,
    pub to: usize,
}

/// Current-slide position for a deck of `len` slides.
///
/// The index always satisfies `current < len` when the deck is non-empty.
/// With an empty deck every transition is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    len: usize,
    current: usize,
}

impl Navigator {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    /// Start at `index`, clamped into the deck.
    pub fn starting_at(len: usize, index: usize) -> Self {
        let mut nav = Self::new(len);
        nav.current = nav.clamp(index as i64);
        nav
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Apply a transition. Returns the change when the index moved, `None` otherwise.
    pub fn apply(&mut self, transition: Transition) -> Option<IndexChange> {
        if self.len == 0 {
            return None;
        }

        let last = self.len - 1;
        let target = match transition {
            Transition::Next => (self.current + 1).min(last),
            Transition::Previous => self.current.saturating_sub(1),
            Transition::First => 0,
            Transition::Last => last,
            Transition::GoTo(i) => self.clamp(i),
        };

        if target == self.current {
            return None;
        }

        let change = IndexChange {
            from: self.current,
            to: target,
        };
        self.current = target;
        Some(change)
    }

    /// Adopt a new deck length, clamping the current index into it.
    pub fn resize(&mut self, len: usize) -> Option<IndexChange> {
        self.len = len;
        let target = self.clamp(self.current as i64);
        if target == self.current {
            return None;
        }
        let change = IndexChange {
            from: self.current,
            to: target,
        };
        self.current = target;
        Some(change)
    }

    fn clamp(&self, index: i64) -> usize {
        if self.len == 0 || index <= 0 {
            return 0;
        }
        let last = (self.len - 1) as i64;
        index.min(last) as usize
    }
}
