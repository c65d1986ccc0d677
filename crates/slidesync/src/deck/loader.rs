use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use regex::Regex;

use super::frontmatter::{self, DeckMeta};
use super::splitter::{self, Chunk};
use super::{Deck, Node, SlideContent};

static NOTES_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^notes?:\s*(.*)$").expect("valid notes regex"));

static COMMENT_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\s*<!--.*?-->\s*)+$").expect("valid comment regex"));

/// Parse markdown source into deck metadata and the declarative node tree.
pub fn parse_nodes(content: &str) -> (DeckMeta, Vec<Node>) {
    let (meta, body) = frontmatter::extract(content);

    let mut nodes = Vec::new();
    let mut group: Option<(String, Vec<Node>)> = None;

    for chunk in splitter::split(&body) {
        match chunk {
            Chunk::Section(label) => {
                if let Some((label, children)) = group.take() {
                    nodes.push(Node::Group {
                        label: Some(label),
                        children,
                    });
                }
                group = label.map(|l| (l, Vec::new()));
            }
            Chunk::Text(text) => {
                let node = text_node(text);
                match group.as_mut() {
                    Some((_, children)) => children.push(node),
                    None => nodes.push(node),
                }
            }
        }
    }

    if let Some((label, children)) = group {
        nodes.push(Node::Group {
            label: Some(label),
            children,
        });
    }

    (meta, nodes)
}

/// Parse markdown source into a deck. `fallback_title` is used when the
/// frontmatter does not name the deck.
pub fn parse(content: &str, fallback_title: &str) -> (DeckMeta, Deck) {
    let (meta, nodes) = parse_nodes(content);
    let title = meta
        .title
        .clone()
        .unwrap_or_else(|| fallback_title.to_string());
    let deck = Deck::from_nodes(title, meta.subtitle.clone(), &nodes);
    (meta, deck)
}

fn text_node(text: String) -> Node {
    if COMMENT_ONLY.is_match(&text) {
        return Node::Other(text);
    }

    let mut body = Vec::new();
    let mut notes: Option<Vec<&str>> = None;
    let mut fence: Option<(char, usize)> = None;
    for line in text.lines() {
        let trimmed = line.trim();
        let in_fence = fence.is_some();
        match fence {
            Some((fence_char, fence_len)) => {
                if splitter::closes_fence(trimmed, fence_char, fence_len) {
                    fence = None;
                }
            }
            None => {
                if let Some(fence_char) = splitter::opening_fence_char(trimmed) {
                    let fence_len = trimmed.chars().take_while(|&c| c == fence_char).count();
                    fence = Some((fence_char, fence_len));
                }
            }
        }

        if let Some(n) = notes.as_mut() {
            n.push(line);
        } else if let Some(caps) = (!in_fence)
            .then(|| NOTES_MARKER.captures(trimmed))
            .flatten()
        {
            let first = caps.get(1).map_or("", |m| m.as_str());
            notes = Some(vec![first]);
        } else {
            body.push(line);
        }
    }

    let content = SlideContent::new(body.join("\n").trim());
    match notes
        .map(|n| n.join("\n").trim().to_string())
        .filter(|n| !n.is_empty())
    {
        Some(notes) => Node::Slide(content.with_notes(notes)),
        None => Node::Slide(content),
    }
}

/// A deck tied to its source file. The deck is rebuilt only when the source
/// text actually changes.
#[derive(Debug)]
pub struct DeckSource {
    path: PathBuf,
    source: String,
    meta: DeckMeta,
    deck: Deck,
}

impl DeckSource {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let (meta, deck) = parse(&source, &fallback_title(path));
        tracing::debug!(slides = deck.len(), path = %path.display(), "Loaded deck");
        Ok(Self {
            path: path.to_path_buf(),
            source,
            meta,
            deck,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta(&self) -> &DeckMeta {
        &self.meta
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Replace the source text. Returns `true` when the deck was rebuilt.
    pub fn update(&mut self, source: String) -> bool {
        if source == self.source {
            return false;
        }
        let (meta, deck) = parse(&source, &fallback_title(&self.path));
        self.source = source;
        self.meta = meta;
        self.deck = deck;
        true
    }

    /// Re-read the file from disk. Returns `true` when the deck changed.
    pub fn reload(&mut self) -> Result<bool> {
        let source = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(self.update(source))
    }
}

fn fallback_title(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Watches a deck file and flags edits for the UI thread to pick up.
pub struct DeckWatcher {
    changed: Arc<AtomicBool>,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl DeckWatcher {
    pub fn start(path: &Path, on_change: impl Fn() + Send + 'static) -> Result<Self> {
        let path = std::path::absolute(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .context("Deck path has no parent directory")?;

        let changed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&changed);
        let target = path.file_name().map(|n| n.to_os_string());
        let mut debouncer = new_debouncer(
            Duration::from_millis(200),
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    if events
                        .iter()
                        .any(|e| e.path.file_name().map(|n| n.to_os_string()) == target)
                    {
                        flag.store(true, Ordering::SeqCst);
                        on_change();
                    }
                }
                Err(e) => tracing::warn!("Deck watcher error: {e:?}"),
            },
        )
        .context("Failed to create deck watcher")?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        Ok(Self {
            changed,
            _debouncer: debouncer,
        })
    }

    /// Returns `true` once per batch of edits.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::SeqCst)
    }
}
