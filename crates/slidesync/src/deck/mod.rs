pub mod frontmatter;
pub mod loader;
pub mod splitter;

pub use loader::{DeckSource, DeckWatcher};

/// One navigable unit of content. The body is opaque to navigation; only the
/// position matters.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub index: usize,
    pub body: String,
    /// Speaker notes, never shown in the audience area.
    pub notes: Option<String>,
    /// Label of the enclosing group, if the slide was declared inside one.
    pub section: Option<String>,
}

/// The ordered, immutable collection of slides for one presentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deck {
    pub title: String,
    pub subtitle: Option<String>,
    slides: Vec<Slide>,
}

/// Content of a slide before it has been given a position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideContent {
    pub body: String,
    pub notes: Option<String>,
}

impl SlideContent {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A declarative tree of deck content. Only `Slide` nodes become slides;
/// groups are walked in order and anything else is skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Slide(SlideContent),
    Group {
        label: Option<String>,
        children: Vec<Node>,
    },
    Other(String),
}

impl Deck {
    /// Collect every slide in `nodes`, in document order, descending into groups.
    pub fn from_nodes(title: impl Into<String>, subtitle: Option<String>, nodes: &[Node]) -> Self {
        let mut slides = Vec::new();
        collect_slides(nodes, None, &mut slides);
        Self {
            title: title.into(),
            subtitle,
            slides,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn builder(title: impl Into<String>) -> DeckBuilder {
        DeckBuilder::new(title)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }
}

fn collect_slides(nodes: &[Node], section: Option<&str>, out: &mut Vec<Slide>) {
    for node in nodes {
        match node {
            Node::Slide(content) => out.push(Slide {
                index: out.len(),
                body: content.body.clone(),
                notes: content.notes.clone(),
                section: section.map(str::to_string),
            }),
            Node::Group { label, children } => {
                // An unlabelled group keeps the label of its parent
                let inner = label.as_deref().or(section);
                collect_slides(children, inner, out);
            }
            Node::Other(_) => {}
        }
    }
}

/// Builds a [`Deck`] from an explicit, ordered list of slides.
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    title: String,
    subtitle: Option<String>,
    nodes: Vec<Node>,
}

#[cfg_attr(not(test), allow(dead_code))]
impl DeckBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn slide(mut self, body: impl Into<String>) -> Self {
        self.nodes.push(Node::Slide(SlideContent::new(body)));
        self
    }

    pub fn slide_with_notes(mut self, body: impl Into<String>, notes: impl Into<String>) -> Self {
        self.nodes
            .push(Node::Slide(SlideContent::new(body).with_notes(notes)));
        self
    }

    /// Add a labelled group of slides. The closure receives an empty builder
    /// whose slides are appended in place.
    pub fn group(mut self, label: impl Into<String>, f: impl FnOnce(DeckBuilder) -> DeckBuilder) -> Self {
        let inner = f(DeckBuilder::default());
        self.nodes.push(Node::Group {
            label: Some(label.into()),
            children: inner.nodes,
        });
        self
    }

    pub fn node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn build(self) -> Deck {
        Deck::from_nodes(self.title, self.subtitle, &self.nodes)
    }
}
