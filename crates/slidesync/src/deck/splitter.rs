use std::sync::LazyLock;

use regex::Regex;

static SECTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<!--\s*section(?:\s*:\s*(.*?))?\s*-->$").expect("valid section regex")
});

/// A piece of the document body between slide breaks.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// `<!-- section: Name -->` opens a group, a bare `<!-- section -->` closes it.
    Section(Option<String>),
    Text(String),
}

/// Split a document body (after frontmatter extraction) into chunks.
///
/// Slide breaks are created by:
/// 1. `---` with blank lines on both sides
/// 2. Three or more consecutive blank lines
/// 3. A `# ` heading when the current slide already has content
/// 4. A section marker comment
///
/// Nothing inside a fenced code block ever causes a break.
pub fn split(body: &str) -> Vec<Chunk> {
    let body = body.replace("\r\n", "\n");
    let lines: Vec<&str> = body.lines().collect();
    let mut state = SplitState::default();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();

        if let Some((fence_char, fence_len)) = state.fence {
            if closes_fence(trimmed, fence_char, fence_len) {
                state.fence = None;
            }
            state.push(line);
            continue;
        }

        if let Some(caps) = SECTION_MARKER.captures(trimmed) {
            state.flush();
            let label = caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty());
            state.chunks.push(Chunk::Section(label));
            continue;
        }

        if is_dash_separator(trimmed) {
            let prev_blank = i == 0 || lines[i - 1].trim().is_empty();
            let next_blank = lines.get(i + 1).is_none_or(|l| l.trim().is_empty());
            if prev_blank && next_blank {
                state.flush();
                continue;
            }
        }

        if trimmed.is_empty() {
            state.blank_run += 1;
            if state.blank_run == 3 {
                state.flush();
            } else {
                state.current.push(line);
            }
            continue;
        }

        if line.starts_with("# ") && state.has_content {
            state.flush();
        }

        if let Some(fence_char) = opening_fence_char(trimmed) {
            let fence_len = trimmed.chars().take_while(|&c| c == fence_char).count();
            state.fence = Some((fence_char, fence_len));
        }

        state.push(line);
    }

    state.flush();
    state.chunks
}

#[derive(Default)]
struct SplitState<'a> {
    chunks: Vec<Chunk>,
    current: Vec<&'a str>,
    has_content: bool,
    blank_run: usize,
    fence: Option<(char, usize)>,
}

impl<'a> SplitState<'a> {
    fn push(&mut self, line: &'a str) {
        self.current.push(line);
        if !line.trim().is_empty() {
            self.has_content = true;
            self.blank_run = 0;
        }
    }

    fn flush(&mut self) {
        let text = self.current.join("\n").trim().to_string();
        if !text.is_empty() {
            self.chunks.push(Chunk::Text(text));
        }
        self.current.clear();
        self.has_content = false;
        self.blank_run = 0;
    }
}

pub(super) fn opening_fence_char(trimmed: &str) -> Option<char> {
    if trimmed.starts_with("```") {
        Some('`')
    } else if trimmed.starts_with("~~~") {
        Some('~')
    } else {
        None
    }
}

pub(super) fn closes_fence(trimmed: &str, fence_char: char, fence_len: usize) -> bool {
    let count = trimmed.chars().take_while(|&c| c == fence_char).count();
    count >= fence_len && trimmed.chars().skip(count).all(char::is_whitespace)
}

fn is_dash_separator(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '-')
}
