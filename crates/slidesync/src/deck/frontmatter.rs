use serde::Deserialize;

/// Deck-level settings read from a leading YAML block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeckMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    /// Sync topic override for this deck.
    #[serde(default)]
    pub topic: Option<String>,
}

/// Split a document into its frontmatter and the remaining body.
///
/// Frontmatter must open on the very first line with `---` and close with a
/// later `---` line. A block that fails to parse as YAML is left in the body.
pub fn extract(content: &str) -> (DeckMeta, String) {
    let content = content.replace("\r\n", "\n");
    let Some(rest) = content.strip_prefix("---\n") else {
        return (DeckMeta::default(), content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return match serde_yaml::from_str::<Option<DeckMeta>>(yaml) {
                Ok(meta) => (meta.unwrap_or_default(), body.to_string()),
                Err(e) => {
                    tracing::warn!("Ignoring malformed frontmatter: {e}");
                    (DeckMeta::default(), content.clone())
                }
            };
        }
        offset += line.len();
    }

    (DeckMeta::default(), content)
}
