use shared::{domain::SequenceCatalog, protocol::SEQUENCE_LIST_ELEMENT_ID};

/// Text content of the host page element carrying the sequence list, if present.
pub fn extract_sequence_list(html: &str) -> Option<&str> {
    let double = format!("id=\"{SEQUENCE_LIST_ELEMENT_ID}\"");
    let single = format!("id='{SEQUENCE_LIST_ELEMENT_ID}'");
    let attr_at = html.find(&double).or_else(|| html.find(&single))?;

    let rest = &html[attr_at..];
    let content_start = rest.find('>')? + 1;
    let content = &rest[content_start..];
    let content_end = content.find("</")?;
    Some(content[..content_end].trim())
}

/// Builds the catalog from a host page. Missing or malformed lists yield an empty catalog.
pub fn catalog_from_host_page(html: &str) -> SequenceCatalog {
    match extract_sequence_list(html) {
        Some(raw) => SequenceCatalog::from_embedded(raw),
        None => {
            tracing::warn!("host page has no embedded sequence list; using empty catalog");
            SequenceCatalog::default()
        }
    }
}
