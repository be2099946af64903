use scraper::ElementRef;

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>().trim().to_string()
}

/// `node` itself or its closest ancestor with the given tag name.
pub fn closest<'a>(node: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    std::iter::once(node)
        .chain(node.ancestors().filter_map(ElementRef::wrap))
        .find(|el| el.value().name() == tag)
}

/// Cells that belong to this row and not to a table nested inside it.
pub fn row_cells<'a>(row: ElementRef<'a>, tags: &[&str]) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| tags.contains(&el.value().name()))
        .collect()
}
