use vista_model::PageSlot;

/// Page-number buttons for a pagination bar.
///
/// Shows the first page, the last page and `current ± 1`, with an ellipsis
/// wherever two shown numbers are not adjacent. `current` must already be
/// clamped to `[1, total]`.
pub fn compute_window(current: usize, total: usize) -> Vec<PageSlot> {
    if total <= 1 {
        return vec![PageSlot::Page(1)];
    }

    let mut pages = vec![1, total];
    for page in [current.saturating_sub(1), current, current + 1] {
        if (1..=total).contains(&page) {
            pages.push(page);
        }
    }
    pages.sort_unstable();
    pages.dedup();

    let mut slots = Vec::with_capacity(pages.len() * 2);
    let mut prev: Option<usize> = None;
    for page in pages {
        if let Some(p) = prev
            && page - p > 1
        {
            slots.push(PageSlot::Ellipsis);
        }
        slots.push(PageSlot::Page(page));
        prev = Some(page);
    }
    slots
}
