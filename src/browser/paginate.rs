pub const PAGE_SIZE: usize = 12;

/// Above this many pages the page-number strip is windowed.
const MAX_VISIBLE_PAGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, R> {
    pub visible: &'a [R],
    pub total_pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Number(usize),
    Ellipsis,
}

pub fn total_pages(items: usize, page_size: usize) -> usize {
    items.div_ceil(page_size.max(1))
}

/// Slice of `filtered` shown on 1-based `page`. Out-of-range pages are empty.
pub fn paginate<R>(filtered: &[R], page: usize, page_size: usize) -> Page<'_, R> {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size).min(filtered.len());
    let end = start.saturating_add(page_size).min(filtered.len());
    Page {
        visible: &filtered[start..end],
        total_pages: total_pages(filtered.len(), page_size),
    }
}

pub fn page_numbers(current: usize, total: usize) -> Vec<PageLink> {
    use PageLink::{Ellipsis, Number};

    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(Number).collect();
    }
    let mut out = Vec::with_capacity(7);
    if current <= 3 {
        out.extend((1..=4).map(Number));
        out.extend([Ellipsis, Number(total)]);
    } else if current >= total - 2 {
        out.extend([Number(1), Ellipsis]);
        out.extend((total - 3..=total).map(Number));
    } else {
        out.extend([Number(1), Ellipsis]);
        out.extend((current - 1..=current + 1).map(Number));
        out.extend([Ellipsis, Number(total)]);
    }
    out
}

pub fn has_previous(current: usize) -> bool {
    current > 1
}

pub fn has_next(current: usize, total: usize) -> bool {
    current < total
}

/// A single page needs no pager.
pub fn shows_pager(total: usize) -> bool {
    total > 1
}

/// `true` when `page` is a page the operator may navigate to.
pub fn is_navigable(page: usize, total: usize) -> bool {
    page >= 1 && page <= total.max(1)
}

/// "Showing 13-24 of 30 items".
pub fn range_label(current: usize, page_size: usize, total_items: usize) -> String {
    let start = (current.saturating_sub(1) * page_size + 1).min(total_items);
    let end = (current * page_size).min(total_items);
    format!("Showing {start}-{end} of {total_items} items")
}
