//! Reveal windows
//!
//! One driving track value is split into per-page and per-item visibility.
//! Pages take turns: a page whose window has passed switches off. Items inside
//! a page accumulate: once revealed they stay fully visible.

/// Position of `value` inside page `page`'s window of width `value_per_page`.
///
/// Returns `0` once the page has passed (`> 1`). Values before the window are
/// negative and returned unclamped.
pub fn divide_to_pages(value_per_page: f32, page: usize, value: f32) -> f32 {
    if value_per_page <= 0.0 || value_per_page.is_nan() {
        return 0.0;
    }
    let v = (value - value_per_page * page as f32) / value_per_page;
    if v > 1.0 { 0.0 } else { v }
}

/// Position of `value` inside item `item`'s window, clamped to `[0, 1]`.
pub fn divide_to_items(value_per_item: f32, item: usize, value: f32) -> f32 {
    if value_per_item <= 0.0 || value_per_item.is_nan() {
        return 0.0;
    }
    let v = (value - value_per_item * item as f32) / value_per_item;
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Item alphas for `page_count` pages of `item_count` items driven by `value`.
///
/// `result[page][item]`. The page alpha from [`divide_to_pages`] drives the
/// items of that page through [`divide_to_items`].
pub fn cascade(page_count: usize, item_count: usize, value: f32) -> Vec<Vec<f32>> {
    if page_count == 0 || item_count == 0 {
        return vec![Vec::new(); page_count];
    }
    let per_page = 1.0 / page_count as f32;
    let per_item = 1.0 / item_count as f32;

    (0..page_count)
        .map(|page| {
            let page_alpha = divide_to_pages(per_page, page, value);
            (0..item_count)
                .map(|item| divide_to_items(per_item, item, page_alpha))
                .collect()
        })
        .collect()
}
