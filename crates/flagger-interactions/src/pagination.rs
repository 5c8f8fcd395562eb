//! Paged select menus.
//!
//! Select menus hold at most 25 options. Longer lists are sliced into pages
//! of `DEFAULT_PAGE_SIZE` entries; a "Previous Page" entry leads the page and
//! a "Next Page" entry closes it where applicable. The current page lives in the select's own custom id
//! (`option:page:<cursor>:str;<page>`), so the next interaction can read it
//! back without any server-side state.

use flagger_config::FieldValue;

use crate::{ComponentId, ComponentIdError, OptionVerb, SelectMenu, SelectOption};

/// Leaves room for the two navigation entries under the 25-option limit.
pub const DEFAULT_PAGE_SIZE: usize = 23;
pub const PREVIOUS_PAGE_LABEL: &str = "Previous Page";
pub const NEXT_PAGE_LABEL: &str = "Next Page";

#[derive(Debug, Clone, PartialEq, Eq)]
/// One slice of a paginated list.
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// Effective page index after clamping.
    pub index: usize,
    pub page_count: usize,
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// Returns page `index` of `items`. Out-of-range indexes clamp to the last page.
pub fn paginate<T>(items: &[T], index: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let page_count = page_count(items.len(), page_size);
    if page_count == 0 {
        return Page {
            items: &[],
            index: 0,
            page_count: 0,
            previous: None,
            next: None,
        };
    }
    let clamped = index.min(page_count - 1);
    if clamped != index {
        tracing::debug!(requested = index, clamped, page_count, "clamping page index");
    }
    let start = clamped * page_size;
    let end = (start + page_size).min(items.len());
    Page {
        items: &items[start..end],
        index: clamped,
        page_count,
        previous: clamped.checked_sub(1),
        next: (clamped + 1 < page_count).then_some(clamped + 1),
    }
}

/// Id of a navigation entry or paginated select for `cursor_key` at `page`.
pub fn cursor_id(cursor_key: &str, page: usize) -> Result<String, ComponentIdError> {
    ComponentId::option_str(OptionVerb::Page, cursor_key, page.to_string()).encode()
}

/// Builds a select over page `index` of `items`, with navigation entries.
///
/// The select's custom id records the cursor; its options are the rendered
/// items, preceded by "Previous Page" and followed by "Next Page" where
/// applicable.
pub fn paginated_select<T>(
    cursor_key: &str,
    items: &[T],
    index: usize,
    page_size: usize,
    render: impl Fn(&T) -> SelectOption,
) -> Result<SelectMenu, ComponentIdError> {
    let page = paginate(items, index, page_size);
    let mut options = Vec::with_capacity(page.items.len() + 2);
    if let Some(previous) = page.previous {
        options.push(SelectOption::new(
            PREVIOUS_PAGE_LABEL,
            cursor_id(cursor_key, previous)?,
        ));
    }
    options.extend(page.items.iter().map(render));
    if let Some(next) = page.next {
        options.push(SelectOption::new(NEXT_PAGE_LABEL, cursor_id(cursor_key, next)?));
    }
    Ok(SelectMenu::new(cursor_id(cursor_key, page.index)?, options))
}

/// Reads `(cursor_key, page)` back out of a paginated select.
pub fn cursor_of(select: &SelectMenu) -> Option<(String, usize)> {
    match ComponentId::decode(&select.custom_id)? {
        ComponentId::Option {
            verb: OptionVerb::Page,
            key,
            value: FieldValue::Str(page),
        } => page.parse().ok().map(|page| (key, page)),
        _ => None,
    }
}
