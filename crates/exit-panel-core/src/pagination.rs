use serde::Serialize;

use crate::status::{ViewItem, ViewModel};

pub const ITEMS_PER_PAGE: usize = 10;

/// One page of the view-model. Separators occupy positions like entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<'a> {
    pub items: &'a [ViewItem],
    pub page_number: usize,
    pub page_count: usize,
}

impl Page<'_> {
    pub fn has_prev(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.page_count
    }

    /// `Page X of Y`, reporting `of 0` for an empty list.
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.page_number, self.page_count)
    }
}

/// Fixed-size paging over the current view-model.
#[derive(Debug, Clone)]
pub struct Paginator {
    view_model: ViewModel,
    current_page: usize,
    items_per_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            view_model: ViewModel::default(),
            current_page: 1,
            items_per_page: ITEMS_PER_PAGE,
        }
    }
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the view-model and rewinds to page 1.
    pub fn set_view_model(&mut self, view_model: ViewModel) {
        self.view_model = view_model;
        self.current_page = 1;
    }

    pub fn view_model(&self) -> &ViewModel {
        &self.view_model
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.view_model.len().div_ceil(self.items_per_page)
    }

    pub fn page(&self) -> Page<'_> {
        let items = self.view_model.items();
        let start = ((self.current_page - 1) * self.items_per_page).min(items.len());
        let end = (start + self.items_per_page).min(items.len());
        Page {
            items: &items[start..end],
            page_number: self.current_page,
            page_count: self.page_count(),
        }
    }

    /// Advances one page; unchanged on the last page.
    pub fn next(&mut self) -> Page<'_> {
        if self.current_page < self.page_count() {
            self.current_page += 1;
        }
        self.page()
    }

    /// Retreats one page; unchanged on the first page.
    pub fn prev(&mut self) -> Page<'_> {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
        self.page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::normalize;
    use crate::status::{NodeCategory, NodeEntry};

    fn view_model_of(count: usize) -> ViewModel {
        let items = (0..count)
            .map(|index| {
                let raw = format!("node-{index:02}");
                ViewItem::Node(NodeEntry {
                    key: normalize(&raw),
                    display_name: raw.clone(),
                    raw,
                    category: NodeCategory::Generic,
                    provider_hosted: false,
                    active: false,
                })
            })
            .collect::<Vec<_>>();
        ViewModel::from(items)
    }

    #[test]
    fn twenty_five_items_span_three_pages() {
        let mut paginator = Paginator::new();
        paginator.set_view_model(view_model_of(25));

        assert_eq!(paginator.page_count(), 3);
        assert_eq!(paginator.page().items.len(), 10);
        assert!(!paginator.page().has_prev());

        let unchanged = paginator.prev();
        assert_eq!(unchanged.page_number, 1);

        assert_eq!(paginator.next().page_number, 2);
        let last = paginator.next();
        assert_eq!(last.page_number, 3);
        assert_eq!(last.items.len(), 5);
        assert!(!last.has_next());
        assert_eq!(last.label(), "Page 3 of 3");

        let still_last = paginator.next();
        assert_eq!(still_last.page_number, 3);
        assert_eq!(still_last.items.len(), 5);
    }

    #[test]
    fn new_view_model_resets_to_first_page() {
        let mut paginator = Paginator::new();
        paginator.set_view_model(view_model_of(25));
        paginator.next();
        paginator.next();
        assert_eq!(paginator.current_page(), 3);

        paginator.set_view_model(view_model_of(4));
        assert_eq!(paginator.current_page(), 1);
        assert_eq!(paginator.page().items.len(), 4);
        assert_eq!(paginator.page_count(), 1);
    }

    #[test]
    fn separators_take_page_positions() {
        let mut items: Vec<ViewItem> = view_model_of(9).items().to_vec();
        items.push(ViewItem::Separator);
        items.extend(view_model_of(2).items().iter().cloned());
        let mut paginator = Paginator::new();
        paginator.set_view_model(ViewModel::from(items));

        assert_eq!(paginator.page_count(), 2);
        assert!(paginator.page().items[9].is_separator());
        assert_eq!(paginator.next().items.len(), 2);
    }

    #[test]
    fn empty_view_model_reports_zero_pages() {
        let mut paginator = Paginator::new();
        let page = paginator.page();
        assert!(page.items.is_empty());
        assert_eq!(page.page_count, 0);
        assert_eq!(page.label(), "Page 1 of 0");
        assert!(!page.has_prev());
        assert!(!page.has_next());
        assert_eq!(paginator.next().page_number, 1);
    }
}
