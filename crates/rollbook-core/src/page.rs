//! Page windows for list endpoints.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;

/// A 1-based page request. Out-of-range values are clamped rather than
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub page:      u32,
  pub page_size: u32,
}

impl Default for Page {
  fn default() -> Self {
    Self {
      page:      1,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl Page {
  pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
    Self {
      page:      page.unwrap_or(1).max(1),
      page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    }
  }

  pub fn limit(&self) -> u64 { u64::from(self.page_size) }

  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.page_size) }
}

/// One page of results plus the size of the full filtered set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
  pub items:       Vec<T>,
  pub total:       u64,
  pub page:        u32,
  pub page_size:   u32,
  pub total_pages: u64,
}

impl<T> Paginated<T> {
  pub fn new(items: Vec<T>, total: u64, page: Page) -> Self {
    Self {
      items,
      total,
      page: page.page,
      page_size: page.page_size,
      total_pages: total.div_ceil(page.limit()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_clamps_inputs() {
    let p = Page::new(Some(0), Some(10_000));
    assert_eq!(p.page, 1);
    assert_eq!(p.page_size, MAX_PAGE_SIZE);
    assert_eq!(Page::new(None, None), Page::default());
  }

  #[test]
  fn offset_is_zero_based() {
    let p = Page::new(Some(3), Some(20));
    assert_eq!(p.offset(), 40);
    assert_eq!(p.limit(), 20);
  }

  #[test]
  fn total_pages_rounds_up() {
    let page = Page::new(Some(1), Some(10));
    assert_eq!(Paginated::<()>::new(vec![], 21, page).total_pages, 3);
    assert_eq!(Paginated::<()>::new(vec![], 0, page).total_pages, 0);
  }
}
