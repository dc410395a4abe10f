//! Immutable description of one list request.
//!
//! A [`QueryDescriptor`] is derived from the list controller's state on every
//! interaction and turned into a cache key right away. Transitions return new
//! descriptors and apply the paging resets that keep requests in range.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::FetchError;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  pub fn as_str(self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }

  pub fn flipped(self) -> Self {
    match self {
      SortOrder::Asc => SortOrder::Desc,
      SortOrder::Desc => SortOrder::Asc,
    }
  }
}

/// Sort column and direction, always set together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
  pub column: String,
  pub order: SortOrder,
}

impl Sort {
  pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
    Self {
      column: column.into(),
      order,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDescriptor {
  endpoint: String,
  page_index: u32,
  page_size: u32,
  sort: Option<Sort>,
  search_text: String,
}

impl QueryDescriptor {
  /// First page of `endpoint`, unsorted, without search text.
  pub fn new(endpoint: impl Into<String>, page_size: u32) -> Result<Self, FetchError> {
    let endpoint = endpoint.into();
    if endpoint.trim().is_empty() {
      return Err(FetchError::InvalidRequest(
        "endpoint must not be empty".to_string(),
      ));
    }
    if page_size == 0 {
      return Err(FetchError::InvalidRequest(
        "page size must be greater than zero".to_string(),
      ));
    }

    Ok(Self {
      endpoint,
      page_index: 0,
      page_size,
      sort: None,
      search_text: String::new(),
    })
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  pub fn page_index(&self) -> u32 {
    self.page_index
  }

  pub fn page_size(&self) -> u32 {
    self.page_size
  }

  pub fn sort(&self) -> Option<&Sort> {
    self.sort.as_ref()
  }

  /// Trimmed search text; empty means no search.
  pub fn search_text(&self) -> &str {
    &self.search_text
  }

  pub fn with_page(&self, page_index: u32) -> Self {
    Self {
      page_index,
      ..self.clone()
    }
  }

  /// Changing the page size restarts at the first page.
  pub fn with_page_size(&self, page_size: u32) -> Result<Self, FetchError> {
    if page_size == 0 {
      return Err(FetchError::InvalidRequest(
        "page size must be greater than zero".to_string(),
      ));
    }
    Ok(Self {
      page_index: 0,
      page_size,
      ..self.clone()
    })
  }

  /// Changing the sort restarts at the first page.
  pub fn with_sort(&self, sort: Option<Sort>) -> Self {
    Self {
      page_index: 0,
      sort,
      ..self.clone()
    }
  }

  /// Changing the search restarts at the first page.
  pub fn with_search(&self, text: &str) -> Self {
    Self {
      page_index: 0,
      search_text: text.trim().to_string(),
      ..self.clone()
    }
  }
}

impl fmt::Display for QueryDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} page {} (size {})",
      self.endpoint, self.page_index, self.page_size
    )?;
    if let Some(sort) = &self.sort {
      write!(f, " sorted by {} {}", sort.column, sort.order.as_str())?;
    }
    if !self.search_text.is_empty() {
      write!(f, " matching {:?}", self.search_text)?;
    }
    Ok(())
  }
}
