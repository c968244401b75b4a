use serde::Deserialize;

pub const MAX_PAGE_SIZE: u32 = 100;

/// Page selection passed explicitly into every listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: Option<u32>, page_size: Option<u32>, default_page_size: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_page_size).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Widened so that the largest page number cannot overflow.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    /// PostgREST `limit`/`offset` query fragment.
    pub fn to_query(&self) -> String {
        format!("limit={}&offset={}", self.limit(), self.offset())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    /// PostgREST `order` query fragment for `column`.
    pub fn order_clause(&self, column: &str) -> String {
        match self {
            SortOrder::Asc => format!("order={}.asc", column),
            SortOrder::Desc => format!("order={}.desc", column),
        }
    }
}
