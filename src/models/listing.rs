//! Tipos comunes de listados: filtros, búsqueda, orden y paginación

use serde::{Deserialize, Serialize};

use crate::utils::errors::{AppError, AppResult, FieldError};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Id,
    Name,
    Code,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Code => "code",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Opciones de listado que llegan en el body de `get-*`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "F: Deserialize<'de> + Default")
)]
pub struct ListQuery<F> {
    #[serde(default)]
    pub filters: F,
    pub search_term: Option<String>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
}

impl<F> ListQuery<F> {
    /// Patrón ILIKE para la búsqueda; `None` si no hay término útil
    pub fn search_pattern(&self) -> Option<String> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| format!("%{}%", term.replace('%', "\\%").replace('_', "\\_")))
    }

    pub fn matches_search(&self, haystacks: &[&str]) -> bool {
        match self.search_term.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let needle = term.to_lowercase();
                haystacks
                    .iter()
                    .any(|value| value.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Body de los listados paginados: las mismas opciones más página y tamaño
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "F: Deserialize<'de> + Default")
)]
pub struct PaginatedListQuery<F> {
    #[serde(flatten)]
    pub query: ListQuery<F>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl<F> PaginatedListQuery<F> {
    pub fn page_request(&self) -> AppResult<PageRequest> {
        PageRequest::new(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        let mut errors = Vec::new();
        if page < 1 {
            errors.push(FieldError::new(
                "page",
                "range",
                "page must be 1 or greater",
                Some(page.into()),
            ));
        }
        if page_size < 1 || page_size > MAX_PAGE_SIZE {
            errors.push(FieldError::new(
                "pageSize",
                "range",
                format!("pageSize must be between 1 and {}", MAX_PAGE_SIZE),
                Some(page_size.into()),
            ));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn new(page: PageRequest, total_count: i64) -> Self {
        let page_size = page.page_size as i64;
        let total_pages = (total_count + page_size - 1) / page_size;
        Self {
            current_page: page.page,
            page_size: page.page_size,
            total_count,
            total_pages,
            has_next_page: (page.page as i64) < total_pages,
            has_previous_page: page.page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Filters {
        active: Option<bool>,
    }

    #[test]
    fn test_pagination_metadata() {
        let page = PageRequest::new(Some(2), Some(10)).unwrap();
        let pagination = Pagination::new(page, 25);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_next_page);
        assert!(pagination.has_previous_page);
        assert_eq!(page.offset(), 10);

        let empty = Pagination::new(PageRequest::new(None, None).unwrap(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(101)).is_err());
        assert!(PageRequest::new(None, Some(100)).is_ok());
    }

    #[test]
    fn test_paginated_query_deserializes_flattened() {
        let query: PaginatedListQuery<Filters> = serde_json::from_value(json!({
            "filters": { "active": true },
            "searchTerm": "norte",
            "orderBy": [{ "field": "code", "direction": "desc" }],
            "page": 3,
            "pageSize": 5
        }))
        .unwrap();

        assert_eq!(query.query.filters.active, Some(true));
        assert_eq!(query.query.order_by[0].field, SortField::Code);
        assert_eq!(query.query.order_by[0].direction, SortDirection::Desc);
        assert_eq!(query.page_request().unwrap().offset(), 10);
    }

    #[test]
    fn test_search_matching() {
        let query: ListQuery<Filters> = serde_json::from_value(json!({ "searchTerm": "Nor" })).unwrap();
        assert!(query.matches_search(&["Terminal Norte", "TNO"]));
        assert!(!query.matches_search(&["Terminal Sur", "TSU"]));
        assert_eq!(query.search_pattern().as_deref(), Some("%Nor%"));

        let empty: ListQuery<Filters> = serde_json::from_value(json!({})).unwrap();
        assert!(empty.matches_search(&["anything"]));
        assert!(empty.search_pattern().is_none());
    }
}
