use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

use crate::error::AppError;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Query string accepted by every `/all` endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A validated [`ListQuery`].
#[derive(Debug, Clone)]
pub struct ListParams {
    pub search: Option<String>,
    pub created_from: Option<OffsetDateTime>,
    /// Exclusive upper bound.
    pub created_until: Option<OffsetDateTime>,
    pub sort: &'static str,
    pub order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl ListQuery {
    /// `sortable` lists the columns a caller may sort by; the first entry
    /// must be `created_at`.
    pub fn resolve(&self, sortable: &[&'static str]) -> Result<ListParams, AppError> {
        let sort = match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => "created_at",
            Some(requested) => sortable
                .iter()
                .copied()
                .find(|c| *c == requested)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid sort field: {}", requested)))?,
        };

        let order = match self.order.as_deref().map(str::trim) {
            None | Some("") => SortOrder::Desc,
            Some(o) if o.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(o) if o.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            Some(_) => {
                return Err(AppError::BadRequest(
                    "order must be one of the following values: ASC, DESC".into(),
                ))
            }
        };

        let page = parse_number(self.page.as_deref()).unwrap_or(1).max(1);
        let limit = parse_number(self.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        let created_from = self
            .start_date
            .as_deref()
            .map(|d| parse_day(d, "start_date"))
            .transpose()?
            .map(|d| d.midnight().assume_utc());
        let created_until = self
            .end_date
            .as_deref()
            .map(|d| parse_day(d, "end_date"))
            .transpose()?
            .map(|d| {
                d.next_day()
                    .map(|n| n.midnight().assume_utc())
                    .unwrap_or_else(|| d.midnight().assume_utc())
            });

        Ok(ListParams {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            created_from,
            created_until,
            sort,
            order,
            page,
            limit,
        })
    }
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
}

fn parse_day(raw: &str, field: &str) -> Result<Date, AppError> {
    let raw = raw.trim();
    if let Ok(d) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(d);
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .map(|dt| dt.date())
        .map_err(|_| AppError::BadRequest(format!("{} must be a valid ISO 8601 date string", field)))
}

impl ListParams {
    /// Saturates instead of overflowing for absurd `page` values; the query
    /// then simply returns no rows.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }

    /// Appends the `WHERE` clause: live rows only, then search and date range.
    /// `alias` qualifies columns, e.g. `"s."`; pass `""` for none.
    pub fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>, alias: &str) {
        qb.push(format!(" WHERE {}is_deleted = 0", alias));
        if let Some(search) = &self.search {
            qb.push(format!(" AND {}name ILIKE ", alias))
                .push_bind(format!("%{}%", escape_like(search)));
        }
        if let Some(from) = self.created_from {
            qb.push(format!(" AND {}created_at >= ", alias)).push_bind(from);
        }
        if let Some(until) = self.created_until {
            qb.push(format!(" AND {}created_at < ", alias)).push_bind(until);
        }
    }

    /// Appends `ORDER BY`, `LIMIT` and `OFFSET`. The sort column comes from
    /// a whitelist, so it is safe to splice.
    pub fn push_page(&self, qb: &mut QueryBuilder<'_, Postgres>, alias: &str) {
        qb.push(format!(
            " ORDER BY {}{} {}, {}id {}",
            alias,
            self.sort,
            self.order.as_sql(),
            alias,
            self.order.as_sql()
        ));
        qb.push(" LIMIT ").push_bind(self.limit);
        qb.push(" OFFSET ").push_bind(self.offset());
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_pages: String,
    pub total_records: String,
}

#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub records: Vec<T>,
    pub pagination: PageInfo,
}

impl<T: Serialize> Page<T> {
    pub fn new(records: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            records,
            pagination: PageInfo {
                total_pages: params.total_pages(total).to_string(),
                total_records: total.to_string(),
            },
        }
    }
}
