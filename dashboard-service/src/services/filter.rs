//! Builder for Xero `where` filter expressions.
//!
//! Field names come from a closed enum, search text may not contain `"` or
//! `\`, and every literal is escaped, so user input can only ever appear
//! inside a quoted string.

use std::fmt;
use std::str::FromStr;

use crate::error::XeroError;
use crate::models::InvoiceStatus;

/// Longest accepted search string.
pub const MAX_SEARCH_LEN: usize = 100;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Fields that may appear on the left-hand side of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Status,
    ContactName,
    InvoiceNumber,
    Name,
    EmailAddress,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Status => "Status",
            Field::ContactName => "Contact.Name",
            Field::InvoiceNumber => "InvoiceNumber",
            Field::Name => "Name",
            Field::EmailAddress => "EmailAddress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Eq(Field, String),
    Contains(Field, String),
    Any(Vec<Expr>),
    All(Vec<Expr>),
}

impl Expr {
    pub fn eq(field: Field, value: impl Into<String>) -> Self {
        Expr::Eq(field, value.into())
    }

    pub fn contains(field: Field, value: impl Into<String>) -> Self {
        Expr::Contains(field, value.into())
    }

    pub fn render(&self) -> String {
        self.render_nested(false)
    }

    fn render_nested(&self, nested: bool) -> String {
        if let Expr::Any(terms) = self {
            debug_assert!(!terms.is_empty(), "empty OR expression");
        }
        match self {
            Expr::Eq(field, value) => format!("{}=\"{}\"", field.as_str(), escape_literal(value)),
            Expr::Contains(field, value) => {
                format!("{}.Contains(\"{}\")", field.as_str(), escape_literal(value))
            }
            Expr::Any(terms) => match terms.as_slice() {
                [single] => single.render_nested(nested),
                _ => format!(
                    "({})",
                    terms
                        .iter()
                        .map(|t| t.render_nested(true))
                        .collect::<Vec<_>>()
                        .join(" OR ")
                ),
            },
            Expr::All(terms) => {
                debug_assert!(!terms.is_empty(), "empty AND expression");
                let joined = terms
                    .iter()
                    .map(|t| t.render_nested(true))
                    .collect::<Vec<_>>()
                    .join(" AND ");
                if nested && terms.len() > 1 {
                    format!("({})", joined)
                } else {
                    joined
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escape a value for use inside a double-quoted Xero string literal.
pub fn escape_literal(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Validated free-text search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchText(String);

impl SearchText {
    /// Blank input means "no search" and yields `Ok(None)`.
    pub fn parse(raw: &str) -> Result<Option<Self>, XeroError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.chars().count() > MAX_SEARCH_LEN {
            return Err(XeroError::MalformedFilterInput(format!(
                "search text must be at most {} characters",
                MAX_SEARCH_LEN
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(XeroError::MalformedFilterInput(
                "search text must not contain control characters".to_string(),
            ));
        }
        // Xero's where grammar documents no escape for either
        if trimmed.contains(&['"', '\\'][..]) {
            return Err(XeroError::MalformedFilterInput(
                "search text must not contain quotes or backslashes".to_string(),
            ));
        }
        Ok(Some(Self(trimmed.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Status selector for the invoice list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Unsent invoices only: draft, submitted or authorised.
    #[default]
    All,
    Only(InvoiceStatus),
}

impl FromStr for StatusFilter {
    type Err = XeroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<InvoiceStatus>()
            .map(StatusFilter::Only)
            .map_err(XeroError::MalformedFilterInput)
    }
}

impl StatusFilter {
    pub fn to_expr(self) -> Expr {
        match self {
            StatusFilter::All => Expr::Any(
                InvoiceStatus::UNSENT
                    .iter()
                    .map(|s| Expr::eq(Field::Status, s.as_str()))
                    .collect(),
            ),
            StatusFilter::Only(status) => Expr::eq(Field::Status, status.as_str()),
        }
    }
}

fn positive(value: u32, name: &str) -> Result<u32, XeroError> {
    if value == 0 {
        return Err(XeroError::MalformedFilterInput(format!(
            "{} must be a positive integer",
            name
        )));
    }
    Ok(value)
}

/// Options for listing invoices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceQuery {
    pub status: StatusFilter,
    pub search: Option<SearchText>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for InvoiceQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            search: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl InvoiceQuery {
    /// Most recently updated first.
    pub const ORDER: &'static str = "UpdatedDateUTC DESC";

    pub fn new(
        status: StatusFilter,
        search: Option<SearchText>,
        page: u32,
        page_size: u32,
    ) -> Result<Self, XeroError> {
        Ok(Self {
            status,
            search,
            page: positive(page, "page")?,
            page_size: positive(page_size, "pageSize")?,
        })
    }

    pub fn to_expr(&self) -> Expr {
        let mut clauses = vec![self.status.to_expr()];
        if let Some(search) = &self.search {
            clauses.push(Expr::Any(vec![
                Expr::contains(Field::ContactName, search.as_str()),
                Expr::contains(Field::InvoiceNumber, search.as_str()),
            ]));
        }
        Expr::All(clauses)
    }

    pub fn where_clause(&self) -> String {
        self.to_expr().render()
    }

    /// Query parameters for `GET /Invoices`.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("where", self.where_clause()),
            ("order", Self::ORDER.to_string()),
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ]
    }
}

/// Options for listing contacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactQuery {
    pub search: Option<SearchText>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ContactQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ContactQuery {
    pub const ORDER: &'static str = "Name ASC";

    pub fn new(search: Option<SearchText>, page: u32, page_size: u32) -> Result<Self, XeroError> {
        Ok(Self {
            search,
            page: positive(page, "page")?,
            page_size: positive(page_size, "pageSize")?,
        })
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        if let Some(search) = &self.search {
            let expr = Expr::Any(vec![
                Expr::contains(Field::Name, search.as_str()),
                Expr::contains(Field::EmailAddress, search.as_str()),
            ]);
            params.push(("where", expr.render()));
        }
        params.push(("order", Self::ORDER.to_string()));
        params.push(("page", self.page.to_string()));
        params.push(("pageSize", self.page_size.to_string()));
        params
    }
}
