//! Collections and the query model shared by all backends

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stored record as a JSON object
pub type Row = Map<String, Value>;

/// Tables known to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Pre-registered roster
    DaftarNama,
    /// Check-in records
    DaftarHadir,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Self::DaftarNama => "daftar_nama",
            Self::DaftarHadir => "daftar_hadir",
        }
    }

    /// Columns carrying a unique constraint (nulls never conflict)
    pub fn unique_columns(self) -> &'static [&'static str] {
        match self {
            Self::DaftarNama => &[],
            Self::DaftarHadir => &["uuid"],
        }
    }

    /// Timestamp column filled in by the backend when absent
    pub fn timestamp_column(self) -> &'static str {
        match self {
            Self::DaftarNama => "created_at",
            Self::DaftarHadir => "check_in",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// `column IN (values)`
    In(String, Vec<Value>),
    /// Case-insensitive substring match; `*` in the needle matches any run
    /// of characters, everything else is literal
    Contains(String, String),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _) | Self::In(c, _) | Self::Contains(c, _) => c,
        }
    }

    /// Evaluate against a row
    pub fn matches(&self, row: &Row) -> bool {
        let field = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Self::Eq(_, value) => field == value,
            Self::In(_, values) => values.contains(field),
            Self::Contains(_, needle) => field
                .as_str()
                .is_some_and(|s| contains_pattern(&s.to_lowercase(), &needle.to_lowercase())),
        }
    }
}

/// Whether the `*`-separated pieces of `needle` occur in `haystack` in order
fn contains_pattern(haystack: &str, needle: &str) -> bool {
    let mut rest = haystack;
    for piece in needle.split('*') {
        match rest.find(piece) {
            Some(at) => rest = &rest[at + piece.len()..],
            None => return false,
        }
    }
    true
}

/// Escape LIKE metacharacters so they match literally; `*` stays a wildcard
/// since PostgREST rewrites it before the pattern reaches the database
fn like_literal(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// Select query over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: Collection,
    /// Projected columns; empty means all
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn is_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn contains(mut self, column: &str, needle: &str) -> Self {
        self.filters
            .push(Filter::Contains(column.to_string(), needle.to_string()));
        self
    }

    pub fn order_by(mut self, column: &str, descending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter, order, limit and project `rows` in memory
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> Vec<Row> {
        let mut selected: Vec<&Row> = rows
            .into_iter()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .collect();

        if let Some(order) = &self.order {
            selected.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.descending { ord.reverse() } else { ord }
            });
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }

        selected.into_iter().map(|row| self.project(row)).collect()
    }

    fn project(&self, row: &Row) -> Row {
        if self.columns.is_empty() {
            return row.clone();
        }
        self.columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect()
    }

    /// PostgREST query-string pairs
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        params.push(("select".to_string(), select));

        for filter in &self.filters {
            let expr = match filter {
                Filter::Eq(_, value) => format!("eq.{}", literal(value)),
                Filter::In(_, values) => format!(
                    "in.({})",
                    values.iter().map(quoted).collect::<Vec<_>>().join(",")
                ),
                Filter::Contains(_, needle) => format!("ilike.*{}*", like_literal(needle)),
            };
            params.push((filter.column().to_string(), expr));
        }
        if let Some(order) = &self.order {
            let dir = if order.descending { "desc" } else { "asc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Value inside a PostgREST `in.(...)` list
fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => literal(other),
    }
}

/// Order two JSON values: timestamps chronologically, numbers numerically,
/// everything else as strings; nulls sort first
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => match (parse_time(x), parse_time(y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(y),
        },
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
