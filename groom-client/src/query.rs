// groom-client/src/query.rs
// Table query model: filters, ordering and their PostgREST encoding

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Filter operator
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Column equals the value (`null` matches a missing column)
    Eq(Value),
    /// Column equals any of the values
    In(Vec<Value>),
    /// Case-insensitive pattern match, `%` matches any run of characters
    ILike(String),
}

/// Filter on one column
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn in_list<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::In(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::ILike(pattern.into()),
        }
    }

    /// Evaluate the filter against a JSON row
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        let value = row.get(&self.column).unwrap_or(&Value::Null);
        match &self.op {
            FilterOp::Eq(expected) => value == expected,
            FilterOp::In(values) => values.iter().any(|v| v == value),
            FilterOp::ILike(pattern) => match value {
                Value::String(s) => ilike_matches(pattern, s),
                _ => false,
            },
        }
    }

    /// PostgREST query parameter, e.g. `("breed_id", "in.(1,2)")`
    pub fn to_query_pair(&self) -> (String, String) {
        let encoded = match &self.op {
            FilterOp::Eq(Value::Null) => "is.null".to_string(),
            FilterOp::Eq(value) => format!("eq.{}", render_value(value, false)),
            FilterOp::In(values) => {
                let items: Vec<String> = values.iter().map(|v| render_value(v, true)).collect();
                format!("in.({})", items.join(","))
            }
            FilterOp::ILike(pattern) => format!("ilike.{}", pattern.replace('%', "*")),
        };
        (self.column.clone(), encoded)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Ordering on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }

    fn encode(&self) -> String {
        match self.direction {
            Direction::Asc => format!("{}.asc", self.column),
            Direction::Desc => format!("{}.desc", self.column),
        }
    }
}

/// Select query against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    /// Projected columns; empty selects every column
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    /// Encode as PostgREST query parameters
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 2);
        let select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        pairs.push(("select".to_string(), select));
        pairs.extend(self.filters.iter().map(Filter::to_query_pair));
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(Order::encode).collect();
            pairs.push(("order".to_string(), order.join(",")));
        }
        pairs
    }

    /// Compare two rows by this query's ordering
    pub fn compare_rows(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        for order in &self.order {
            let left = a.get(&order.column).unwrap_or(&Value::Null);
            let right = b.get(&order.column).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            let ord = match order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Encode a list of filters as query parameters
pub fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(Filter::to_query_pair).collect()
}

fn render_value(value: &Value, quote: bool) -> String {
    match value {
        Value::String(s) if quote && s.contains([',', '(', ')', '"', ' ']) => {
            format!("\"{}\"", s.replace('"', "\\\""))
        }
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Nulls sort first; mixed types compare by type rank
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn ilike_matches(pattern: &str, text: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();
    let parts: Vec<&str> = pattern.split('%').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut rest = text.as_str();
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == last {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_select_encoding() {
        let query = Select::from("station_breed_rules")
            .columns(["station_id", "breed_id", "is_active"])
            .eq("breed_id", 7)
            .filter(Filter::in_list("station_id", [1, 2, 3]))
            .order_by(Order::asc("station_id"))
            .order_by(Order::desc("breed_id"));

        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("select".to_string(), "station_id,breed_id,is_active".to_string()),
                ("breed_id".to_string(), "eq.7".to_string()),
                ("station_id".to_string(), "in.(1,2,3)".to_string()),
                ("order".to_string(), "station_id.asc,breed_id.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_filter_encoding() {
        assert_eq!(Filter::eq("notes", Value::Null).to_query_pair().1, "is.null");
        assert_eq!(Filter::eq("is_active", true).to_query_pair().1, "eq.true");
        assert_eq!(Filter::ilike("name", "%poo%").to_query_pair().1, "ilike.*poo*");
        assert_eq!(
            Filter::in_list("name", ["Pug", "Shih Tzu"]).to_query_pair().1,
            "in.(Pug,\"Shih Tzu\")"
        );
        assert_eq!(Select::from("breeds").to_query_pairs()[0].1, "*");
    }

    #[test]
    fn test_filter_matches() {
        let r = row(json!({"id": 3, "name": "Standard Poodle", "size_class": null}));
        assert!(Filter::eq("id", 3).matches(&r));
        assert!(!Filter::eq("id", 4).matches(&r));
        assert!(Filter::eq("size_class", Value::Null).matches(&r));
        assert!(Filter::eq("missing", Value::Null).matches(&r));
        assert!(Filter::in_list("id", [1, 3]).matches(&r));
        assert!(Filter::ilike("name", "%poodle").matches(&r));
        assert!(Filter::ilike("name", "standard%").matches(&r));
        assert!(Filter::ilike("name", "%AND%OO%").matches(&r));
        assert!(!Filter::ilike("name", "%terrier%").matches(&r));
        assert!(!Filter::ilike("id", "%3%").matches(&r));
    }

    #[test]
    fn test_compare_rows() {
        let query = Select::from("stations")
            .order_by(Order::asc("display_order"))
            .order_by(Order::desc("name"));
        let a = row(json!({"display_order": 1, "name": "A"}));
        let b = row(json!({"display_order": 1, "name": "B"}));
        let c = row(json!({"display_order": null, "name": "C"}));
        assert_eq!(query.compare_rows(&a, &b), Ordering::Greater);
        assert_eq!(query.compare_rows(&c, &a), Ordering::Less);
    }
}
