use serde_json::Value;
use strum_macros::Display;

/// Comparison applied by a row filter, rendered as `column=<op>.<value>`.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
}

/// Sort direction for [`super::QueryBuilder::order`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Placement of `NULL`s in an ordered column.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Nulls {
    #[strum(serialize = "nullsfirst")]
    First,
    #[strum(serialize = "nullslast")]
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Order {
    pub column: String,
    pub direction: Direction,
    pub nulls: Option<Nulls>,
}

impl Order {
    /// `column.asc`, `column.desc.nullsfirst`, …
    pub(crate) fn render(&self) -> String {
        match self.nulls {
            Some(nulls) => format!("{}.{}.{nulls}", self.column, self.direction),
            None => format!("{}.{}", self.column, self.direction),
        }
    }
}

/// Renders a filter operand: strings are used verbatim, `null` as `null` and everything
/// else as its JSON text.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Renders an `in` operand list as `(a,b,c)`.
pub(crate) fn render_list(values: &[Value]) -> String {
    let rendered: Vec<String> = values.iter().map(render_value).collect();
    format!("({})", rendered.join(","))
}
