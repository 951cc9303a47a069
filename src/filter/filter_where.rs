use std::cmp::Ordering;

use serde_json::Value;

use super::error::FilterError;
use super::types::{Condition, FilterOp, FilterWhereInfo, SqlParam};

/// Parses Mongo-style where clauses and renders them either as JSONB SQL
/// (`body->'field'`) or as an in-process predicate over documents.
pub struct FilterWhere {
    params: Vec<SqlParam>,
    param_offset: usize,
}

impl FilterWhere {
    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    pub fn parse(where_data: &Value) -> Result<Condition, FilterError> {
        match where_data {
            Value::Null => Ok(Condition::And(vec![])),
            Value::Object(obj) => {
                let mut conditions = Vec::with_capacity(obj.len());
                for (key, value) in obj {
                    if key.starts_with('$') {
                        conditions.push(Self::parse_logical_operator(key, value)?);
                    } else {
                        Self::parse_field_condition(key, value, &mut conditions)?;
                    }
                }
                Ok(match conditions.len() {
                    1 => conditions.remove(0),
                    _ => Condition::And(conditions),
                })
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_logical_operator(op: &str, value: &Value) -> Result<Condition, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let parts = arr.iter().map(Self::parse).collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "$and" { Condition::And(parts) } else { Condition::Or(parts) })
            }
            "$not" => Ok(Condition::Not(Box::new(Self::parse(value)?))),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(field: &str, value: &Value, out: &mut Vec<Condition>) -> Result<(), FilterError> {
        Self::validate_column(field)?;
        match value {
            Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => {
                for (op_key, op_val) in obj {
                    let operator = Self::map_operator(op_key)?;
                    Self::validate_operand(operator, op_val)?;
                    out.push(Condition::Field(FilterWhereInfo {
                        column: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    }));
                }
            }
            // Implicit equality: { field: value }
            _ => out.push(Condition::Field(FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            })),
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Neq,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$exists" => FilterOp::Exists,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn validate_operand(operator: FilterOp, data: &Value) -> Result<(), FilterError> {
        match operator {
            FilterOp::Like | FilterOp::ILike if !data.is_string() => {
                Err(FilterError::InvalidOperatorData("$like/$ilike require a string pattern".to_string()))
            }
            FilterOp::In | FilterOp::NIn if !data.is_array() => {
                Err(FilterError::InvalidOperatorData("$in/$nin require an array".to_string()))
            }
            FilterOp::Between if data.as_array().map(|a| a.len()) != Some(2) => {
                Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string()))
            }
            FilterOp::Exists if !data.is_boolean() => {
                Err(FilterError::InvalidOperatorData("$exists requires a boolean".to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn validate_column(column: &str) -> Result<(), FilterError> {
        let mut chars = column.chars();
        let valid_start = chars.next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false);
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        Ok(())
    }

    /// Render a condition as SQL against the `body` JSONB column.
    /// Placeholders are numbered after `param_offset` already-bound parameters.
    pub fn generate(condition: &Condition, param_offset: usize) -> (String, Vec<SqlParam>) {
        let mut builder = Self { params: vec![], param_offset };
        let sql = builder.build_sql(condition);
        (sql, builder.params)
    }

    fn build_sql(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::And(parts) if parts.is_empty() => "TRUE".to_string(),
            Condition::Or(parts) if parts.is_empty() => "FALSE".to_string(),
            Condition::And(parts) => self.join(parts, " AND "),
            Condition::Or(parts) => self.join(parts, " OR "),
            Condition::Not(inner) => format!("NOT ({})", self.build_sql(inner)),
            Condition::Field(info) => self.build_field_sql(info),
        }
    }

    fn join(&mut self, parts: &[Condition], joiner: &str) -> String {
        let rendered: Vec<String> = parts.iter().map(|p| format!("({})", self.build_sql(p))).collect();
        rendered.join(joiner)
    }

    fn build_field_sql(&mut self, info: &FilterWhereInfo) -> String {
        let column = format!("body->'{}'", info.column);
        let text_column = format!("body->>'{}'", info.column);
        let absent = format!("({column} IS NULL OR {column} = 'null'::jsonb)");
        let data = &info.data;

        match info.operator {
            FilterOp::Eq if data.is_null() => absent,
            FilterOp::Neq if data.is_null() => format!("NOT {absent}"),
            FilterOp::Eq => format!("{} = {}", column, self.json_param(data)),
            FilterOp::Neq => format!("{} IS DISTINCT FROM {}", column, self.json_param(data)),
            FilterOp::Gt => format!("{} > {}", column, self.json_param(data)),
            FilterOp::Gte => format!("{} >= {}", column, self.json_param(data)),
            FilterOp::Lt => format!("{} < {}", column, self.json_param(data)),
            FilterOp::Lte => format!("{} <= {}", column, self.json_param(data)),
            FilterOp::Like => format!("{} LIKE {}", text_column, self.text_param(data)),
            FilterOp::ILike => format!("{} ILIKE {}", text_column, self.text_param(data)),
            FilterOp::In | FilterOp::NIn => {
                let values = data.as_array().cloned().unwrap_or_default();
                let negate = info.operator == FilterOp::NIn;
                if values.is_empty() {
                    return if negate { "TRUE".to_string() } else { "FALSE".to_string() };
                }
                let params: Vec<String> = values.iter().map(|v| self.json_param(v)).collect();
                if negate {
                    format!("({} OR {} NOT IN ({}))", absent, column, params.join(", "))
                } else {
                    format!("{} IN ({})", column, params.join(", "))
                }
            }
            FilterOp::Between => {
                let values = data.as_array().cloned().unwrap_or_default();
                let low = values.first().cloned().unwrap_or(Value::Null);
                let high = values.get(1).cloned().unwrap_or(Value::Null);
                format!("{} BETWEEN {} AND {}", column, self.json_param(&low), self.json_param(&high))
            }
            FilterOp::Exists => {
                if data.as_bool().unwrap_or(true) {
                    format!("NOT {absent}")
                } else {
                    absent
                }
            }
        }
    }

    fn json_param(&mut self, value: &Value) -> String {
        self.params.push(SqlParam::Json(value.clone()));
        format!("${}", self.param_offset + self.params.len())
    }

    fn text_param(&mut self, value: &Value) -> String {
        let text = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
        self.params.push(SqlParam::Text(text));
        format!("${}", self.param_offset + self.params.len())
    }

    /// Evaluate a condition against a document in process.
    pub fn matches(condition: &Condition, doc: &Value) -> bool {
        match condition {
            Condition::And(parts) => parts.iter().all(|p| Self::matches(p, doc)),
            Condition::Or(parts) => parts.iter().any(|p| Self::matches(p, doc)),
            Condition::Not(inner) => !Self::matches(inner, doc),
            Condition::Field(info) => Self::matches_field(info, doc),
        }
    }

    fn matches_field(info: &FilterWhereInfo, doc: &Value) -> bool {
        let field = doc.get(&info.column).filter(|v| !v.is_null());
        let data = &info.data;

        match info.operator {
            FilterOp::Eq if data.is_null() => field.is_none(),
            FilterOp::Neq if data.is_null() => field.is_some(),
            FilterOp::Eq => field.map(|v| json_eq(v, data)).unwrap_or(false),
            FilterOp::Neq => field.map(|v| !json_eq(v, data)).unwrap_or(true),
            FilterOp::Gt => cmp_field(field, data).map(|o| o == Ordering::Greater).unwrap_or(false),
            FilterOp::Gte => cmp_field(field, data).map(|o| o != Ordering::Less).unwrap_or(false),
            FilterOp::Lt => cmp_field(field, data).map(|o| o == Ordering::Less).unwrap_or(false),
            FilterOp::Lte => cmp_field(field, data).map(|o| o != Ordering::Greater).unwrap_or(false),
            FilterOp::Like | FilterOp::ILike => {
                let case_insensitive = info.operator == FilterOp::ILike;
                match (field.and_then(Value::as_str), data.as_str()) {
                    (Some(text), Some(pattern)) => like_match(text, pattern, case_insensitive),
                    _ => false,
                }
            }
            FilterOp::In => {
                let values = data.as_array().map(Vec::as_slice).unwrap_or(&[]);
                field.map(|v| values.iter().any(|d| json_eq(v, d))).unwrap_or(false)
            }
            FilterOp::NIn => {
                let values = data.as_array().map(Vec::as_slice).unwrap_or(&[]);
                field.map(|v| !values.iter().any(|d| json_eq(v, d))).unwrap_or(true)
            }
            FilterOp::Between => {
                let values = data.as_array().map(Vec::as_slice).unwrap_or(&[]);
                match (values.first(), values.get(1)) {
                    (Some(low), Some(high)) => {
                        cmp_field(field, low).map(|o| o != Ordering::Less).unwrap_or(false)
                            && cmp_field(field, high).map(|o| o != Ordering::Greater).unwrap_or(false)
                    }
                    _ => false,
                }
            }
            FilterOp::Exists => field.is_some() == data.as_bool().unwrap_or(true),
        }
    }
}

fn cmp_field(field: Option<&Value>, data: &Value) -> Option<Ordering> {
    field.and_then(|v| compare_values(v, data))
}

/// Order two JSON scalars of the same kind. Numbers compare numerically.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// SQL LIKE semantics: `%` matches any run, `_` matches one character.
fn like_match(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (text, pattern) = if case_insensitive {
        (text.to_lowercase(), pattern.to_lowercase())
    } else {
        (text.to_string(), pattern.to_string())
    };
    let t: Vec<char> = text.chars().collect();
    let p: Vec<char> = pattern.chars().collect();

    // Greedy matcher with backtracking on the last '%'
    let (mut ti, mut pi) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while ti < t.len() {
        match p.get(pi) {
            Some('%') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '_' || c == t[ti] => {
                ti += 1;
                pi += 1;
            }
            _ => match star {
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    star = Some((star_pi, star_ti + 1));
                }
                None => return false,
            },
        }
    }
    p[pi..].iter().all(|&c| c == '%')
}
