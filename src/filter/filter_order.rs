use std::cmp::Ordering;

use serde_json::Value;

use super::error::FilterError;
use super::filter_where::{compare_values, FilterWhere};
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // Expect array of strings like ["price desc", "name asc"]
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)),
                        other => return Err(FilterError::InvalidOrder(format!("unexpected order entry: {}", other))),
                    }
                }
                out
            }
            Value::Object(obj) => {
                // { "price": "desc", "name": "asc" }
                obj.iter()
                    .map(|(k, v)| FilterOrderInfo {
                        column: k.clone(),
                        sort: Self::direction(v.as_str().unwrap_or("asc")),
                    })
                    .collect()
            }
            Value::Null => vec![],
            other => return Err(FilterError::InvalidOrder(format!("unsupported order spec: {}", other))),
        };

        for info in &infos {
            FilterWhere::validate_column(&info.column)?;
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        // split on commas, then each token into column and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() { continue; }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let dir = it.next().unwrap_or("asc");
                out.push(FilterOrderInfo { column: col.to_string(), sort: Self::direction(dir) });
            }
        }
        out
    }

    fn direction(dir: &str) -> SortDirection {
        if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc }
    }

    /// ORDER BY over JSONB fields; `id` always breaks ties so paging is stable.
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        let mut parts: Vec<String> = infos
            .iter()
            .map(|i| format!("body->'{}' {} NULLS LAST", i.column, i.sort.to_sql()))
            .collect();
        parts.push("id ASC".to_string());
        format!("ORDER BY {}", parts.join(", "))
    }

    /// In-process ordering matching `generate`: missing values sort last.
    pub fn compare(infos: &[FilterOrderInfo], a: &Value, b: &Value) -> Ordering {
        for info in infos {
            let left = a.get(&info.column).filter(|v| !v.is_null());
            let right = b.get(&info.column).filter(|v| !v.is_null());
            let ordering = match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(l), Some(r)) => {
                    let ord = compare_values(l, r).unwrap_or(Ordering::Equal);
                    match info.sort {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_string_array_and_object_forms() {
        let from_str = FilterOrder::validate_and_parse(&json!("price desc, name")).unwrap();
        assert_eq!(from_str.len(), 2);
        assert_eq!(from_str[0].sort, SortDirection::Desc);
        assert_eq!(from_str[1].sort, SortDirection::Asc);

        let from_arr = FilterOrder::validate_and_parse(&json!(["rating desc"])).unwrap();
        assert_eq!(from_arr[0].column, "rating");

        let from_obj = FilterOrder::validate_and_parse(&json!({ "stock": "DESC" })).unwrap();
        assert_eq!(from_obj[0].sort, SortDirection::Desc);
    }

    #[test]
    fn rejects_injected_columns() {
        assert!(FilterOrder::validate_and_parse(&json!("price'; --")).is_err());
    }

    #[test]
    fn compare_puts_missing_last() {
        let infos = FilterOrder::validate_and_parse(&json!("rating desc")).unwrap();
        let rated = json!({ "rating": 4.5 });
        let unrated = json!({});
        assert_eq!(FilterOrder::compare(&infos, &rated, &unrated), Ordering::Less);
        assert_eq!(FilterOrder::compare(&infos, &json!({ "rating": 3 }), &rated), Ordering::Greater);
    }

    #[test]
    fn generate_adds_id_tiebreaker() {
        let infos = FilterOrder::validate_and_parse(&json!("price asc")).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY body->'price' ASC NULLS LAST, id ASC");
    }
}
