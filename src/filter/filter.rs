use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Condition, FilterData, FilterOrderInfo, SqlResult};

/// Compiled query over one document collection.
#[derive(Debug, Clone)]
pub struct Filter {
    condition: Condition,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter {
    pub fn new() -> Self {
        Self {
            condition: Condition::And(vec![]),
            order_data: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn from_data(data: &FilterData) -> Result<Self, FilterError> {
        let mut filter = Self::new();
        filter.assign(data)?;
        Ok(filter)
    }

    pub fn assign(&mut self, data: &FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = &data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = &data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset); }
        else if let Some(offset) = data.offset { self.offset = Some(offset); }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: &Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(conditions)?;
        self.condition = FilterWhere::parse(conditions)?;
        Ok(self)
    }

    pub fn order(&mut self, order_spec: &Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: u32, offset: Option<u32>) -> &mut Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// `SELECT body` over the `documents` table. `$1` is reserved for the collection name.
    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.condition, 1);
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT body FROM documents".to_string(),
            format!("WHERE collection = $1 AND ({})", where_clause),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.condition, 1);
        SqlResult {
            query: format!("SELECT COUNT(*) FROM documents WHERE collection = $1 AND ({})", where_clause),
            params,
        }
    }

    /// Evaluate against documents already in id (creation) order.
    pub fn apply(&self, docs: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut matched: Vec<Value> = docs
            .into_iter()
            .filter(|doc| FilterWhere::matches(&self.condition, doc))
            .collect();

        if !self.order_data.is_empty() {
            // stable sort keeps id order for ties, like the SQL tiebreaker
            matched.sort_by(|a, b| FilterOrder::compare(&self.order_data, a, b));
        }

        let offset = self.offset.unwrap_or(0) as usize;
        let iter = matched.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        }
    }

    pub fn count<'a>(&self, docs: impl IntoIterator<Item = &'a Value>) -> u64 {
        docs.into_iter()
            .filter(|doc| FilterWhere::matches(&self.condition, doc))
            .count() as u64
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
