//! List filters in the remote store's JSON query form.

use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Equal,
    NotEqual,
    OrderAsc,
    OrderDesc,
    Limit,
    Offset,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Equal => "equal",
            Method::NotEqual => "notEqual",
            Method::OrderAsc => "orderAsc",
            Method::OrderDesc => "orderDesc",
            Method::Limit => "limit",
            Method::Offset => "offset",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    method: Method,
    attribute: Option<String>,
    values: Vec<Value>,
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            method: Method::Equal,
            attribute: Some(attribute.into()),
            values: vec![value.into()],
        }
    }

    pub fn not_equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            method: Method::NotEqual,
            attribute: Some(attribute.into()),
            values: vec![value.into()],
        }
    }

    pub fn order_asc(attribute: impl Into<String>) -> Self {
        Self {
            method: Method::OrderAsc,
            attribute: Some(attribute.into()),
            values: Vec::new(),
        }
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Self {
            method: Method::OrderDesc,
            attribute: Some(attribute.into()),
            values: Vec::new(),
        }
    }

    pub fn limit(limit: u32) -> Self {
        Self {
            method: Method::Limit,
            attribute: None,
            values: vec![limit.into()],
        }
    }

    pub fn offset(offset: u32) -> Self {
        Self {
            method: Method::Offset,
            attribute: None,
            values: vec![offset.into()],
        }
    }

    pub fn to_value(&self) -> Value {
        let mut out = json!({ "method": self.method.as_str() });
        if let Some(attribute) = &self.attribute {
            out["attribute"] = Value::String(attribute.clone());
        }
        if !self.values.is_empty() {
            out["values"] = Value::Array(self.values.clone());
        }
        out
    }

    /// Encoded form sent as one `queries[]` parameter.
    pub fn to_param(&self) -> String {
        self.to_value().to_string()
    }
}

/// Filter applied when listing posts without explicit queries.
pub fn active_posts() -> Vec<Query> {
    vec![Query::equal("status", "active")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_carries_attribute_and_single_value() {
        assert_eq!(
            Query::equal("status", "active").to_value(),
            json!({ "method": "equal", "attribute": "status", "values": ["active"] })
        );
    }

    #[test]
    fn ordering_has_no_values() {
        assert_eq!(
            Query::order_desc("$createdAt").to_value(),
            json!({ "method": "orderDesc", "attribute": "$createdAt" })
        );
    }

    #[test]
    fn paging_has_no_attribute() {
        assert_eq!(
            Query::limit(25).to_param(),
            r#"{"method":"limit","values":[25]}"#
        );
        assert_eq!(
            Query::offset(50).to_value(),
            json!({ "method": "offset", "values": [50] })
        );
    }

    #[test]
    fn default_filter_selects_active_posts() {
        assert_eq!(active_posts(), vec![Query::equal("status", "active")]);
    }
}
