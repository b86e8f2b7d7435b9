//! Translation of [`Filter`] into parameterized Cosmos DB SQL.

use chathub_types::storage::Filter;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: Value,
}

/// Body of a Cosmos DB query request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    pub query: String,
    pub parameters: Vec<SqlParameter>,
}

impl SqlQuery {
    /// `SELECT * FROM c WHERE ...` for the given filter.
    pub fn select(filter: &Filter) -> Self {
        let mut parameters = Vec::new();
        let condition = condition(filter, &mut parameters);
        Self {
            query: format!("SELECT * FROM c WHERE {condition}"),
            parameters,
        }
    }

    pub fn by_id(id: &uuid::Uuid) -> Self {
        Self::select(&Filter::eq("id", id.to_string()))
    }
}

fn condition(filter: &Filter, parameters: &mut Vec<SqlParameter>) -> String {
    match filter {
        Filter::Eq { field, value } => {
            let name = format!("@p{}", parameters.len());
            let clause = format!("c[{}] = {name}", Value::String((*field).to_string()));
            parameters.push(SqlParameter {
                name,
                value: value.clone(),
            });
            clause
        }
        Filter::And(parts) if parts.is_empty() => "true".to_string(),
        Filter::And(parts) => parts
            .iter()
            .map(|part| condition(part, parameters))
            .collect::<Vec<_>>()
            .join(" AND "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_equality() {
        let query = SqlQuery::select(&Filter::eq("chatId", "abc"));
        assert_eq!(query.query, r#"SELECT * FROM c WHERE c["chatId"] = @p0"#);
        assert_eq!(
            query.parameters,
            vec![SqlParameter {
                name: "@p0".to_string(),
                value: json!("abc"),
            }]
        );
    }

    #[test]
    fn conjunction_numbers_parameters() {
        let filter = Filter::eq("userId", "alice").and(Filter::eq("chatId", "c1"));
        let query = SqlQuery::select(&filter);
        assert_eq!(
            query.query,
            r#"SELECT * FROM c WHERE c["userId"] = @p0 AND c["chatId"] = @p1"#
        );
        assert_eq!(query.parameters[1].value, json!("c1"));
    }

    #[test]
    fn serialized_body_shape() {
        let body = serde_json::to_value(SqlQuery::select(&Filter::eq("name", "a.txt"))).unwrap();
        assert_eq!(body["parameters"][0]["name"], "@p0");
        assert_eq!(body["parameters"][0]["value"], "a.txt");
    }
}
