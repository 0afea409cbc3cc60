use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};

use super::{DataAccess, RemoteError, Row, Table};
use crate::core::RecordId;

/// Client for a PostgREST-style hosted table service (`/rest/v1/{table}`).
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, RemoteError> {
        let http = Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let resp = request.headers(self.headers()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }
        Ok(resp)
    }
}

impl DataAccess for RestClient {
    async fn select_all(
        &self,
        table: Table,
        order_column: &str,
        ascending: bool,
    ) -> Result<Vec<Row>, RemoteError> {
        let order = format!("{}.{}", order_column, if ascending { "asc" } else { "desc" });
        let request = self
            .http
            .get(self.table_url(table))
            .query(&[("select", "*"), ("order", order.as_str())]);
        let rows: Vec<Row> = self.send(request).await?.json().await?;
        log::debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    async fn insert(&self, table: Table, fields: Row) -> Result<Row, RemoteError> {
        let request = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&fields);
        let rows: Vec<Row> = self.send(request).await?.json().await?;
        rows.into_iter().next().ok_or(RemoteError::MissingRow(table))
    }

    async fn update(&self, table: Table, fields: Row, id: &RecordId) -> Result<(), RemoteError> {
        let request = self
            .http
            .patch(self.table_url(table))
            .query(&[("id", id_filter(id))])
            .json(&fields);
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<(), RemoteError> {
        let request = self
            .http
            .delete(self.table_url(table))
            .query(&[("id", id_filter(id))]);
        self.send(request).await?;
        Ok(())
    }
}

fn id_filter(id: &RecordId) -> String {
    format!("eq.{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_urls_drop_trailing_slash() {
        let client = RestClient::new("https://db.example.com/", "anon").unwrap();
        assert_eq!(
            client.table_url(Table::Todos),
            "https://db.example.com/rest/v1/todos"
        );
        assert_eq!(
            client.table_url(Table::Notes),
            "https://db.example.com/rest/v1/notes"
        );
    }

    #[test]
    fn auth_headers_carry_the_key() {
        let client = RestClient::new("https://db.example.com", "k3y").unwrap();
        let headers = client.headers();
        assert_eq!(headers.get("apikey").unwrap(), "k3y");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer k3y");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn id_filter_uses_equality_operator() {
        assert_eq!(id_filter(&RecordId::from("17")), "eq.17");
    }
}
