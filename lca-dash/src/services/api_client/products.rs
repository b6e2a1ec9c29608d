//! Product endpoints

use super::{ApiClient, AuthPolicy};
use crate::error::ClientError;
use crate::models::{ProductDetail, ProductImpacts, ProductPage};

impl ApiClient {
    /// `GET /products?page=&limit=&search=`
    pub async fn list_products(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<ProductPage, ClientError> {
        let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            query.push(("search", term.trim().to_string()));
        }

        let request = self.http.get(self.url("/products")).query(&query);
        self.send_json(request, AuthPolicy::ExpireOn401).await
    }

    /// `GET /products/{id}`
    pub async fn get_product(&self, id: &str) -> Result<ProductDetail, ClientError> {
        let request = self.http.get(self.url(&format!("/products/{}", id)));
        self.send_json(request, AuthPolicy::ExpireOn401).await
    }

    /// `DELETE /products/{id}`
    pub async fn delete_product(&self, id: &str) -> Result<(), ClientError> {
        let request = self.http.delete(self.url(&format!("/products/{}", id)));
        self.send(request, AuthPolicy::ExpireOn401).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// `GET /products/{id}/impacts`
    pub async fn product_impacts(&self, id: &str) -> Result<ProductImpacts, ClientError> {
        let request = self.http.get(self.url(&format!("/products/{}/impacts", id)));
        self.send_json(request, AuthPolicy::ExpireOn401).await
    }
}
