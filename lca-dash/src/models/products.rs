//! Products, their materials and impact results

use serde::{Deserialize, Serialize};

use super::{id_string, opt_id_string};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub materials_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One page of `GET /products`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default, alias = "items")]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMaterial {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub activity_uuid: Option<String>,
}

/// `GET /products/{id}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default)]
    pub materials: Vec<ProductMaterial>,
}

/// One quantified environmental metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub method: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

/// Impacts attributed to one material of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialImpact {
    pub material: String,
    #[serde(default)]
    pub impacts: Vec<Impact>,
}

/// `GET /products/{id}/impacts`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImpacts {
    #[serde(deserialize_with = "id_string")]
    pub product_id: String,
    #[serde(default)]
    pub impacts: Vec<Impact>,
    #[serde(default)]
    pub material_impacts: Vec<MaterialImpact>,
}
