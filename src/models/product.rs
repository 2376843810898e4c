use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
}

/// Product as it appears on an assignment or return line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRef {
    pub id: Option<Uuid>,
    pub sku: String,
    pub name: String,
}

impl ProductRef {
    pub fn new(sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: None, sku: sku.into(), name: name.into() }
    }
}

impl From<Product> for ProductRef {
    fn from(product: Product) -> Self {
        Self { id: Some(product.id), sku: product.sku, name: product.name }
    }
}
