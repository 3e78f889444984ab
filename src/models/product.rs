use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// A stored catalog row. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    /// UTC ISO-8601 with a trailing `Z`, never modified after insert.
    pub created_at: String,
}

/// Validated, writable fields of a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

// ── Request payload ──────────────────────────────────────────────────────────

/// Raw JSON body of a create or update request. Fields holding `null` count as absent.
#[derive(Debug, Default)]
pub struct ProductPayload {
    name: Option<Value>,
    price: Option<Value>,
    stock: Option<Value>,
}

impl ProductPayload {
    pub fn from_slice(body: &[u8]) -> AppResult<Self> {
        let mut object: Map<String, Value> = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidPayload(format!("body must be a JSON object: {e}")))?;

        let mut take = |key: &str| object.remove(key).filter(|v| !v.is_null());
        Ok(Self {
            name: take("name"),
            price: take("price"),
            stock: take("stock"),
        })
    }

    /// Checks a create request. Missing `price` and `stock` default to zero.
    pub fn into_new_product(self) -> AppResult<ProductFields> {
        let name = match &self.name {
            Some(v) => parse_name(v)?,
            None => String::new(),
        };
        let price = self.price.as_ref().map(parse_price).transpose()?.unwrap_or(0.0);
        let stock = self.stock.as_ref().map(parse_stock).transpose()?.unwrap_or(0);

        ProductFields { name, price, stock }.checked()
    }

    /// Checks an update request, filling unspecified fields from `existing`.
    /// An empty `name` string is treated as unspecified.
    pub fn merge_onto(self, existing: &Product) -> AppResult<ProductFields> {
        let name = match &self.name {
            Some(Value::String(s)) if s.is_empty() => existing.name.trim().to_string(),
            Some(v) => parse_name(v)?,
            None => existing.name.trim().to_string(),
        };
        let price = match &self.price {
            Some(v) => parse_price(v)?,
            None => existing.price,
        };
        let stock = match &self.stock {
            Some(v) => parse_stock(v)?,
            None => existing.stock,
        };

        ProductFields { name, price, stock }.checked()
    }
}

impl ProductFields {
    fn checked(self) -> AppResult<Self> {
        if self.name.is_empty() {
            return Err(AppError::InvalidPayload("name must not be empty".to_string()));
        }
        if self.price < 0.0 {
            return Err(AppError::InvalidPayload("price must be >= 0".to_string()));
        }
        if self.stock < 0 {
            return Err(AppError::InvalidPayload("stock must be >= 0".to_string()));
        }
        Ok(self)
    }
}

// ── Field parsers ────────────────────────────────────────────────────────────

fn parse_name(value: &Value) -> AppResult<String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        _ => Err(AppError::InvalidPayload("name must be a string".to_string())),
    }
}

fn parse_price(value: &Value) -> AppResult<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match price {
        Some(p) if p.is_finite() => Ok(p),
        _ => Err(AppError::InvalidPayload("price must be a number".to_string())),
    }
}

fn parse_stock(value: &Value) -> AppResult<i64> {
    let stock = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    stock.ok_or_else(|| AppError::InvalidPayload("stock must be an integer".to_string()))
}
