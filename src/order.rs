//! # Orders
//!
//! The central entity. An order is created once with status `Received`,
//! advanced through the remaining stages by the status simulator, and is
//! immutable after `Delivered`. Wire field names stay camelCase so the
//! frontend payloads keep their shape.

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed lifecycle. Ordering matters: `Ord` follows lifecycle rank, so
/// `Received < Preparing < OutForDelivery < Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Order Received")]
    Received,
    Preparing,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const SEQUENCE: [OrderStatus; 4] = [
        OrderStatus::Received,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Index of this status within [`Self::SEQUENCE`].
    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Delivered
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Received => "Order Received",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One itemized validation failure, reported back as
/// `{"field": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Incoming create-order payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    pub items: Vec<OrderItem>,
    pub total_price: f64,
}

impl CreateOrder {
    /// Checks every field and collects all violations rather than stopping at
    /// the first, so the response can itemize them.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.customer_name.trim().len() < 2 {
            errors.push(FieldError::new("customerName", "Name is too short"));
        }
        if self.address.trim().len() < 5 {
            errors.push(FieldError::new("address", "Address is too short"));
        }
        if self.phone.trim().len() < 10 {
            errors.push(FieldError::new(
                "phone",
                "Phone number must be at least 10 digits",
            ));
        }

        if self.items.is_empty() {
            errors.push(FieldError::new("items", "Cart cannot be empty"));
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("items[{index}].name"),
                    "Item name is required",
                ));
            }
            if item.quantity < 1 {
                errors.push(FieldError::new(
                    format!("items[{index}].quantity"),
                    "Quantity must be at least 1",
                ));
            }
            if !item.price.is_finite() || item.price <= 0.0 {
                errors.push(FieldError::new(
                    format!("items[{index}].price"),
                    "Price must be positive",
                ));
            }
        }

        if !self.total_price.is_finite() || self.total_price < 0.0 {
            errors.push(FieldError::new(
                "totalPrice",
                "Total price cannot be negative",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Consumes the payload into a persisted record with a fresh id, initial
    /// status and creation timestamp assigned by the server.
    pub fn into_order(self) -> Order {
        Order {
            id: Uuid::new_v4().to_string(),
            customer_name: self.customer_name,
            address: self.address,
            phone: self.phone,
            items: self.items,
            total_price: self.total_price,
            status: OrderStatus::Received,
            created_at: Utc::now(),
        }
    }
}
