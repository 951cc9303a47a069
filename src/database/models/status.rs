//! The one status → {icon, color_class} table for every rendered status.

use serde_json::{json, Map, Value};

use crate::database::models::order::OrderStatus;
use crate::database::models::ticket::TicketStatus;
use crate::types::StatusStyle;

impl OrderStatus {
    pub fn style(&self) -> StatusStyle {
        let (icon, color_class) = match self {
            OrderStatus::Pending => ("clock", "text-yellow-600 bg-yellow-100"),
            OrderStatus::Processing => ("refresh-cw", "text-blue-600 bg-blue-100"),
            OrderStatus::Packed => ("package", "text-indigo-600 bg-indigo-100"),
            OrderStatus::Shipped => ("truck", "text-purple-600 bg-purple-100"),
            OrderStatus::Delivered => ("check-circle", "text-green-600 bg-green-100"),
            OrderStatus::Cancelled => ("x-circle", "text-red-600 bg-red-100"),
        };
        StatusStyle { icon, color_class }
    }
}

impl TicketStatus {
    pub fn style(&self) -> StatusStyle {
        let (icon, color_class) = match self {
            TicketStatus::Open => ("alert-circle", "text-blue-600 bg-blue-100"),
            TicketStatus::InProgress => ("loader", "text-yellow-600 bg-yellow-100"),
            TicketStatus::WaitingForCustomer => ("message-circle", "text-orange-600 bg-orange-100"),
            TicketStatus::Resolved => ("check-circle", "text-green-600 bg-green-100"),
            TicketStatus::Closed => ("lock", "text-gray-600 bg-gray-100"),
        };
        StatusStyle { icon, color_class }
    }
}

/// Full table, keyed by status name, for clients.
pub fn style_table() -> Value {
    let orders: Map<String, Value> = OrderStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), json!(s.style())))
        .collect();
    let tickets: Map<String, Value> = TicketStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), json!(s.style())))
        .collect();
    json!({ "order": orders, "ticket": tickets })
}
