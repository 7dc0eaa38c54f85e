//! Order status workflow.
//!
//! ```text
//! pending ──accept──▶ accepted ──ready──▶ ready ─────────────┐
//!    │                                      │ (courier)       ├─delivered─▶ delivered
//!    └─decline─▶ declined                   └─▶ out_for_delivery
//! ```
//!
//! `declined` and `delivered` are terminal.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{DeliveryType, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Accept,
    Decline,
    Ready,
    Delivered,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Accept => "accept",
            OrderAction::Decline => "decline",
            OrderAction::Ready => "ready",
            OrderAction::Delivered => "delivered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {} an order that is {}", action.as_str(), from.as_str())]
pub struct TransitionError {
    pub from: OrderStatus,
    pub action: OrderAction,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Declined | OrderStatus::Delivered)
    }

    /// Actions an admin may take on an order in this status, in display order.
    pub fn available_actions(&self, delivery: DeliveryType) -> &'static [OrderAction] {
        match (self, delivery) {
            (OrderStatus::Pending, _) => &[OrderAction::Accept, OrderAction::Decline],
            (OrderStatus::Accepted, _) => &[OrderAction::Ready],
            (OrderStatus::Ready, _) => &[OrderAction::Delivered],
            (OrderStatus::OutForDelivery, DeliveryType::Delivery) => &[OrderAction::Delivered],
            _ => &[],
        }
    }

    /// Status reached by applying `action`. `Ready` on a delivery order
    /// lands on `ready`; the courier hand-off moves it further with
    /// [`OrderStatus::dispatched`].
    pub fn apply(
        self,
        action: OrderAction,
        delivery: DeliveryType,
    ) -> Result<OrderStatus, TransitionError> {
        if !self.available_actions(delivery).contains(&action) {
            return Err(TransitionError { from: self, action });
        }

        Ok(match action {
            OrderAction::Accept => OrderStatus::Accepted,
            OrderAction::Decline => OrderStatus::Declined,
            OrderAction::Ready => OrderStatus::Ready,
            OrderAction::Delivered => OrderStatus::Delivered,
        })
    }

    /// Status after the parcel was accepted by the courier.
    pub fn dispatched(self) -> Option<OrderStatus> {
        (self == OrderStatus::Ready).then_some(OrderStatus::OutForDelivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_accept_nothing() {
        for delivery in DeliveryType::ALL {
            assert!(OrderStatus::Declined.available_actions(delivery).is_empty());
            assert!(OrderStatus::Delivered.available_actions(delivery).is_empty());
        }
    }

    #[test]
    fn declined_cannot_move_forward() {
        let err = OrderStatus::Declined
            .apply(OrderAction::Accept, DeliveryType::Delivery)
            .unwrap_err();
        assert_eq!(err.from, OrderStatus::Declined);
        assert_eq!(err.to_string(), "cannot accept an order that is declined");
    }

    #[test]
    fn out_for_delivery_only_completes_for_delivery_orders() {
        assert_eq!(
            OrderStatus::OutForDelivery.apply(OrderAction::Delivered, DeliveryType::Delivery),
            Ok(OrderStatus::Delivered)
        );
        assert!(
            OrderStatus::OutForDelivery
                .apply(OrderAction::Delivered, DeliveryType::Pickup)
                .is_err()
        );
    }
}
