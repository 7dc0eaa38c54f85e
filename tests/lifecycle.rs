use axum::http::StatusCode;
use gymfog_shop::{
    error::AppError,
    lifecycle::OrderAction,
    models::{DeliveryType, OrderStatus},
};

const ACTIONS: [OrderAction; 4] = [
    OrderAction::Accept,
    OrderAction::Decline,
    OrderAction::Ready,
    OrderAction::Delivered,
];

fn allowed(from: OrderStatus, action: OrderAction, delivery: DeliveryType) -> Option<OrderStatus> {
    match (from, action, delivery) {
        (OrderStatus::Pending, OrderAction::Accept, _) => Some(OrderStatus::Accepted),
        (OrderStatus::Pending, OrderAction::Decline, _) => Some(OrderStatus::Declined),
        (OrderStatus::Accepted, OrderAction::Ready, _) => Some(OrderStatus::Ready),
        (OrderStatus::Ready, OrderAction::Delivered, _) => Some(OrderStatus::Delivered),
        (OrderStatus::OutForDelivery, OrderAction::Delivered, DeliveryType::Delivery) => {
            Some(OrderStatus::Delivered)
        }
        _ => None,
    }
}

#[test]
fn every_status_action_pair_matches_the_table() {
    for delivery in DeliveryType::ALL {
        for from in OrderStatus::ALL {
            for action in ACTIONS {
                let result = from.apply(action, delivery);
                match allowed(from, action, delivery) {
                    Some(to) => assert_eq!(result, Ok(to), "{from} + {action:?} ({delivery})"),
                    None => {
                        let err = result.expect_err("transition should be rejected");
                        assert_eq!(err.from, from);
                        assert_eq!(err.action, action);
                    }
                }
            }
        }
    }
}

#[test]
fn available_actions_agree_with_apply() {
    for delivery in DeliveryType::ALL {
        for from in OrderStatus::ALL {
            for action in from.available_actions(delivery) {
                assert!(from.apply(*action, delivery).is_ok());
            }
        }
    }
}

#[test]
fn pickup_order_runs_to_delivered() {
    let mut status = OrderStatus::Pending;
    for action in [OrderAction::Accept, OrderAction::Ready, OrderAction::Delivered] {
        status = status.apply(action, DeliveryType::Pickup).unwrap();
    }
    assert_eq!(status, OrderStatus::Delivered);
    assert!(status.is_terminal());
}

#[test]
fn courier_dispatch_only_from_ready() {
    assert_eq!(
        OrderStatus::Ready.dispatched(),
        Some(OrderStatus::OutForDelivery)
    );
    assert_eq!(OrderStatus::Accepted.dispatched(), None);
    assert_eq!(OrderStatus::OutForDelivery.dispatched(), None);
}

#[test]
fn statuses_round_trip_through_their_names() {
    for status in OrderStatus::ALL {
        assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
    }
    assert!("shipped".parse::<OrderStatus>().is_err());
}

#[test]
fn unreadable_stored_status_is_a_server_error() {
    assert_eq!(
        OrderStatus::from_stored("out_for_delivery").unwrap(),
        OrderStatus::OutForDelivery
    );
    let err = OrderStatus::from_stored("shipped").unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(DeliveryType::from_stored("drone").is_err());
}
