//! Best-effort NATS notifications. The service runs fine without a broker;
//! publish failures are logged, never surfaced to the request.

use crate::models::Order;

pub const ORDER_CREATED_SUBJECT: &str = "orders.created";

pub async fn publish_order_created(nats: &Option<async_nats::Client>, order: &Order) {
    let Some(client) = nats else { return };
    let payload = match serde_json::to_vec(order) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize order event");
            return;
        }
    };
    if let Err(e) = client
        .publish(ORDER_CREATED_SUBJECT.to_string(), payload.into())
        .await
    {
        tracing::warn!(error = %e, order_number = %order.order_number, "failed to publish order event");
    }
}
