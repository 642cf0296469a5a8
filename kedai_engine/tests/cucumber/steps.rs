use chrono::{Duration, Utc};
use cucumber::{then, when};
use kedai_engine::{
    db_types::{OrderStatusType, PaymentStatus, Rupiah},
    order_objects::NewOrderRequest,
    EngineError,
};
use regex::Regex;

use crate::cucumber::{
    world::{principal, product},
    KedaiWorld,
};

#[when(expr = "{word} places a {word} order for {int} {string} and {int} {string}")]
async fn place_order(
    world: &mut KedaiWorld,
    who: String,
    order_type: String,
    n1: i64,
    p1: String,
    n2: i64,
    p2: String,
) {
    let (id1, price1) = product(&p1);
    let (id2, price2) = product(&p2);
    let request = NewOrderRequest::new(who.as_str(), None, &order_type)
        .with_item(id1, n1, Rupiah::from(price1))
        .with_item(id2, n2, Rupiah::from(price2));
    let created = world.sys().orders.create_order(request, &principal(&who)).await.expect("Error placing order");
    world.order = Some(created);
}

#[when(expr = "{word} requests a payment of {int}")]
async fn request_payment(world: &mut KedaiWorld, who: String, amount: i64) {
    let order_id = world.order_id();
    let ticket = world
        .sys()
        .payments
        .request_payment(order_id, Rupiah::from(amount), &principal(&who))
        .await
        .expect("Error requesting payment");
    world.tickets.push(ticket);
}

#[when(expr = "{word} confirms the payment")]
async fn confirm_payment(world: &mut KedaiWorld, who: String) {
    let id = world.ticket().payment_id.clone();
    let result = world.sys().payments.confirm_payment(&id, &principal(&who)).await;
    if let Err(e) = result {
        world.last_error = Some(e);
    }
}

#[when("the payment expiry passes")]
async fn expire_payment(world: &mut KedaiWorld) {
    let id = world.ticket().payment_id.clone();
    world.sys().set_payment_expiry(&id, Utc::now() - Duration::seconds(1)).await;
}

#[when(expr = "staff move the order to {word}")]
async fn move_order(world: &mut KedaiWorld, status: String) {
    let order_id = world.order_id();
    let result = world.sys().orders.update_order_status(order_id, &status, &principal("staff"), None).await;
    match result {
        Ok(changed) => assert!(changed, "Order did not change status"),
        Err(e) => world.last_error = Some(e),
    }
}

#[then(expr = "the order total is {int}")]
async fn order_total(world: &mut KedaiWorld, total: i64) {
    assert_eq!(world.order.as_ref().expect("No order").total, Rupiah::from(total));
}

#[then(expr = "the queue id is {word} followed by {int} digits")]
async fn queue_id_format(world: &mut KedaiWorld, prefix: String, digits: usize) {
    let queue_id = &world.order.as_ref().expect("No order").queue_id;
    let format = Regex::new(&format!("^{prefix}\\d{{{digits}}}$")).expect("Bad regex");
    assert!(format.is_match(queue_id), "Queue id {queue_id} does not match");
}

#[then(expr = "the order is {word}")]
async fn order_status(world: &mut KedaiWorld, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not an order status");
    let detail = world.sys().orders.fetch_order(world.order_id(), &principal("staff")).await.expect("No order");
    assert_eq!(detail.order.status, expected);
}

#[then(expr = "the order history reads {string}")]
async fn order_history(world: &mut KedaiWorld, expected: String) {
    let history = world.sys().orders.order_history(world.order_id(), &principal("staff")).await.expect("No history");
    let statuses = history.iter().map(|h| h.status.to_string()).collect::<Vec<_>>().join(", ");
    assert_eq!(statuses, expected);
}

#[then(expr = "the latest history entry mentions {string}")]
async fn history_note(world: &mut KedaiWorld, text: String) {
    let history = world.sys().orders.order_history(world.order_id(), &principal("staff")).await.expect("No history");
    let note = history.last().and_then(|h| h.notes.clone()).unwrap_or_default();
    assert!(note.contains(&text), "'{note}' does not mention '{text}'");
}

#[then(expr = "{word} is told the order does not exist")]
async fn order_hidden(world: &mut KedaiWorld, who: String) {
    let err = world.sys().orders.fetch_order(world.order_id(), &principal(&who)).await.expect_err("Order is visible");
    assert!(matches!(err, EngineError::OrderNotFound(_)), "Unexpected error {err:?}");
}

#[then("both requests return the same payment")]
async fn same_payment(world: &mut KedaiWorld) {
    assert_eq!(world.tickets.len(), 2);
    assert_eq!(world.tickets[0].payment_id, world.tickets[1].payment_id);
    assert!(!world.tickets[0].reused);
    assert!(world.tickets[1].reused);
    assert!(world.tickets[1].expires_at >= world.tickets[0].expires_at);
}

#[then(expr = "{word} sees the payment as {word}")]
async fn payment_status(world: &mut KedaiWorld, who: String, status: String) {
    let expected = status.parse::<PaymentStatus>().expect("Not a payment status");
    let id = world.ticket().payment_id.clone();
    let payment =
        world.sys().payments.check_payment_status(&id, &principal(&who)).await.expect("Error checking payment");
    assert_eq!(payment.status, expected);
    assert_eq!(payment.paid_at.is_some(), expected == PaymentStatus::Paid);
}

#[then("the request is rejected as a conflict")]
async fn conflict(world: &mut KedaiWorld) {
    let err = world.last_error.take().expect("The request succeeded");
    assert!(matches!(err, EngineError::Conflict(_)), "Unexpected error {err:?}");
}

#[then(expr = "{word} is told the payment does not exist")]
async fn payment_hidden(world: &mut KedaiWorld, who: String) {
    let id = world.ticket().payment_id.clone();
    let result = world.sys().payments.check_payment_status(&id, &principal(&who)).await;
    let err = result.expect_err("Payment is visible");
    assert!(matches!(err, EngineError::PaymentNotFound(_)), "Unexpected error {err:?}");
}
