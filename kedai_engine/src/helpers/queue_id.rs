use chrono::{DateTime, Utc};
use rand::Rng;

use crate::db_types::OrderType;

/// Builds a queue identifier from its parts: the order type prefix, the last eight digits of the millisecond timestamp
/// and a three-digit suffix.
pub fn queue_id_from_parts(order_type: OrderType, timestamp: DateTime<Utc>, suffix: u16) -> String {
    let millis = timestamp.timestamp_millis().rem_euclid(100_000_000);
    format!("{}{millis:08}{:03}", order_type.queue_prefix(), suffix % 1000)
}

/// Generates a short, human-readable code that customers and staff use to track an order at the counter.
///
/// Queue ids are not guaranteed to be unique. Two orders of the same type placed in the same millisecond have a 1 in
/// 1000 chance of sharing one. The surrogate order id is the authoritative key.
pub fn new_queue_id(order_type: OrderType, now: DateTime<Utc>) -> String {
    let suffix = rand::thread_rng().gen_range(0..1000u16);
    queue_id_from_parts(order_type, now, suffix)
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn known_parts() {
        let ts = Utc.timestamp_millis_opt(1_739_876_543_210).unwrap();
        assert_eq!(queue_id_from_parts(OrderType::TakeAway, ts, 7), "TA76543210007");
        assert_eq!(queue_id_from_parts(OrderType::DineIn, ts, 999), "DI76543210999");
    }

    #[test]
    fn timestamp_digits_are_zero_padded() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_042).unwrap();
        assert_eq!(queue_id_from_parts(OrderType::DineIn, ts, 12), "DI00000042012");
    }

    #[test]
    fn random_ids_have_the_display_shape() {
        for _ in 0..50 {
            let id = new_queue_id(OrderType::DineIn, Utc::now());
            assert_eq!(id.len(), 13);
            assert!(id.starts_with("DI"));
            assert!(id[2..].chars().all(|c| c.is_ascii_digit()));
        }
    }
}
