use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::{PaymentId, PaymentMethod};

const SUFFIX_LEN: usize = 6;

/// Creates a new payment identifier of the form `<METHOD>-<epoch millis>-<random suffix>`.
///
/// The random suffix makes identifiers impractical to guess, since they are handed to customers and used to poll
/// payment status.
pub fn new_payment_id(method: PaymentMethod, now: DateTime<Utc>) -> PaymentId {
    let suffix = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect::<String>();
    PaymentId(format!("{}-{}-{suffix}", method.tag(), now.timestamp_millis()))
}
