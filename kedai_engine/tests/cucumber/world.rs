use cucumber::World;
use kedai_engine::{
    db_types::Principal,
    order_objects::OrderCreated,
    payment_objects::PaymentTicket,
    EngineError,
};

use crate::support::{self, TestSystem};

#[derive(Default, Debug, World)]
pub struct KedaiWorld {
    pub system: Option<TestSystem>,
    pub order: Option<OrderCreated>,
    pub tickets: Vec<PaymentTicket>,
    pub last_error: Option<EngineError>,
}

impl KedaiWorld {
    pub fn sys(&self) -> &TestSystem {
        self.system.as_ref().expect("Test system not initialised")
    }

    pub fn order_id(&self) -> i64 {
        self.order.as_ref().expect("No order has been placed").order_id
    }

    pub fn ticket(&self) -> &PaymentTicket {
        self.tickets.last().expect("No payment has been requested")
    }
}

/// Maps the names used in feature files onto the seeded accounts.
pub fn principal(name: &str) -> Principal {
    match name {
        "Admin" => support::admin(),
        "Sari" | "staff" => support::staff(),
        "Budi" => support::customer(support::BUDI),
        "Ani" => support::customer(support::ANI),
        "Tono" => support::customer(support::TONO),
        _ => panic!("Unknown account {name}"),
    }
}

/// Maps product names onto the seeded catalogue, returning the id and unit price.
pub fn product(name: &str) -> (i64, i64) {
    match name {
        "Nasi Goreng" => (support::NASI_GORENG, 15_000),
        "Es Teh" => (support::ES_TEH, 8_000),
        "Kopi Susu" => (support::KOPI_SUSU, 18_000),
        _ => panic!("Unknown product {name}"),
    }
}
