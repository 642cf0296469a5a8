#![allow(dead_code)]

pub mod prepare_env;

use chrono::{DateTime, Utc};
use kedai_engine::{
    config::PaymentSettings,
    db_types::{PaymentId, Principal},
    OrderFlowApi,
    PaymentApi,
    ReportApi,
    SqliteDatabase,
};

pub const ADMIN: i64 = 1;
pub const STAFF: i64 = 2;
/// Phone on file: +6281234567890
pub const BUDI: i64 = 3;
/// Phone on file: +6285712345678
pub const ANI: i64 = 4;
/// No phone on file
pub const TONO: i64 = 5;

pub const NASI_GORENG: i64 = 1;
pub const ES_TEH: i64 = 2;
pub const KOPI_SUSU: i64 = 3;

#[derive(Debug)]
pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub payments: PaymentApi<SqliteDatabase>,
    pub reports: ReportApi<SqliteDatabase>,
}

impl TestSystem {
    pub async fn new() -> Self {
        let url = prepare_env::prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        seed(&db).await;
        let orders = OrderFlowApi::new(db.clone());
        let payments = PaymentApi::new(db.clone(), PaymentSettings::default());
        let reports = ReportApi::new(db.clone());
        Self { url, db, orders, payments, reports }
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.db.pool())
            .await
            .expect("Error counting rows");
        n
    }

    pub async fn set_payment_expiry(&self, id: &PaymentId, expires_at: DateTime<Utc>) {
        sqlx::query("UPDATE payments SET expires_at = $1 WHERE id = $2")
            .bind(expires_at)
            .bind(id.as_str())
            .execute(self.db.pool())
            .await
            .expect("Error backdating payment expiry");
    }

    pub async fn set_payment_created_at(&self, id: &PaymentId, created_at: DateTime<Utc>) {
        sqlx::query("UPDATE payments SET created_at = $1 WHERE id = $2")
            .bind(created_at)
            .bind(id.as_str())
            .execute(self.db.pool())
            .await
            .expect("Error backdating payment");
    }

    pub async fn set_order_created_at(&self, order_id: i64, created_at: DateTime<Utc>) {
        sqlx::query("UPDATE orders SET created_at = $1 WHERE id = $2")
            .bind(created_at)
            .bind(order_id)
            .execute(self.db.pool())
            .await
            .expect("Error backdating order");
    }

    pub async fn teardown(self) {
        self.db.close().await;
        prepare_env::drop_database(&self.url).await;
    }
}

pub fn admin() -> Principal {
    Principal::admin(ADMIN)
}

pub fn staff() -> Principal {
    Principal::staff(STAFF)
}

pub fn customer(id: i64) -> Principal {
    Principal::customer(id)
}

async fn seed(db: &SqliteDatabase) {
    sqlx::query(
        r#"
            INSERT INTO users (id, name, phone, role) VALUES
                (1, 'Admin', NULL, 'admin'),
                (2, 'Sari', NULL, 'staff'),
                (3, 'Budi', '+6281234567890', 'customer'),
                (4, 'Ani', '+6285712345678', 'customer'),
                (5, 'Tono', NULL, 'customer');
            INSERT INTO products (id, name, price) VALUES
                (1, 'Nasi Goreng', 15000),
                (2, 'Es Teh', 8000),
                (3, 'Kopi Susu', 18000);
        "#,
    )
    .execute(db.pool())
    .await
    .expect("Error seeding accounts and products");
}
