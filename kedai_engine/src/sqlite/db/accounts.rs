use sqlx::SqliteConnection;

use crate::db_types::Account;

pub async fn fetch_account(account_id: i64, conn: &mut SqliteConnection) -> Result<Option<Account>, sqlx::Error> {
    let account = sqlx::query_as("SELECT id, name, phone, role FROM users WHERE id = $1")
        .bind(account_id)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}
