mod support;

use chrono::{NaiveDate, TimeZone, Utc};
use kedai_engine::{
    db_types::{Principal, Rupiah},
    order_objects::NewOrderRequest,
    report_objects::{ReportBucket, SalesReportRow},
    EngineError,
};
use support::*;

async fn completed_sale(sys: &TestSystem, kopi: i64, placed: (i32, u32, u32, u32)) -> i64 {
    let request = NewOrderRequest::new("Walk-in", Some("081100001111"), "dine_in").with_item(
        KOPI_SUSU,
        kopi,
        Rupiah::from(18_000),
    );
    let order_id = sys.orders.create_order(request, &staff()).await.unwrap().order_id;
    let (y, m, d, h) = placed;
    sys.set_order_created_at(order_id, Utc.with_ymd_and_hms(y, m, d, h, 15, 0).unwrap()).await;
    assert!(sys.orders.update_order_status(order_id, "completed", &staff(), None).await.unwrap());
    order_id
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn report(
    sys: &TestSystem,
    start: NaiveDate,
    end: NaiveDate,
    bucket: ReportBucket,
    who: Principal,
) -> Result<Vec<SalesReportRow>, EngineError> {
    sys.reports.sales_report(start, end, bucket, &who).await
}

#[tokio::test]
async fn daily_and_monthly_revenue() {
    let sys = TestSystem::new().await;
    completed_sale(&sys, 1, (2024, 9, 30, 23)).await;
    completed_sale(&sys, 1, (2024, 10, 1, 0)).await;
    completed_sale(&sys, 2, (2024, 10, 1, 12)).await;
    completed_sale(&sys, 3, (2024, 10, 31, 23)).await;
    completed_sale(&sys, 1, (2024, 11, 1, 8)).await;
    // Cancelled and unfinished orders never count
    let cancelled = completed_sale(&sys, 5, (2024, 10, 2, 9)).await;
    sqlx::query("UPDATE orders SET status = 'cancelled' WHERE id = $1")
        .bind(cancelled)
        .execute(sys.db.pool())
        .await
        .unwrap();
    let request = NewOrderRequest::new("Walk-in", Some("081100001111"), "dine_in").with_item(
        KOPI_SUSU,
        4,
        Rupiah::from(18_000),
    );
    sys.orders.create_order(request, &staff()).await.unwrap();

    let daily = report(&sys, date(2024, 10, 1), date(2024, 10, 31), ReportBucket::Day, staff()).await.unwrap();
    let periods = daily.iter().map(|r| r.period.as_str()).collect::<Vec<_>>();
    assert_eq!(periods, vec!["2024-10-01", "2024-10-31"]);
    assert_eq!(daily[0].order_count, 2);
    assert_eq!(daily[0].revenue, Rupiah::from(54_000));
    assert_eq!(daily[0].average_value, Rupiah::from(27_000));
    assert_eq!(daily[1].revenue, Rupiah::from(54_000));

    let monthly = report(&sys, date(2024, 9, 1), date(2024, 12, 31), ReportBucket::Month, admin()).await.unwrap();
    let summary = monthly.iter().map(|r| (r.period.as_str(), r.order_count)).collect::<Vec<_>>();
    assert_eq!(summary, vec![("2024-09", 1), ("2024-10", 3), ("2024-11", 1)]);

    let yearly = sys.reports.sales_report_from_strings("2024-01-01", "2024-12-31", "year", &staff()).await.unwrap();
    assert_eq!(yearly.len(), 1);
    assert_eq!(yearly[0].revenue, Rupiah::from(18_000 * 8));
    sys.teardown().await;
}

#[tokio::test]
async fn report_requests_are_checked() {
    let sys = TestSystem::new().await;
    let err = report(&sys, date(2024, 10, 2), date(2024, 10, 1), ReportBucket::Day, staff()).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
    let err = report(&sys, date(2024, 10, 1), date(2024, 10, 2), ReportBucket::Day, customer(BUDI)).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = sys.reports.sales_report_from_strings("2024-10-01", "2024-10-02", "week", &staff()).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "bucket"));
    let empty = report(&sys, date(2024, 10, 1), date(2024, 10, 1), ReportBucket::Day, staff()).await.unwrap();
    assert!(empty.is_empty());
    sys.teardown().await;
}
