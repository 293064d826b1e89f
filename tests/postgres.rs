//! Runs against a live Postgres. Point `DATABASE_URL` at a scratch database
//! and run with `cargo test -- --ignored`.

use pg_monitoring_demo::db::{PgStore, RequestRecord, RequestStore};

fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgStore::connect(&url).expect("valid connection string")
}

#[tokio::test]
#[ignore]
async fn schema_creation_is_idempotent() {
    let store = store();
    store.init_schema().await.unwrap();

    store
        .insert(&RequestRecord {
            path: "/idempotence".into(),
            method: "GET".into(),
            status_code: 200,
            response_time: 0.004,
        })
        .await
        .unwrap();
    let before = store.count().await.unwrap();

    store.init_schema().await.unwrap();

    assert_eq!(store.count().await.unwrap(), before);
}

#[tokio::test]
#[ignore]
async fn statistics_are_consistent() {
    let store = store();
    store.init_schema().await.unwrap();
    for t in [0.01, 0.2, 0.05] {
        store
            .insert(&RequestRecord {
                path: "/stats".into(),
                method: "GET".into(),
                status_code: 200,
                response_time: t,
            })
            .await
            .unwrap();
    }

    let stats = store.statistics().await.unwrap();
    assert!(stats.total_requests >= 3);
    let (min, avg, max) = (
        stats.min_response_time.unwrap(),
        stats.avg_response_time.unwrap(),
        stats.max_response_time.unwrap(),
    );
    assert!(min <= avg && avg <= max);
    assert!(store.active_connections().await.unwrap() >= 1);
    store.ping().await.unwrap();
}
