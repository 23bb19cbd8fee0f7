//! Application router configuration.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, endpoints,
    logging::logging_middleware,
    transaction::{create_transaction_endpoint, get_transactions_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{body::Bytes, http::StatusCode};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState, build_router,
        db::initialize,
        endpoints,
        ledger::{BalanceFallback, Ledger},
        transaction::{Transaction, count_transactions},
    };

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(db_connection, BalanceFallback::Zero)
            .expect("Could not create app state.");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    fn get_test_server_and_connection() -> (TestServer, Arc<Mutex<Connection>>) {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        initialize(&db_connection).expect("Could not initialize database.");
        let db_connection = Arc::new(Mutex::new(db_connection));
        let state = AppState {
            ledger: Ledger::new(db_connection.clone(), BalanceFallback::Zero),
        };
        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        (server, db_connection)
    }

    async fn get_transactions(server: &TestServer) -> Vec<Transaction> {
        let response = server.get(endpoints::TRANSACTIONS).await;
        response.assert_status_ok();
        response.json::<Vec<Transaction>>()
    }

    #[tokio::test]
    async fn append_then_list_scenario() {
        let server = get_test_server();

        let first = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"type": "credit", "amount": 100, "date": "2024-01-01"}))
            .await;
        first.assert_status_ok();
        let first = first.json::<Transaction>();
        assert_eq!(first.id, 1);
        assert_eq!(first.running_balance, Some(100.0));

        let second = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"type": "debit", "amount": 30, "date": "2024-01-02"}))
            .await;
        second.assert_status_ok();
        let second = second.json::<Transaction>();
        assert_eq!(second.id, 2);
        assert_eq!(second.running_balance, Some(70.0));

        let transactions = get_transactions(&server).await;
        let got: Vec<_> = transactions
            .iter()
            .map(|transaction| {
                (
                    transaction.id,
                    transaction.date.as_str(),
                    transaction.running_balance,
                )
            })
            .collect();
        assert_eq!(
            got,
            vec![(2, "2024-01-02", Some(70.0)), (1, "2024-01-01", Some(100.0))]
        );
    }

    #[tokio::test]
    async fn created_transaction_is_returned_as_json() {
        let server = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "type": "credit",
                "amount": "12.5",
                "description": "Refund",
                "date": "2024-02-03"
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "id": 1,
            "type": "credit",
            "amount": 12.5,
            "description": "Refund",
            "date": "2024-02-03",
            "running_balance": 12.5
        }));
    }

    #[tokio::test]
    async fn invalid_type_is_rejected_and_store_stays_empty() {
        let server = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"type": "invalid", "amount": 10, "date": "2024-01-01"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Invalid transaction type");
        assert!(get_transactions(&server).await.is_empty());
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let server = get_test_server();
        let bodies = [
            json!({"amount": 10, "date": "2024-01-01"}),
            json!({"type": "credit", "date": "2024-01-01"}),
            json!({"type": "credit", "amount": 10}),
            json!({"type": "credit", "amount": 0, "date": "2024-01-01"}),
            json!({"type": null, "amount": 10, "date": "2024-01-01"}),
            json!({}),
        ];

        for body in bodies {
            let response = server.post(endpoints::TRANSACTIONS).json(&body).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(response.text(), "Missing required fields", "body: {body}");
        }

        assert!(get_transactions(&server).await.is_empty());
    }

    #[tokio::test]
    async fn unparseable_amount_is_rejected() {
        let server = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"type": "credit", "amount": "ten", "date": "2024-01-01"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Invalid amount");
        assert!(get_transactions(&server).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let server = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"type": 1, "amount": 10, "date": "2024-01-01"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Invalid request body");
        assert!(get_transactions(&server).await.is_empty());
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let server = get_test_server();

        assert!(get_transactions(&server).await.is_empty());
    }

    #[tokio::test]
    async fn list_orders_by_date_regardless_of_creation_order() {
        let server = get_test_server();
        for date in ["2024-05-01", "2023-01-01", "2024-12-25", "2024-05-02"] {
            server
                .post(endpoints::TRANSACTIONS)
                .json(&json!({"type": "credit", "amount": 1, "date": date}))
                .await
                .assert_status_ok();
        }

        let first_listing = get_transactions(&server).await;
        let dates: Vec<_> = first_listing
            .iter()
            .map(|transaction| transaction.date.as_str())
            .collect();
        assert_eq!(
            dates,
            vec!["2024-12-25", "2024-05-02", "2024-05-01", "2023-01-01"]
        );

        let second_listing = get_transactions(&server).await;
        assert_eq!(first_listing, second_listing);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        let response = server.get("/accounts").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_utf8_body_is_rejected() {
        let server = get_test_server();
        let body = Bytes::from_static(
            b"{\"type\": \"credit\", \"amount\": 1, \"description\": \"\xFF\", \"date\": \"2024-01-01\"}",
        );

        let response = server
            .post(endpoints::TRANSACTIONS)
            .content_type("application/json")
            .bytes(body)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Invalid request body");
        assert!(get_transactions(&server).await.is_empty());
    }

    #[tokio::test]
    async fn overflowing_balance_is_rejected() {
        let server = get_test_server();
        let body = json!({"type": "credit", "amount": 1.7e308, "date": "2024-01-01"});
        server
            .post(endpoints::TRANSACTIONS)
            .json(&body)
            .await
            .assert_status_ok();

        let response = server.post(endpoints::TRANSACTIONS).json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Invalid amount");
        let transactions = get_transactions(&server).await;
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].running_balance, Some(1.7e308));
    }

    #[tokio::test]
    async fn storage_write_failure_is_internal_server_error() {
        let (server, db_connection) = get_test_server_and_connection();
        db_connection
            .lock()
            .unwrap()
            .execute(
                "CREATE TRIGGER reject_insert BEFORE INSERT ON transactions
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END",
                (),
            )
            .unwrap();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"type": "credit", "amount": 10, "date": "2024-01-01"}))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "Error adding transaction");
        assert_eq!(count_transactions(&db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn storage_read_failure_is_internal_server_error() {
        let (server, db_connection) = get_test_server_and_connection();
        db_connection
            .lock()
            .unwrap()
            .execute("DROP TABLE transactions", ())
            .unwrap();

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "Error fetching transactions");
    }
}
