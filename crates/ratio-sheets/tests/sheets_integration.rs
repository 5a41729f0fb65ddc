//! Integration tests for the token exchange and the Sheets REST client.

use mockito::{Matcher, Server};
use ratio_core::{CaptureLevel, InstrumentLabels, InvocationLog, LedgerRow};
use ratio_sheets::{
    A1Range, AccessToken, GoogleSheetsClient, LedgerWriter, ServiceAccount, ServiceAccountAuth,
    SheetsError, SpreadsheetApi,
};
use secrecy::SecretString;
use serde_json::json;

const PRIVATE_KEY: &str = include_str!("fixtures/service_account_key.pem");

fn log() -> InvocationLog {
    InvocationLog::new(CaptureLevel::Debug, false)
}

fn auth_for(server: &Server) -> ServiceAccountAuth {
    let account = ServiceAccount::new(
        "ledger@project.iam.gserviceaccount.com",
        &SecretString::from(PRIVATE_KEY.replace('\n', "\\n")),
    );
    ServiceAccountAuth::new(account, format!("{}/token", server.url())).unwrap()
}

fn client_for(server: &Server) -> GoogleSheetsClient {
    GoogleSheetsClient::new(server.url(), "sid", AccessToken::new("ya29.token")).unwrap()
}

/// JWT-bearer grant is posted as a form and the access token returned.
#[tokio::test]
async fn test_fetch_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "grant_type".into(),
                "urn:ietf:params:oauth:grant-type:jwt-bearer".into(),
            ),
            Matcher::Regex(r"assertion=[\w-]+\.[\w-]+\.[\w-]+".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"ya29.token","expires_in":3599,"token_type":"Bearer"}"#)
        .create_async()
        .await;

    let token = auth_for(&server).fetch_token(&log()).await.unwrap();

    assert_eq!(token.secret(), "ya29.token");
    mock.assert_async().await;
}

/// Rejected token exchange is an authentication failure.
#[tokio::test]
async fn test_fetch_token_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant","error_description":"Invalid JWT Signature."}"#)
        .create_async()
        .await;

    let err = auth_for(&server).fetch_token(&log()).await.unwrap_err();
    assert!(matches!(err, SheetsError::Authentication(_)));
}

/// Tab id is resolved from spreadsheet metadata by title.
#[tokio::test]
async fn test_sheet_id_lookup() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v4/spreadsheets/sid")
        .match_query(Matcher::UrlEncoded(
            "fields".into(),
            "sheets(properties(sheetId,title))".into(),
        ))
        .match_header("authorization", "Bearer ya29.token")
        .with_status(200)
        .with_body(r#"{"sheets":[{"properties":{"sheetId":0,"title":"Other"}},{"properties":{"sheetId":918,"title":"Ledger"}}]}"#)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    assert_eq!(client.sheet_id("Ledger").await.unwrap(), 918);
    assert!(matches!(
        client.sheet_id("Missing").await,
        Err(SheetsError::SheetNotFound(_))
    ));
}

/// Non-2xx responses surface as API errors with the operation name.
#[tokio::test]
async fn test_api_error_status() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v4/spreadsheets/sid:batchUpdate")
        .with_status(403)
        .create_async()
        .await;

    let err = client_for(&server).batch_update(Vec::new()).await.unwrap_err();
    match err {
        SheetsError::Api { operation, status } => {
            assert_eq!(operation, "batchUpdate");
            assert_eq!(status, 403);
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Values are read with trailing rows omitted by the API.
#[tokio::test]
async fn test_read_range() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v4/spreadsheets/sid/values/'Ledger'!A2:J3")
        .with_status(200)
        .with_body(r#"{"range":"Ledger!A2:J3","majorDimension":"ROWS","values":[["t2","48,5"],["t1","47,9"]]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v4/spreadsheets/sid/values/'Ledger'!A:A")
        .with_status(200)
        .with_body(r#"{"range":"Ledger!A1:A1000","majorDimension":"ROWS"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let rows = client
        .read_range(&A1Range::rows("Ledger", 2, 3, 10))
        .await
        .unwrap();
    assert_eq!(rows, vec![vec![json!("t2"), json!("48,5")], vec![json!("t1"), json!("47,9")]]);

    let column = client.read_range(&A1Range::column("Ledger", 0)).await.unwrap();
    assert!(column.is_empty());
}

/// Full ledger write against the REST client: header, insert, row, trim check, colouring.
#[tokio::test]
async fn test_ledger_writer_over_rest() {
    let mut server = Server::new_async().await;
    let header = server
        .mock("PUT", "/v4/spreadsheets/sid/values/'Ledger'!A1:J1")
        .match_query(Matcher::UrlEncoded("valueInputOption".into(), "USER_ENTERED".into()))
        .match_body(Matcher::Json(json!({ "values": [[
            "Timestamp",
            "GMSTR",
            "XAGTRY",
            "GMSTR/XAGTRY (%)",
            "% prim/iskonto (oran)",
            "Adil GMSTR",
            "% prim/iskonto (fiyat)",
            "GLDTR",
            "XAUTRY",
            "GLDTR/XAUTRY (%)"
        ]] })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/v4/spreadsheets/sid")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"sheets":[{"properties":{"sheetId":918,"title":"Ledger"}}]}"#)
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/v4/spreadsheets/sid:batchUpdate")
        .match_body(Matcher::Json(json!({
            "requests": [{ "insertDimension": {
                "range": { "sheetId": 918, "dimension": "ROWS", "startIndex": 1, "endIndex": 2 },
                "inheritFromBefore": false
            }}]
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let row = server
        .mock("PUT", "/v4/spreadsheets/sid/values/'Ledger'!A2:J2")
        .match_query(Matcher::UrlEncoded("valueInputOption".into(), "USER_ENTERED".into()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/v4/spreadsheets/sid/values/'Ledger'!A:A")
        .with_status(200)
        .with_body(r#"{"values":[["Timestamp"],["t2"],["t1"]]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v4/spreadsheets/sid/values/'Ledger'!A2:J3")
        .with_status(200)
        .with_body(r#"{"values":[["t2",50,200,25,0,50,0,30,100,30],["t1",48,200,24,-4,50,-4,30,100,30]]}"#)
        .create_async()
        .await;
    let colors = server
        .mock("POST", "/v4/spreadsheets/sid:batchUpdate")
        .match_body(Matcher::Regex("repeatCell".into()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let writer = LedgerWriter::new(client_for(&server), "Ledger", InstrumentLabels::default());
    let ledger_row = LedgerRow {
        timestamp: "t2".to_string(),
        primary: 50.0,
        primary_base: 200.0,
        secondary: 30.0,
        secondary_base: 100.0,
        metrics: ratio_core::DerivedMetrics::compute(50.0, 200.0, 30.0, 100.0, 25.0),
    };

    let outcome = writer.record(&ledger_row, &log()).await.unwrap();

    assert_eq!(outcome.trimmed_rows, 0);
    assert!(outcome.colorized);
    header.assert_async().await;
    insert.assert_async().await;
    row.assert_async().await;
    colors.assert_async().await;
}
