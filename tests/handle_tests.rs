//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use socrata_rust_sdk::{
    BatchMode, ColumnSpec, Dataset, FourFour, Handle, HandleBuilder, ImportRequest, Record,
    RequestMethod,
    SocrataError, SocrataErrorCode, Submitted,
};

use serde_json::{json, Value};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATASET_ID: &str = "abcd-1234";

fn init_tracing() {
    // Set up a tracing subscriber to see output based on RUST_LOG environment setting
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_test_writer()
        .compact()
        .try_init();
}

fn get_builder(server: &MockServer) -> Result<HandleBuilder, SocrataError> {
    Handle::builder()
        .endpoint(&format!("{}/api", server.uri()))?
        .basic_auth("publisher", "secret")?
        .timeout(Duration::from_secs(5))
}

fn dataset() -> Dataset {
    Dataset::attached(FourFour::parse(DATASET_ID).unwrap())
}

fn rows_path() -> String {
    format!("/api/views/{}/rows.json", DATASET_ID)
}

async fn mount_batch_response(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/api/batches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

// The JSON body of the single composite request received by the server.
async fn batch_requests(server: &MockServer) -> Vec<Value> {
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].url.path(), "/api/batches");
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    body["requests"].as_array().unwrap().clone()
}

#[tokio::test]
async fn batch_sends_one_request_in_call_order() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    mount_batch_response(&server, json!([{"n": 1}, {"n": 2}, {"n": 3}])).await;

    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);
    let results = handle
        .with_batch(|| async move {
            for i in 0..3 {
                let s = d.add_row(h, &Record::new().column("Count", i)).await?;
                assert_eq!(s, Submitted::Queued(i as usize));
            }
            assert_eq!(h.batch_mode(), BatchMode::Capturing);
            Ok(())
        })
        .await?;

    assert_eq!(results.len(), 3);
    let ns: Vec<i64> = results.iter().map(|r| r["n"].as_i64().unwrap()).collect();
    assert_eq!(ns, vec![1, 2, 3]);

    let requests = batch_requests(&server).await;
    assert_eq!(requests.len(), 3);
    for (i, r) in requests.iter().enumerate() {
        assert_eq!(r["url"], format!("/views/{}/rows.json", DATASET_ID));
        assert_eq!(r["requestType"], "POST");
        // bodies are sent as encoded JSON strings
        let body: Value = serde_json::from_str(r["body"].as_str().unwrap())?;
        assert_eq!(body, json!({"Count": i}));
    }
    let received = server.received_requests().await.unwrap();
    assert_eq!(
        received[0].headers.get("authorization").unwrap(),
        "Basic cHVibGlzaGVyOnNlY3JldA=="
    );
    assert_eq!(handle.batch_mode(), BatchMode::Direct);
    Ok(())
}

#[tokio::test]
async fn empty_batch_sends_nothing() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    let handle = get_builder(&server)?.build().await?;

    let results = handle.with_batch(|| async { Ok(()) }).await?;
    assert!(results.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn nested_batch_is_rejected() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);

    let err = handle
        .with_batch(|| async move {
            d.delete_row(h, "7").await?;
            h.with_batch(|| async { Ok(()) }).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, SocrataErrorCode::AlreadyBatching);
    // the inner error aborts the outer batch, nothing is sent
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(handle.batch_mode(), BatchMode::Direct);
    Ok(())
}

#[tokio::test]
async fn first_failed_operation_is_reported() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    mount_batch_response(
        &server,
        json!([
            {"id": 1},
            {"error": true, "errorCode": "E1", "errorMessage": "bad"},
            {"id": 3}
        ]),
    )
    .await;

    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);
    let err = handle
        .with_batch(|| async move {
            d.add_row(h, &Record::new().column("Name", "A")).await?;
            d.add_row(h, &Record::new().column("Name", "B")).await?;
            d.update_row(h, "3", &Record::new().column("Name", "C"))
                .await?;
            Ok(())
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, SocrataErrorCode::BatchOperationFailed);
    let op = err.failed_operation().unwrap();
    assert_eq!(op.index(), 1);
    assert_eq!(op.method(), RequestMethod::Post);
    assert_eq!(op.path(), format!("/views/{}/rows.json", DATASET_ID));
    assert_eq!(op.error_code(), "E1");
    assert_eq!(op.error_message(), "bad");
    assert_eq!(handle.batch_mode(), BatchMode::Direct);
    Ok(())
}

#[tokio::test]
async fn later_errors_do_not_change_reported_operation() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    mount_batch_response(
        &server,
        json!([
            {"id": 1},
            {"id": 2, "error": false},
            {"error": true, "errorCode": "first", "errorMessage": "x"},
            {"error": "yes", "errorCode": "second", "errorMessage": "y"}
        ]),
    )
    .await;

    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);
    let err = handle
        .with_batch(|| async move {
            d.add_row(h, &Record::new()).await?;
            d.set_description(h, "new").await?;
            d.set_public(h, true).await?;
            d.delete_row(h, "9").await?;
            Ok(())
        })
        .await
        .unwrap_err();

    let op = err.failed_operation().unwrap();
    assert_eq!(op.index(), 2);
    // the permission setter is a GET that is still queued
    assert_eq!(op.method(), RequestMethod::Get);
    assert_eq!(
        op.path(),
        format!("/views/{}?method=setPermission&value=public.read", DATASET_ID)
    );
    assert_eq!(op.error_code(), "first");

    let requests = batch_requests(&server).await;
    let types: Vec<&str> = requests
        .iter()
        .map(|r| r["requestType"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["POST", "PUT", "GET", "DELETE"]);
    assert!(requests[2].get("body").is_none());
    Ok(())
}

#[tokio::test]
async fn malformed_batch_responses() -> Result<(), Box<dyn Error>> {
    init_tracing();
    for response in [json!({"ok": true}), json!([{"id": 1}])] {
        let server = MockServer::start().await;
        mount_batch_response(&server, response).await;
        let handle = get_builder(&server)?.build().await?;
        let ds = dataset();
        let (h, d) = (&handle, &ds);
        let err = handle
            .with_batch(|| async move {
                d.add_row(h, &Record::new()).await?;
                d.add_row(h, &Record::new()).await?;
                Ok(())
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, SocrataErrorCode::MalformedBatchResponse);
        assert!(err.failed_operation().is_none());
        assert_eq!(handle.batch_mode(), BatchMode::Direct);
    }
    Ok(())
}

#[tokio::test]
async fn handle_is_direct_after_failed_batch() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    mount_batch_response(
        &server,
        json!([{"error": true, "errorCode": "E1", "errorMessage": "bad"}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(rows_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": 12, "Name": "after"})))
        .expect(1)
        .mount(&server)
        .await;

    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);
    let res = handle
        .with_batch(|| async move {
            d.add_row(h, &Record::new().column("Name", "in batch")).await?;
            Ok(())
        })
        .await;
    assert!(res.is_err());

    let s = ds
        .add_row(&handle, &Record::new().column("Name", "after"))
        .await?;
    let row = s.completed().unwrap();
    assert_eq!(row.get_i64("_id"), Some(12));

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[1].url.path(), rows_path());
    assert_eq!(
        received[1].headers.get("content-type").unwrap(),
        "application/json"
    );
    Ok(())
}

#[tokio::test]
async fn failed_work_still_submits_queued_operations() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    mount_batch_response(&server, json!([{"_id": 1}])).await;
    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);

    let err = handle
        .with_batch(|| async move {
            d.add_row(h, &Record::new().column("Name", "queued")).await?;
            // not attached: fails before anything else is queued
            Dataset::new().add_row(h, &Record::new()).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, SocrataErrorCode::NotAttached);

    let reqs = batch_requests(&server).await;
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0]["requestType"], "POST");
    assert_eq!(reqs[0]["url"], format!("/views/{}/rows.json", DATASET_ID));
    assert_eq!(handle.batch_mode(), BatchMode::Direct);
    Ok(())
}

#[tokio::test]
async fn failed_work_keeps_its_error_when_submit_fails() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/batches"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .expect(1)
        .mount(&server)
        .await;
    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);

    let err = handle
        .with_batch(|| async move {
            d.add_row(h, &Record::new()).await?;
            Dataset::new().delete_row(h, "3").await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, SocrataErrorCode::NotAttached);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(handle.batch_mode(), BatchMode::Direct);
    Ok(())
}

#[tokio::test]
async fn failed_work_with_empty_queue_sends_nothing() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    let handle = get_builder(&server)?.build().await?;
    let h = &handle;

    let err = handle
        .with_batch(|| async move {
            Dataset::new().add_row(h, &Record::new()).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, SocrataErrorCode::NotAttached);
    assert!(server.received_requests().await.unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn uploads_are_rejected_in_batch() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);

    let err = handle
        .with_batch(|| async move {
            d.add_row(h, &Record::new()).await?;
            d.append(h, Path::new("rows.csv"), true).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, SocrataErrorCode::UnsupportedInBatch);

    let err = handle
        .with_batch(|| async move {
            d.truncate(h).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, SocrataErrorCode::UnsupportedInBatch);

    let err = handle
        .with_batch(|| async move {
            d.upload_file(h, Path::new("photo.png")).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, SocrataErrorCode::UnsupportedInBatch);

    let err = handle
        .with_batch(|| async move {
            ImportRequest::new(Path::new("import.csv")).execute(h).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, SocrataErrorCode::UnsupportedInBatch);
    assert!(server.received_requests().await.unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn reads_execute_inside_batch() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/views/{}/columns.json", DATASET_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "tags"},
            {"id": 2, "name": "Name"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_batch_response(&server, json!([{"id": 3, "name": "Count"}])).await;

    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);
    let results = handle
        .with_batch(|| async move {
            if d.has_columns(h).await? {
                let s = d.add_column(h, &ColumnSpec::new("Count")).await?;
                assert_eq!(s.queued_index(), Some(0));
            }
            Ok(())
        })
        .await?;
    assert_eq!(results.get(0).unwrap()["name"], "Count");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].method.as_str(), "GET");
    assert_eq!(received[1].url.path(), "/api/batches");
    Ok(())
}

#[tokio::test]
async fn clones_batch_independently() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/views/{}", DATASET_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": DATASET_ID})))
        .expect(1)
        .mount(&server)
        .await;
    mount_batch_response(&server, json!([null])).await;

    let handle = get_builder(&server)?.build().await?;
    let other = handle.clone();
    let ds = dataset();
    let (h, o, d) = (&handle, &other, &ds);
    handle
        .with_batch(|| async move {
            assert!(d.delete_row(h, "5").await?.is_queued());
            // the clone is not batching, so this runs now
            let s = d.set_tags(o, &["a"]).await?;
            assert_eq!(s.completed().unwrap().id(), Some(DATASET_ID));
            assert_eq!(o.batch_mode(), BatchMode::Direct);
            Ok(())
        })
        .await?;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].method.as_str(), "PUT");
    assert_eq!(received[1].url.path(), "/api/batches");
    Ok(())
}

#[tokio::test]
async fn dropped_batch_is_reset() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);

    let fut = handle.with_batch(|| async move {
        d.add_row(h, &Record::new()).await?;
        std::future::pending::<()>().await;
        Ok(())
    });
    assert!(tokio::time::timeout(Duration::from_millis(50), fut)
        .await
        .is_err());

    assert_eq!(handle.batch_mode(), BatchMode::Direct);
    assert!(server.received_requests().await.unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn batch_http_error_is_server_error() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/batches"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .expect(1)
        .mount(&server)
        .await;
    let handle = get_builder(&server)?.build().await?;
    let ds = dataset();
    let (h, d) = (&handle, &ds);
    let err = handle
        .with_batch(|| async move {
            d.add_row(h, &Record::new()).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, SocrataErrorCode::ServerError);
    assert!(err.message.contains("500"));
    assert_eq!(handle.batch_mode(), BatchMode::Direct);
    Ok(())
}
