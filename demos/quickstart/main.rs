//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//

// This is an example program showing the main operations of the SDK. It
// creates a private dataset, adds columns, writes some rows one at a time and
// then many more in a single batch, reads them back, and deletes the dataset.

// To run this example, set SOCRATA_USERNAME and SOCRATA_PASSWORD (or
// SOCRATA_AUTH_FILE), and SOCRATA_ENDPOINT for a site other than the default:
//    cargo run --example quickstart
//
// for extra output:
//    RUST_LOG=debug cargo run --example quickstart
//
// or, to see every request:
//    RUST_LOG=trace cargo run --example quickstart

use socrata_rust_sdk::{
    ColumnSpec, ColumnType, CreateDatasetRequest, Handle, Record, RowQuery, SocrataError,
    ROW_ID_FIELD,
};
use std::error::Error;

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result<(), Box<dyn Error>> {
    // Set up a tracing subscriber to see output based on RUST_LOG environment setting
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_ansi(false)
        .compact()
        .init();

    let handle = Handle::builder().from_environment()?.build().await?;

    let mut ds = match CreateDatasetRequest::new("Rust SDK quickstart")
        .description("Created by the quickstart example")
        .tags(&["example"])
        .public(false)
        .execute(&handle)
        .await?
        .completed()
    {
        Some(ds) => ds,
        None => return Err("dataset creation was unexpectedly queued".into()),
    };
    println!("Created dataset {}", ds.short_url(&handle)?);

    ds.add_column(&handle, &ColumnSpec::new("Name")).await?;
    ds.add_column(
        &handle,
        &ColumnSpec::new("Count").column_type(ColumnType::Number),
    )
    .await?;
    ds.add_column(
        &handle,
        &ColumnSpec::new("Seen")
            .column_type(ColumnType::Date)
            .width(128),
    )
    .await?;

    let seen = handle.format_date("2010-03-04 15:16:17")?;
    ds.add_row(
        &handle,
        &Record::new()
            .column("Name", "first")
            .column("Count", 1)
            .column("Seen", seen.as_str()),
    )
    .await?;

    // Everything in the batch goes to the service as one request
    let (h, d) = (&handle, &ds);
    let results = handle
        .with_batch(|| async move {
            for i in 2..=20 {
                d.add_row(
                    h,
                    &Record::new()
                        .column("Name", format!("row {}", i))
                        .column("Count", i),
                )
                .await?;
            }
            d.set_description(h, "Created by the quickstart example, with rows")
                .await?;
            Ok::<(), SocrataError>(())
        })
        .await?;
    println!("Batch applied {} operations", results.len());

    let rows = ds.rows(&handle, &RowQuery::new()).await?;
    println!("Dataset has {} rows", rows.len());
    for row in rows.iter().take(3) {
        println!(
            "  row {:?}: {:?} = {:?}",
            row.get(ROW_ID_FIELD),
            row.get_str("Name"),
            row.get("Count")
        );
    }

    ds.delete(&handle).await?;
    println!("Deleted dataset");
    Ok(())
}
