mod common;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::setup_test_server;

const HANDBOOK: &str = "Refunds are accepted within 30 days of purchase. \
Damaged items are refunded in full, including shipping costs. \
Store credit is offered after the refund window closes.";

const SHIPPING: &str = "Orders ship from the Lyon warehouse every weekday. \
Express delivery reaches most European cities within two days.";

#[tokio::test]
async fn upload_docs_without_body_returns_json() -> Result<(), Box<dyn std::error::Error>> {
    let server = setup_test_server().await?;

    let response = server
        .client
        .post(server.url("/api/v1/upload-docs"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert!(!body.is_null());
    assert_eq!(body["uploaded"], 0);

    Ok(())
}

#[tokio::test]
async fn ask_without_body_returns_json() -> Result<(), Box<dyn std::error::Error>> {
    let server = setup_test_server().await?;

    let response = server.client.post(server.url("/api/v1/ask")).send().await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert!(!body.is_null());
    assert_eq!(body["status"], "no_question");

    Ok(())
}

#[tokio::test]
async fn uploaded_documents_answer_questions() -> Result<(), Box<dyn std::error::Error>> {
    let server = setup_test_server().await?;

    let upload = server
        .client
        .post(server.url("/api/v1/upload-docs"))
        .json(&json!({
            "documents": [
                { "title": "handbook", "content": HANDBOOK },
                { "source": "shipping.txt", "content": SHIPPING }
            ]
        }))
        .send()
        .await?;
    assert_eq!(upload.status(), StatusCode::OK);
    let upload: Value = upload.json().await?;
    assert_eq!(upload["uploaded"], 2);
    assert_eq!(upload["total_documents"], 2);
    assert_eq!(upload["documents"][1]["title"], "shipping.txt");
    assert_eq!(upload["documents"][1]["word_count"], 17);
    assert!(upload["chunks_indexed"].as_u64().unwrap_or(0) >= 2);

    let answer = server
        .client
        .post(server.url("/api/v1/ask"))
        .json(&json!({ "question": "Are damaged items refunded?" }))
        .send()
        .await?;
    assert_eq!(answer.status(), StatusCode::OK);
    let answer: Value = answer.json().await?;
    assert_eq!(answer["status"], "answered");
    assert_eq!(answer["model"], "extractive");
    assert!(answer["answer"]
        .as_str()
        .unwrap_or_default()
        .contains("Damaged items are refunded in full"));
    assert_eq!(answer["citations"][0]["title"], "handbook");

    Ok(())
}

#[tokio::test]
async fn multipart_files_are_uploaded() -> Result<(), Box<dyn std::error::Error>> {
    let server = setup_test_server().await?;

    let form = Form::new()
        .part(
            "files",
            Part::text(SHIPPING).file_name("shipping.txt").mime_str("text/plain")?,
        )
        .text("comment", "ignored");
    let upload = server
        .client
        .post(server.url("/api/v1/upload-docs"))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(upload.status(), StatusCode::OK);
    let upload: Value = upload.json().await?;
    assert_eq!(upload["uploaded"], 1);
    assert_eq!(upload["documents"][0]["title"], "shipping.txt");

    let listing: Value = server
        .client
        .get(server.url("/api/v1/docs"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listing["total_documents"], 1);
    assert_eq!(listing["documents"][0]["source"], "shipping.txt");

    let cleared: Value = server
        .client
        .delete(server.url("/api/v1/docs"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(cleared["total_documents"], 0);

    Ok(())
}

#[tokio::test]
async fn ask_before_upload_reports_no_documents() -> Result<(), Box<dyn std::error::Error>> {
    let server = setup_test_server().await?;

    let body: Value = server
        .client
        .post(server.url("/api/v1/ask"))
        .json(&json!({ "question": "Where is the warehouse?" }))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "no_documents");
    assert!(body["answer"].is_null());
    assert_eq!(body["citations"], json!([]));

    Ok(())
}

#[tokio::test]
async fn unrelated_question_reports_no_match() -> Result<(), Box<dyn std::error::Error>> {
    let server = setup_test_server().await?;
    server
        .client
        .post(server.url("/api/v1/upload-docs"))
        .json(&json!({ "documents": [{ "content": HANDBOOK }] }))
        .send()
        .await?
        .error_for_status()?;

    let body: Value = server
        .client
        .post(server.url("/api/v1/ask"))
        .json(&json!({ "question": "quantum chromodynamics" }))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "no_match");

    Ok(())
}

#[tokio::test]
async fn malformed_and_invalid_bodies_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let server = setup_test_server().await?;

    let malformed = server
        .client
        .post(server.url("/api/v1/ask"))
        .header("content-type", "application/json")
        .body("{\"question\":")
        .send()
        .await?;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let error: Value = malformed.json().await?;
    assert!(error["error"].as_str().is_some());

    let out_of_range = server
        .client
        .post(server.url("/api/v1/ask"))
        .json(&json!({ "question": "refund", "top_k": 500 }))
        .send()
        .await?;
    assert_eq!(out_of_range.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let documents: Vec<Value> = (0..5)
        .map(|idx| json!({ "content": format!("doc {idx}") }))
        .collect();
    let too_many = server
        .client
        .post(server.url("/api/v1/upload-docs"))
        .json(&json!({ "documents": documents }))
        .send()
        .await?;
    assert_eq!(too_many.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let empty_content = server
        .client
        .post(server.url("/api/v1/upload-docs"))
        .json(&json!({ "documents": [{ "content": "" }] }))
        .send()
        .await?;
    assert_eq!(empty_content.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let blank_content = server
        .client
        .post(server.url("/api/v1/upload-docs"))
        .json(&json!({ "documents": [{ "content": "   \n\t " }] }))
        .send()
        .await?;
    assert_eq!(blank_content.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = blank_content.json().await?;
    assert_eq!(error["error"], "document 1 has no content");

    Ok(())
}

#[tokio::test]
async fn health_endpoint_reports_ok() -> Result<(), Box<dyn std::error::Error>> {
    let server = setup_test_server().await?;

    let response = server.client.get(server.url("/health")).send().await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "ok");

    Ok(())
}
