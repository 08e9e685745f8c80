//! AWS Lambda handler for amortization schedules
//!
//! Accepts loan parameters as a JSON request body behind a Lambda Function URL
//! and returns the full schedule and summary. Base64-encoded bodies are decoded
//! by the runtime before they reach the handler.
//!
//! Set PT_MORTGAGE_ASSUMPTIONS to an assumptions directory to override the
//! Portuguese defaults.

use std::env;
use std::path::Path;

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use log::{info, warn};
use pt_mortgage::{AmortizationEngine, LoanParams, RegulatoryAssumptions};
use serde_json::json;

fn cors_response(status: u16, body: Body) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(body)?)
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    cors_response(status, Body::Text(json!({ "error": message }).to_string()))
}

/// Loan parameters from the request body
fn parse_loan(body: &Body) -> Result<LoanParams, String> {
    let parsed = match body {
        Body::Text(text) => serde_json::from_str(text),
        Body::Binary(bytes) => serde_json::from_slice(bytes),
        Body::Empty => return Err("Request body is empty".to_string()),
    };
    parsed.map_err(|e| format!("Invalid loan parameters: {}", e))
}

async fn handler(engine: &AmortizationEngine, event: Request) -> Result<Response<Body>, Error> {
    if event.method() == Method::OPTIONS {
        return cors_response(200, Body::Empty);
    }

    let params = match parse_loan(event.body()) {
        Ok(params) => params,
        Err(message) => return error_response(400, &message),
    };

    match engine.calculate(&params) {
        Ok(result) => {
            info!(
                "Schedule for {:.2} over {} months: monthly payment {:.2}",
                params.principal, params.term_months, result.summary.monthly_payment
            );
            cors_response(200, Body::Text(serde_json::to_string(&result)?))
        }
        Err(e) => {
            warn!("Rejected loan parameters: {}", e);
            error_response(422, &e.to_string())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let assumptions = match env::var("PT_MORTGAGE_ASSUMPTIONS") {
        Ok(dir) => RegulatoryAssumptions::from_csv_path(Path::new(&dir))?,
        Err(_) => RegulatoryAssumptions::portugal(),
    };
    let engine = AmortizationEngine::new(assumptions);
    let engine = &engine;

    run(service_fn(move |event: Request| async move { handler(engine, event).await })).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    // {"principal":100000,"tan":0.03,"termMonths":360}
    const ENCODED_LOAN: &str = "eyJwcmluY2lwYWwiOjEwMDAwMCwidGFuIjowLjAzLCJ0ZXJtTW9udGhzIjozNjB9";

    fn function_url_event(method: &str, body: &str, base64: bool) -> Request {
        let event = json!({
            "version": "2.0",
            "routeKey": "$default",
            "rawPath": "/",
            "rawQueryString": "",
            "headers": {
                "content-type": "application/json",
                "host": "abc123.lambda-url.eu-west-1.on.aws"
            },
            "requestContext": {
                "accountId": "123456789012",
                "apiId": "abc123",
                "domainName": "abc123.lambda-url.eu-west-1.on.aws",
                "domainPrefix": "abc123",
                "http": {
                    "method": method,
                    "path": "/",
                    "protocol": "HTTP/1.1",
                    "sourceIp": "127.0.0.1",
                    "userAgent": "curl/8.0"
                },
                "requestId": "c6af9ac6-7b61-11e6-9a41-93e8deadbeef",
                "routeKey": "$default",
                "stage": "$default",
                "time": "19/Oct/2026:10:00:00 +0000",
                "timeEpoch": 1792404000000_i64
            },
            "body": body,
            "isBase64Encoded": base64
        });
        lambda_http::request::from_str(&event.to_string()).unwrap()
    }

    fn response_json(response: &Response<Body>) -> Value {
        match response.body() {
            Body::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("expected a text body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_base64_body_is_decoded_and_accepted() {
        let engine = AmortizationEngine::new(RegulatoryAssumptions::portugal());
        let event = function_url_event("POST", ENCODED_LOAN, true);

        let response = handler(&engine, event).await.unwrap();
        assert_eq!(response.status(), 200);
        let body = response_json(&response);
        assert_eq!(body["table"].as_array().unwrap().len(), 360);
    }

    #[tokio::test]
    async fn test_plain_body_is_accepted() {
        let engine = AmortizationEngine::new(RegulatoryAssumptions::portugal());
        let event = function_url_event(
            "POST",
            r#"{"principal": 100000, "tan": 0.03, "termMonths": 360}"#,
            false,
        );

        let response = handler(&engine, event).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["Access-Control-Allow-Origin"],
            "*"
        );
    }

    #[tokio::test]
    async fn test_preflight_has_empty_body() {
        let engine = AmortizationEngine::new(RegulatoryAssumptions::portugal());
        let event = function_url_event("OPTIONS", "", false);

        let response = handler(&engine, event).await.unwrap();
        assert_eq!(response.status(), 200);
        assert!(matches!(response.body(), Body::Empty));
    }

    #[tokio::test]
    async fn test_invalid_loan_is_unprocessable() {
        let engine = AmortizationEngine::new(RegulatoryAssumptions::portugal());
        let event = function_url_event(
            "POST",
            r#"{"principal": -5, "tan": 0.03, "termMonths": 360}"#,
            false,
        );

        let response = handler(&engine, event).await.unwrap();
        assert_eq!(response.status(), 422);
        assert!(response_json(&response)["error"].is_string());
    }

    #[test]
    fn test_parse_loan_bodies() {
        let text = Body::Text(r#"{"principal": 100000, "tan": 0.03, "termMonths": 360}"#.into());
        assert_eq!(parse_loan(&text).unwrap().term_months, 360);

        let binary = Body::Binary(br#"{"principal": 5000, "tan": 0.02, "termMonths": 12}"#.to_vec());
        assert_eq!(parse_loan(&binary).unwrap().term_months, 12);

        assert!(parse_loan(&Body::Empty).is_err());
        assert!(parse_loan(&Body::Text("{not json".into())).is_err());
    }

    #[test]
    fn test_error_response_shape() {
        let response = error_response(400, "principal must be positive").unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(response_json(&response)["error"], "principal must be positive");
    }
}
