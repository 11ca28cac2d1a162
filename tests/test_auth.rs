mod common;

use std::collections::HashMap;

use bytes::Bytes;
use common::ScriptedOutput;
use outflow::Error;
use outflow::auth::{Auth, MockAuth};
use outflow::http::headers::Headers;
use outflow::http::response::{Response, Transport};

fn no_headers() -> HashMap<String, String> {
    HashMap::new()
}

#[tokio::test]
async fn test_mock_login_success() {
    let auth = MockAuth::new("scruffy", "zerogravity");

    let creds = auth
        .login(&no_headers(), Bytes::from_static(b"scruffy\nzerogravity"), "10.0.0.7")
        .await
        .unwrap();

    assert_eq!(creds.user, "scruffy");
    assert_eq!(creds.password, Bytes::from_static(b"zerogravity"));
    assert_eq!(creds.remote_peer, "10.0.0.7");
}

#[tokio::test]
async fn test_mock_login_wrong_password() {
    let auth = MockAuth::new("scruffy", "zerogravity");

    let err = auth
        .login(&no_headers(), Bytes::from_static(b"scruffy\nzerogravit"), "10.0.0.7")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed));

    let err = auth
        .login(&no_headers(), Bytes::from_static(b"other\nzerogravity"), "10.0.0.7")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed));
}

#[tokio::test]
async fn test_mock_login_malformed_input() {
    let auth = MockAuth::new("scruffy", "zerogravity");

    let err = auth
        .login(&no_headers(), Bytes::from_static(b"scruffy"), "10.0.0.7")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}

#[tokio::test]
async fn test_failed_login_becomes_401_page() {
    let auth = MockAuth::new("scruffy", "zerogravity");
    let output = ScriptedOutput::accepting();
    let record = output.recorder();
    let response = Response::open(Transport::pollable(output), Some("/login"));

    match auth
        .login(&no_headers(), Bytes::from_static(b"scruffy\nwrong"), "10.0.0.7")
        .await
    {
        Ok(_) => panic!("login should fail"),
        Err(err) => response.send_error_from(&Headers::new(), &err),
    }
    response.finished().await;

    assert!(record.text().starts_with("HTTP/1.1 401 "));
}

#[tokio::test]
async fn test_malformed_login_becomes_400_page() {
    let auth = MockAuth::new("scruffy", "zerogravity");
    let output = ScriptedOutput::accepting();
    let record = output.recorder();
    let response = Response::open(Transport::pollable(output), Some("/login"));

    if let Err(err) = auth.login(&no_headers(), Bytes::new(), "10.0.0.7").await {
        response.send_error_from(&Headers::new(), &err);
    }
    response.finished().await;

    assert!(record.text().starts_with("HTTP/1.1 400 "));
}
