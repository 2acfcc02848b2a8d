//! HTTP API tests driving the router in-process

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;
    use axum::{
        body::Body,
        http::{header, HeaderMap, Method, Request, StatusCode},
        Router,
    };
    use chrono::Duration;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use guild_auth::auth::{AuthService, AuthSettings, TokenIssuer};
    use guild_auth::config::Config;
    use guild_auth::routes::create_router;
    use guild_auth::state::AppState;
    use guild_auth::store::MemoryStore;
    use guild_auth::time::TimeSourceStub;

    const SECRET: &str = "http-test-secret-http-test-secret-http";

    fn config(overrides: &[(&str, &str)]) -> Config {
        let mut vars: HashMap<String, String> = HashMap::new();
        vars.insert("JWT_SECRET".to_string(), SECRET.to_string());
        vars.insert("CORS_ALLOWED_ORIGINS".to_string(), "http://localhost:3000".to_string());
        for (k, v) in overrides {
            vars.insert(k.to_string(), v.to_string());
        }
        Config::from_lookup(|key| vars.get(key).cloned()).expect("valid test config")
    }

    fn build_app(config: &Config) -> (Router, Arc<TimeSourceStub>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(TimeSourceStub::new());

        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            Duration::seconds(config.jwt_bearer_ttl_seconds),
            Duration::days(config.jwt_refresh_ttl_days),
            clock.clone(),
        );
        let auth_service = Arc::new(AuthService::new(
            store.clone(),
            store,
            tokens,
            clock.clone(),
            &config.app_name,
            AuthSettings::default(),
        ));

        let state = AppState::new(auth_service, config.environment, "memory");
        (create_router(state, config), clock)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, headers, json)
    }

    fn address_of(signer: &PrivateKeySigner) -> String {
        format!("0x{}", hex::encode(signer.address().as_slice()))
    }

    fn sign(signer: &PrivateKeySigner, message: &str) -> String {
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        format!("0x{}", hex::encode(signature.as_bytes()))
    }

    /// Run challenge + verify and return the token response body
    async fn login(app: &Router, wallet: &PrivateKeySigner) -> Value {
        let address = address_of(wallet);
        let (status, _, challenge) = send(
            app,
            Method::POST,
            "/auth/challenge",
            Some(json!({ "address": address })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let message = challenge["message"].as_str().unwrap().to_string();
        let (status, _, tokens) = send(
            app,
            Method::POST,
            "/auth/verify",
            Some(json!({
                "address": address,
                "signature": sign(wallet, &message),
                "message": message,
            })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "verify failed: {}", tokens);
        tokens
    }

    #[tokio::test]
    async fn test_challenge_response_shape() {
        let (app, _) = build_app(&config(&[]));
        let wallet = PrivateKeySigner::random();

        let (status, headers, body) = send(
            &app,
            Method::POST,
            "/auth/challenge",
            Some(json!({ "address": address_of(&wallet) })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Welcome to Celo Europe!"));
        assert_eq!(body["nonce"].as_str().unwrap().len(), 32);
        assert!(body["timestamp"].is_i64());

        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert_eq!(headers["x-ratelimit-limit"], "30");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_challenge_input_errors() {
        let (app, _) = build_app(&config(&[]));

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/auth/challenge",
            Some(json!({ "address": "0x1234" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ADDRESS");

        let (status, _, body) =
            send(&app, Method::POST, "/auth/challenge", Some(json!({})), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/challenge")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_full_login_flow() {
        let (app, _) = build_app(&config(&[]));
        let wallet = PrivateKeySigner::random();
        let address = address_of(&wallet);

        let tokens = login(&app, &wallet).await;
        assert_eq!(tokens["success"], true);
        assert_eq!(tokens["address"], address);
        assert!(tokens["expiresAt"].is_i64());
        let token = tokens["token"].as_str().unwrap();
        let refresh = tokens["refreshToken"].as_str().unwrap();

        let (status, _, me) = send(&app, Method::GET, "/auth/me", None, Some(token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["address"], address);
        assert_eq!(me["expiresAt"], tokens["expiresAt"]);
        assert_eq!(me["expiringSoon"], false);

        let (status, _, validated) = send(
            &app,
            Method::POST,
            "/auth/validate",
            Some(json!({ "token": token })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(validated, json!({ "valid": true, "address": address }));

        let (status, _, rotated) = send(
            &app,
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refreshToken": refresh })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rotated["address"], address);
        assert_ne!(rotated["refreshToken"].as_str().unwrap(), refresh);
    }

    #[tokio::test]
    async fn test_verify_failures() {
        let (app, _) = build_app(&config(&[]));
        let wallet = PrivateKeySigner::random();
        let address = address_of(&wallet);

        // No challenge requested yet
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/auth/verify",
            Some(json!({ "address": address, "signature": "0x00", "message": "hello" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "NO_CHALLENGE");

        let (_, _, challenge) = send(
            &app,
            Method::POST,
            "/auth/challenge",
            Some(json!({ "address": address })),
            None,
        )
        .await;
        let message = challenge["message"].as_str().unwrap();

        let impostor = PrivateKeySigner::random();
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/auth/verify",
            Some(json!({
                "address": address,
                "signature": sign(&impostor, message),
                "message": message,
            })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");
        assert_eq!(body["error"]["message"], "Invalid signature");

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/auth/verify",
            Some(json!({ "address": address, "signature": sign(&wallet, "other"), "message": "other" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MESSAGE_MISMATCH");
    }

    #[tokio::test]
    async fn test_expired_challenge_over_http() {
        let (app, clock) = build_app(&config(&[]));
        let wallet = PrivateKeySigner::random();
        let address = address_of(&wallet);

        let (_, _, challenge) = send(
            &app,
            Method::POST,
            "/auth/challenge",
            Some(json!({ "address": address })),
            None,
        )
        .await;
        let message = challenge["message"].as_str().unwrap();

        clock.advance(Duration::minutes(31));

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/auth/verify",
            Some(json!({ "address": address, "signature": sign(&wallet, message), "message": message })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "CHALLENGE_EXPIRED");
    }

    #[tokio::test]
    async fn test_token_rejections() {
        let (app, clock) = build_app(&config(&[]));

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/auth/validate",
            Some(json!({ "token": "garbage" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["valid"], false);

        for empty in [json!({}), json!({ "token": "" })] {
            let (status, _, body) =
                send(&app, Method::POST, "/auth/validate", Some(empty), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["valid"], false);
        }

        let (status, _, body) = send(&app, Method::GET, "/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "MISSING_TOKEN");

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/auth/refresh",
            Some(json!({})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let tokens = login(&app, &PrivateKeySigner::random()).await;
        clock.advance(Duration::hours(25));

        let (status, _, body) = send(
            &app,
            Method::GET,
            "/auth/me",
            None,
            tokens["token"].as_str(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_logout_is_stateless() {
        let (app, _) = build_app(&config(&[]));

        let (status, _, body) = send(&app, Method::POST, "/auth/logout", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_challenge_rate_limit() {
        let (app, _) = build_app(&config(&[("RATE_LIMIT_CHALLENGE_PER_MINUTE", "2")]));
        let body = json!({ "address": address_of(&PrivateKeySigner::random()) });

        for _ in 0..2 {
            let (status, _, _) =
                send(&app, Method::POST, "/auth/challenge", Some(body.clone()), None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, headers, error) =
            send(&app, Method::POST, "/auth/challenge", Some(body), None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error["error"]["code"], "TOO_MANY_REQUESTS");
        assert_eq!(headers["x-ratelimit-limit"], "2");
        assert_eq!(headers["x-ratelimit-remaining"], "0");
        assert!(headers.contains_key(header::RETRY_AFTER));

        // Other endpoints keep their own budget
        let (status, _, _) = send(&app, Method::POST, "/auth/logout", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_debug_listing_in_development() {
        let (app, _) = build_app(&config(&[]));
        let address = address_of(&PrivateKeySigner::random());

        send(
            &app,
            Method::POST,
            "/auth/challenge",
            Some(json!({ "address": address })),
            None,
        )
        .await;

        let (status, _, body) = send(&app, Method::GET, "/auth/debug", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalChallenges"], 1);
        assert_eq!(body["challenges"][0]["address"], address);
        assert_eq!(body["challenges"][0]["age"], 0);
        assert!(body["challenges"][0].get("message").is_none());
    }

    #[tokio::test]
    async fn test_debug_listing_hidden_in_production() {
        let (app, _) = build_app(&config(&[("ENVIRONMENT", "production")]));

        let (status, headers, _) = send(&app, Method::GET, "/auth/debug", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = build_app(&config(&[]));

        let (status, _, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["storage_backend"], "memory");
        assert_eq!(body["environment"], "development");
    }
}
