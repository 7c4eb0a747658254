//! End-to-end over HTTP:
//! 1) The bootstrap registrar registers a trader.
//! 2) The trader logs in and gets a bearer token.
//! 3) Protected queries with that token reach the ledger; failures come back normalized.

mod common;

use common::{http_client, TestGateway};
use serde_json::{json, Value};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_register_login_and_query() -> Result<(), Box<dyn std::error::Error>> {
    let gw = TestGateway::new().await;
    let base_url = gw.serve().await;
    let client = http_client();

    let registered = client
        .post(format!("{}/register", base_url))
        .form(&[
            ("registrarUser", "admin"),
            ("registrarPassword", "adminpw"),
            ("username", "alice"),
            ("password", "alicepw"),
            ("role", "TRADER"),
        ])
        .send()
        .await?;
    assert_eq!(registered.status(), 200);
    assert_eq!(
        registered.json::<Value>().await?,
        json!({"username": "alice", "roles": ["TRADER"]})
    );

    let login = client
        .post(format!("{}/login", base_url))
        .form(&[("username", "alice"), ("password", "alicepw")])
        .send()
        .await?;
    assert_eq!(login.status(), 200);
    let token = login.json::<Value>().await?["token"]
        .as_str()
        .expect("token")
        .to_string();
    assert!(!token.is_empty());

    let trade = client
        .get(format!("{}/getTrade", base_url))
        .query(&[("tradeId", "T1")])
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(trade.status(), 200);
    assert_eq!(
        trade.json::<Value>().await?,
        json!({"result": false, "error": "Trade T1 not found"})
    );

    let trades = client
        .get(format!("{}/listTrades", base_url))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(trades, json!([]));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_registration_rejections() -> Result<(), Box<dyn std::error::Error>> {
    let gw = TestGateway::new().await;
    let base_url = gw.serve().await;
    let client = http_client();
    gw.provision("bob", "bobpw", "trader").await;

    let register = |registrar: &'static str, password: &'static str, role: &'static str| {
        client.post(format!("{}/register", base_url)).form(&[
            ("registrarUser", registrar),
            ("registrarPassword", password),
            ("username", "carol"),
            ("password", "carolpw"),
            ("role", role),
        ])
    };

    // Valid credentials, wrong role.
    let resp = register("bob", "bobpw", "EXPORTER").send().await?;
    assert_eq!(resp.status(), 403);
    let body = resp.json::<Value>().await?;
    assert_eq!(body["result"], json!(false));
    assert_eq!(body["error"], json!("bob is not a registrar"));

    let resp = register("admin", "wrong", "EXPORTER").send().await?;
    assert_eq!(resp.status(), 403);
    assert_eq!(resp.json::<Value>().await?["error"], json!("Bad credentials"));

    let resp = register("admin", "adminpw", "ASTRONAUT").send().await?;
    assert_eq!(resp.status(), 400);
    assert_eq!(
        resp.json::<Value>().await?["error"],
        json!("ASTRONAUT is not a recognized role")
    );

    // None of the rejected calls provisioned anything.
    assert!(!gw.ledger.is_registered("carol").await);
    assert!(gw.service.identities().load_identity(gw.service.org(), "carol").await.is_none());

    let resp = client
        .post(format!("{}/register", base_url))
        .form(&[("username", "carol")])
        .send()
        .await?;
    assert_eq!(resp.status(), 422);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_register_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let gw = TestGateway::new().await;
    let base_url = gw.serve().await;
    let client = http_client();
    let form = [
        ("registrarUser", "admin"),
        ("registrarPassword", "adminpw"),
        ("username", "dave"),
        ("password", "davepw"),
        ("role", " exporter "),
    ];

    let first = client.post(format!("{}/register", base_url)).form(&form).send().await?;
    assert_eq!(first.status(), 200);
    let first = first.json::<Value>().await?;
    assert_eq!(first, json!({"username": "dave", "roles": ["EXPORTER"]}));

    // The second call must not need the ledger at all.
    gw.ledger.set_available(false);
    let second = client.post(format!("{}/register", base_url)).form(&form).send().await?;
    assert_eq!(second.status(), 200);
    assert_eq!(second.json::<Value>().await?, first);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_failures() -> Result<(), Box<dyn std::error::Error>> {
    let gw = TestGateway::new().await;
    let base_url = gw.serve().await;
    let client = http_client();
    gw.provision("erin", "erinpw", "IMPORTER").await;

    let resp = client
        .post(format!("{}/login", base_url))
        .form(&[("username", "erin"), ("password", "nope")])
        .send()
        .await?;
    assert_eq!(resp.status(), 403);
    assert_eq!(
        resp.json::<Value>().await?,
        json!({"result": false, "error": "Bad credentials"})
    );

    let resp = client
        .post(format!("{}/login", base_url))
        .form(&[("username", "nobody"), ("password", "x")])
        .send()
        .await?;
    assert_eq!(resp.status(), 403);

    // The bootstrap account has credentials but no ledger identity until the registrar
    // is enrolled by a first registration.
    let fresh = TestGateway::new().await;
    let fresh_url = fresh.serve().await;
    let resp = client
        .post(format!("{}/login", fresh_url))
        .form(&[("username", "admin"), ("password", "adminpw")])
        .send()
        .await?;
    assert_eq!(resp.status(), 403);
    assert_eq!(
        resp.json::<Value>().await?["error"],
        json!("Identity for admin not found in wallet")
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_protected_routes_reject_bad_tokens() -> Result<(), Box<dyn std::error::Error>> {
    let gw = TestGateway::new().await;
    let base_url = gw.serve().await;
    let client = http_client();
    gw.provision("frank", "frankpw", "TRADER").await;
    gw.submit("frank", "tradechannel", "trade", "requestTrade", &["T1", "exp", "wheat", "100"])
        .await;

    // Same issuer and claims, different key.
    let other = TestGateway::new().await;
    let foreign = other.provision("frank", "frankpw", "TRADER").await;

    let unauthenticated = json!({"result": false, "error": "Unable to get username from headers"});
    let headers = [
        None,
        Some("Bearer".to_string()),
        Some("Bearer not-a-token".to_string()),
        Some(format!("Bearer {}", foreign)),
    ];
    for auth in headers {
        let mut req = client
            .get(format!("{}/getTrade", base_url))
            .query(&[("tradeId", "T1")]);
        if let Some(value) = auth {
            req = req.header("Authorization", value);
        }
        let resp = req.send().await?;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.json::<Value>().await?, unauthenticated);
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_index_and_health() -> Result<(), Box<dyn std::error::Error>> {
    let gw = TestGateway::new().await;
    let base_url = gw.serve().await;
    let client = http_client();

    let index = client.get(&base_url).send().await?.text().await?;
    assert!(index.contains("Regulator Organization Portal"));

    let health = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(health["status"], json!("ok"));
    assert_eq!(health["org_msp_id"], json!("RegulatorOrgMSP"));
    assert_eq!(health["registrar_enrolled"], json!(false));

    gw.provision("grace", "gracepw", "BANKER").await;
    let health = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(health["registrar_enrolled"], json!(true));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unstorable_usernames_never_reach_the_ca() -> Result<(), Box<dyn std::error::Error>> {
    let gw = TestGateway::new().await;
    let base_url = gw.serve().await;
    let client = http_client();

    let resp = client
        .post(format!("{}/register", base_url))
        .form(&[
            ("registrarUser", "admin"),
            ("registrarPassword", "adminpw"),
            ("username", "bob smith"),
            ("password", "bobpw"),
            ("role", "TRADER"),
        ])
        .send()
        .await?;
    assert_eq!(resp.status(), 400);
    assert_eq!(
        resp.json::<Value>().await?,
        json!({"result": false, "error": "'bob smith' is not a valid username"})
    );
    assert!(!gw.ledger.is_registered("bob smith").await);

    for username in ["", "../admin"] {
        let err = gw
            .service
            .register(regulator_gateway::app::RegistrationRequest {
                registrar_user: "admin".to_string(),
                registrar_password: "adminpw".to_string(),
                username: username.to_string(),
                password: "pw".to_string(),
                role: "TRADER".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, regulator_gateway::GatewayError::InvalidUsername(_)));
        assert!(!gw.ledger.is_registered(username).await);
    }

    // A valid name still goes through afterwards.
    gw.provision("bob_smith", "bobpw", "TRADER").await;
    assert!(gw.ledger.is_registered("bob_smith").await);

    Ok(())
}
