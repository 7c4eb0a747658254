use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use chrono::{Duration as ChronoDuration, Utc};
use regulator_gateway::crypto::keys::{generate_signing_key, signing_key_from_hex, signing_key_to_hex};
use regulator_gateway::domain::{Role, TokenService, UserDetails};
use std::time::Duration;

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

fn alice() -> UserDetails {
    UserDetails {
        username: "alice".to_string(),
        role: Role::Trader,
    }
}

#[test]
fn test_token_round_trip_until_expiry() {
    let tokens = TokenService::new(generate_signing_key(), "regulator-gateway", Duration::from_secs(3600));
    let issued_at = Utc::now();
    let token = tokens.issue_token_at(&alice(), issued_at).unwrap();
    let headers = bearer(&token);

    assert_eq!(tokens.resolve_username_at(&headers, issued_at), Some("alice".to_string()));
    assert_eq!(
        tokens.resolve_username_at(&headers, issued_at + ChronoDuration::seconds(3599)),
        Some("alice".to_string())
    );
    assert_eq!(tokens.resolve_username_at(&headers, issued_at + ChronoDuration::seconds(3600)), None);

    let claims = tokens.validate_at(&token, issued_at).unwrap();
    assert_eq!(claims.role, Role::Trader);
    assert_eq!(claims.iss, "regulator-gateway");
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn test_replicas_sharing_a_key_accept_each_others_tokens() {
    let seed = signing_key_to_hex(&generate_signing_key());
    let a = TokenService::new(signing_key_from_hex(&seed).unwrap(), "regulator-gateway", Duration::from_secs(60));
    let b = TokenService::new(signing_key_from_hex(&seed).unwrap(), "regulator-gateway", Duration::from_secs(60));

    let token = a.issue_token(&alice()).unwrap();
    assert_eq!(b.resolve_username(&bearer(&token)), Some("alice".to_string()));
}

#[test]
fn test_rejected_tokens_collapse_to_none() {
    let tokens = TokenService::new(generate_signing_key(), "regulator-gateway", Duration::from_secs(60));
    let foreign = TokenService::new(generate_signing_key(), "regulator-gateway", Duration::from_secs(60));
    let seed = signing_key_to_hex(&generate_signing_key());
    let tokens_same_key = TokenService::new(signing_key_from_hex(&seed).unwrap(), "regulator-gateway", Duration::from_secs(60));
    let other_issuer = TokenService::new(signing_key_from_hex(&seed).unwrap(), "someone-else", Duration::from_secs(60));

    assert_eq!(tokens.resolve_username(&HeaderMap::new()), None);

    let foreign_token = foreign.issue_token(&alice()).unwrap();
    assert_eq!(tokens.resolve_username(&bearer(&foreign_token)), None);

    // Same key, different issuer: only the issuer check can reject it.
    let wrong_issuer = other_issuer.issue_token(&alice()).unwrap();
    assert_eq!(other_issuer.resolve_username(&bearer(&wrong_issuer)), Some("alice".to_string()));
    assert_eq!(tokens_same_key.resolve_username(&bearer(&wrong_issuer)), None);
    let right_issuer = tokens_same_key.issue_token(&alice()).unwrap();
    assert_eq!(other_issuer.resolve_username(&bearer(&right_issuer)), None);

    // Flip one character in the payload half.
    let good = tokens.issue_token(&alice()).unwrap();
    let mut tampered: Vec<char> = good.chars().collect();
    tampered[3] = if tampered[3] == 'A' { 'B' } else { 'A' };
    let tampered: String = tampered.into_iter().collect();
    assert_eq!(tokens.resolve_username(&bearer(&tampered)), None);

    assert_eq!(tokens.resolve_username(&bearer("garbage")), None);
}

#[test]
fn test_oversized_ttl_saturates_instead_of_wrapping() {
    let tokens = TokenService::new(generate_signing_key(), "regulator-gateway", Duration::from_secs(u64::MAX));
    let now = Utc::now();
    let token = tokens.issue_token_at(&alice(), now).unwrap();

    let claims = tokens.validate_at(&token, now).unwrap();
    assert_eq!(claims.exp, i64::MAX);
    assert_eq!(tokens.resolve_username_at(&bearer(&token), now), Some("alice".to_string()));
}
