use authors_api::models::{
    ApiResponse, Author, AuthorRequest, AuthorSummary, StandardRequest, TokenPair, User,
    UserResponse,
};
use chrono::Utc;
use uuid::Uuid;

// --- Wire Format ---

#[test]
fn test_author_uses_camel_case_keys() {
    let author = Author {
        id: Uuid::new_v4(),
        name: "Multatuli".to_string(),
        address: None,
        created_at: Utc::now(),
        created_by: Some(Uuid::new_v4()),
        ..Author::default()
    };

    let json_output = serde_json::to_string(&author).unwrap();

    assert!(json_output.contains(r#""createdAt":"#));
    assert!(json_output.contains(r#""createdBy":"#));
    assert!(json_output.contains(r#""isDeleted":false"#));
    // Optional columns are present as null rather than omitted.
    assert!(json_output.contains(r#""address":null"#));
    assert!(!json_output.contains("created_at"));
}

#[test]
fn test_token_pair_field_names() {
    let pair = TokenPair {
        access_token: "a".to_string(),
        refresh: "r".to_string(),
    };

    let json_output = serde_json::to_string(&pair).unwrap();
    assert_eq!(json_output, r#"{"accessToken":"a","refresh":"r"}"#);
}

#[test]
fn test_user_response_never_carries_password() {
    let user = User {
        id: Uuid::new_v4(),
        username: "reader".to_string(),
        email: "reader@example.com".to_string(),
        password: "$argon2id$secret-hash".to_string(),
        role_id: "user".to_string(),
        ..User::default()
    };

    let json_output = serde_json::to_string(&UserResponse::from(user)).unwrap();

    assert!(!json_output.contains("argon2"));
    assert!(!json_output.contains("password"));
    assert!(json_output.contains(r#""roleId":"user""#));
}

#[test]
fn test_envelope_omits_absent_fields() {
    let ok = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
    assert_eq!(ok, serde_json::json!({ "success": true, "data": [1, 2] }));

    let failure = serde_json::to_value(ApiResponse::<()>::failure("gone")).unwrap();
    assert_eq!(
        failure,
        serde_json::json!({ "success": false, "message": "gone" })
    );

    let error = serde_json::to_value(ApiResponse::<()>::error("bad input")).unwrap();
    assert_eq!(
        error,
        serde_json::json!({ "success": false, "error": "bad input" })
    );
}

#[test]
fn test_author_summary_projection() {
    let author = Author {
        id: Uuid::new_v4(),
        name: "Rumi".to_string(),
        address: Some("Konya".to_string()),
        ..Author::default()
    };

    let summary = AuthorSummary::from(&author);
    assert_eq!(summary.id, author.id);
    assert_eq!(summary.address.as_deref(), Some("Konya"));
}

// --- Input Parsing ---

#[test]
fn test_author_request_address_is_optional() {
    let req: AuthorRequest = serde_json::from_str(r#"{"name":"Hafez"}"#).unwrap();
    assert_eq!(req.name, "Hafez");
    assert!(req.address.is_none());
    assert!(req.validate().is_ok());
}

#[test]
fn test_author_request_requires_name() {
    assert!(serde_json::from_str::<AuthorRequest>(r#"{"address":"Shiraz"}"#).is_err());
}

#[test]
fn test_standard_request_accepts_q_alias() {
    let req: StandardRequest =
        serde_json::from_str(r#"{"q":"tolstoy","pageNumber":2,"sortType":"ASC"}"#).unwrap();
    let query = req.into_query().unwrap();

    assert_eq!(query.keyword.as_deref(), Some("tolstoy"));
    assert_eq!(query.page.map(|p| p.number), Some(2));
}
