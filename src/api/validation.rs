//! Request validation. Validators collect every field failure into one
//! field-name to message map so a client can render all of them at once.

use serde_json::{Map, Value, json};

use super::error::ApiError;
use crate::services::tag_service::TagListParams;

const SORT_COLUMNS: &[&str] = &[
    "name",
    "slug",
    "meals_count",
    "drinks_count",
    "created_at",
    "updated_at",
];

fn finish(errors: Map<String, Value>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(Value::Object(errors)))
    }
}

/// A permissive shape check: something before '@', a dot somewhere after it.
fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

pub fn validate_sign_up(
    name: &str,
    email: &str,
    password: &str,
    password_confirmation: &str,
) -> Result<(), ApiError> {
    let mut errors = Map::new();

    if name.trim().is_empty() {
        errors.insert("name".to_string(), json!("Oops, name is required"));
    }

    if email.trim().is_empty() {
        errors.insert("email".to_string(), json!("Oops, email is required"));
    } else if !is_email(email) {
        errors.insert("email".to_string(), json!("Oops, email must be valid"));
    }

    if password.len() < 8 {
        errors.insert(
            "password".to_string(),
            json!("Oops, password must be at least 8 characters"),
        );
    }

    if password_confirmation != password {
        errors.insert(
            "password_confirmation".to_string(),
            json!("Oops, password confirmation doesn't match"),
        );
    }

    finish(errors)
}

pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ApiError> {
    let mut errors = Map::new();

    if email.trim().is_empty() {
        errors.insert("email".to_string(), json!("Oops, email is required"));
    }

    if password.is_empty() {
        errors.insert("password".to_string(), json!("Oops, password is required"));
    }

    finish(errors)
}

pub fn validate_refresh(refresh_token: &str) -> Result<(), ApiError> {
    let mut errors = Map::new();

    if refresh_token.is_empty() {
        errors.insert(
            "refresh_token".to_string(),
            json!("Oops, refresh_token is required"),
        );
    }

    finish(errors)
}

pub fn validate_sign_out(access_token: &str, refresh_token: &str) -> Result<(), ApiError> {
    let mut errors = Map::new();

    if access_token.is_empty() {
        errors.insert(
            "access_token".to_string(),
            json!("Oops, access_token is required"),
        );
    }

    if refresh_token.is_empty() {
        errors.insert(
            "refresh_token".to_string(),
            json!("Oops, refresh_token is required"),
        );
    }

    finish(errors)
}

pub fn validate_tag_names(names: &[String]) -> Result<(), ApiError> {
    let mut errors = Map::new();

    if names.is_empty() {
        errors.insert("name".to_string(), json!("Oops, name is required"));
    } else if names.iter().any(|n| n.trim().is_empty()) {
        errors.insert("name".to_string(), json!("Oops, name cannot be blank"));
    }

    finish(errors)
}

pub fn validate_ids(ids: &[i32]) -> Result<(), ApiError> {
    let mut errors = Map::new();

    if ids.is_empty() {
        errors.insert("ids".to_string(), json!("Oops, ids is required"));
    } else if ids.iter().any(|id| *id < 1) {
        errors.insert(
            "ids".to_string(),
            json!("Oops, ids must be positive integers"),
        );
    }

    finish(errors)
}

/// Validate listing query parameters and fold them into [`TagListParams`].
/// Absent parameters keep the defaults (page 1, size 10, updated_at desc).
pub fn validate_list_query(
    page: Option<u64>,
    size: Option<u64>,
    order_by: Option<&str>,
    order_dir: Option<&str>,
    search: Option<String>,
) -> Result<TagListParams, ApiError> {
    let mut errors = Map::new();
    let mut params = TagListParams::default();

    match page {
        Some(0) => {
            errors.insert("page".to_string(), json!("Oops, page must be at least 1"));
        }
        Some(p) => params.page = p,
        None => {}
    }

    match size {
        Some(s) if (1..=100).contains(&s) => params.size = s,
        Some(_) => {
            errors.insert(
                "size".to_string(),
                json!("Oops, size must be between 1 and 100"),
            );
        }
        None => {}
    }

    match order_by {
        Some(column) if SORT_COLUMNS.contains(&column) => params.order_by = column.to_string(),
        Some(_) => {
            errors.insert(
                "order_by".to_string(),
                json!(format!(
                    "Oops, order_by must be one of: {}",
                    SORT_COLUMNS.join(", ")
                )),
            );
        }
        None => {}
    }

    match order_dir {
        Some("asc") => params.descending = false,
        Some("desc") | None => {}
        Some(_) => {
            errors.insert(
                "order_dir".to_string(),
                json!("Oops, order_dir must be asc or desc"),
            );
        }
    }

    params.search = search.filter(|s| !s.trim().is_empty());

    if errors.is_empty() {
        Ok(params)
    } else {
        Err(ApiError::Validation(Value::Object(errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors(err: ApiError) -> Map<String, Value> {
        match err {
            ApiError::Validation(Value::Object(map)) => map,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn sign_up_collects_all_failures() {
        let err = validate_sign_up("", "not-an-email", "short", "different").unwrap_err();
        let errors = field_errors(err);

        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
        assert!(errors.contains_key("password_confirmation"));
    }

    #[test]
    fn sign_up_accepts_valid_input() {
        assert!(validate_sign_up("Jane", "jane@example.com", "qwerty12345", "qwerty12345").is_ok());
    }

    #[test]
    fn email_shape() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a@.co"));
        assert!(!is_email("plainaddress"));
    }

    #[test]
    fn list_query_defaults() {
        let params = validate_list_query(None, None, None, None, None).unwrap();

        assert_eq!(params.page, 1);
        assert_eq!(params.size, 10);
        assert_eq!(params.order_by, "updated_at");
        assert!(params.descending);
        assert!(params.search.is_none());
    }

    #[test]
    fn list_query_rejects_bad_values() {
        let err = validate_list_query(Some(0), Some(500), Some("id"), Some("up"), None).unwrap_err();
        let errors = field_errors(err);

        assert!(errors.contains_key("page"));
        assert!(errors.contains_key("size"));
        assert!(errors.contains_key("order_by"));
        assert!(errors.contains_key("order_dir"));
    }

    #[test]
    fn list_query_accepts_asc_sort() {
        let params =
            validate_list_query(Some(2), Some(25), Some("name"), Some("asc"), None).unwrap();

        assert_eq!(params.page, 2);
        assert_eq!(params.size, 25);
        assert_eq!(params.order_by, "name");
        assert!(!params.descending);
    }

    #[test]
    fn blank_search_is_dropped() {
        let params =
            validate_list_query(None, None, None, None, Some("   ".to_string())).unwrap();

        assert!(params.search.is_none());
    }

    #[test]
    fn tag_names_rejects_blank_entries() {
        assert!(validate_tag_names(&[]).is_err());
        assert!(validate_tag_names(&["ok".to_string(), "  ".to_string()]).is_err());
        assert!(validate_tag_names(&["spicy".to_string()]).is_ok());
    }

    #[test]
    fn ids_must_be_positive() {
        assert!(validate_ids(&[]).is_err());
        assert!(validate_ids(&[1, 0]).is_err());
        assert!(validate_ids(&[1, 2, 3]).is_ok());
    }
}
