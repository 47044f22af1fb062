//! Database entities.

pub mod admin;
pub mod admin_action;
pub mod certificate;
pub mod event;
pub mod event_registration;
pub mod organiser;
pub mod report;
pub mod review;
pub mod user;
pub mod volunteer;

pub use admin::Entity as Admin;
pub use admin_action::Entity as AdminAction;
pub use certificate::Entity as Certificate;
pub use event::Entity as Event;
pub use event_registration::Entity as EventRegistration;
pub use organiser::Entity as Organiser;
pub use report::Entity as Report;
pub use review::Entity as Review;
pub use user::Entity as User;
pub use volunteer::Entity as Volunteer;

/// Read a JSON array of strings, skipping anything that is not a string.
#[must_use]
pub fn string_list(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Build a JSON array from strings.
#[must_use]
pub fn json_list<I, S>(items: I) -> serde_json::Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    serde_json::Value::Array(
        items
            .into_iter()
            .map(|s| serde_json::Value::String(s.into()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_list_skips_non_strings() {
        let value = json!(["first aid", 3, "cooking", null]);
        assert_eq!(string_list(&value), vec!["first aid", "cooking"]);
        assert!(string_list(&json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_json_list() {
        assert_eq!(json_list(["a", "b"]), json!(["a", "b"]));
    }
}
