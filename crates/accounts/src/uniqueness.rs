//! Country-scoped uniqueness of verification detail values.
//!
//! A tax id that is unique within Germany may legitimately reappear in
//! France, so uniqueness keys are `{field}-{country}`. The guard is a pure
//! scan over candidate profiles; callers run it before persisting and treat a
//! hit as a hard failure. The scan and the subsequent write are not atomic,
//! so two simultaneous submissions of the same value can both pass. A unique
//! index at the storage layer is the backstop for that window.

use std::collections::BTreeMap;

use tradepost_core::{CountryCode, UserId};

use crate::user::UserProfile;

/// Uniqueness scope key for a verification field in a given country.
pub fn scoped_key(field: &str, country: &CountryCode) -> String {
    format!("{field}-{country}")
}

/// Scan `candidates` for another user already holding one of the submitted
/// detail values within the same country. Returns the first clashing field
/// name, in submission order.
pub fn find_scoped_duplicate<'a, I>(
    candidates: I,
    acting_user: UserId,
    country: &CountryCode,
    details: &BTreeMap<String, String>,
) -> Option<String>
where
    I: IntoIterator<Item = &'a UserProfile>,
{
    let others: Vec<&UserProfile> = candidates
        .into_iter()
        .filter(|u| u.user_id() != acting_user && u.country() == country)
        .collect();

    for (field, value) in details {
        if value.trim().is_empty() {
            continue;
        }
        if others
            .iter()
            .any(|u| u.verification_details().get(field) == Some(value))
        {
            return Some(field.clone());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use tradepost_auth::{Actor, Role};

    use super::*;
    use crate::user::{NewUser, ProfileChanges};

    fn user_with_details(country: &str, details: &[(&str, &str)]) -> UserProfile {
        let id = UserId::new();
        let actor = Actor::new(id, Role::Seller);
        let (mut user, _) = UserProfile::register(
            NewUser {
                id,
                role: Role::Seller,
                email: "ops@example.test".to_string(),
                display_name: "Some Seller".to_string(),
                company_name: "Some Seller Ltd".to_string(),
                country: CountryCode::new(country).unwrap(),
            },
            Utc::now(),
        )
        .unwrap();
        user.apply_profile_update(
            &actor,
            ProfileChanges {
                verification_details: Some(
                    details
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                ..ProfileChanges::default()
            },
            Utc::now(),
        )
        .unwrap();
        user
    }

    fn details(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn scoped_key_format() {
        let de = CountryCode::new("de").unwrap();
        assert_eq!(scoped_key("tax_id", &de), "tax_id-DE");
    }

    #[test]
    fn same_value_same_country_is_a_duplicate() {
        let existing = user_with_details("DE", &[("tax_id", "DE123456789")]);
        let de = CountryCode::new("DE").unwrap();

        let hit = find_scoped_duplicate(
            [&existing],
            UserId::new(),
            &de,
            &details(&[("tax_id", "DE123456789")]),
        );
        assert_eq!(hit.as_deref(), Some("tax_id"));
    }

    #[test]
    fn same_value_other_country_is_fine() {
        let existing = user_with_details("DE", &[("tax_id", "123456789")]);
        let fr = CountryCode::new("FR").unwrap();

        let hit = find_scoped_duplicate(
            [&existing],
            UserId::new(),
            &fr,
            &details(&[("tax_id", "123456789")]),
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn own_existing_value_is_not_a_duplicate() {
        let existing = user_with_details("DE", &[("tax_id", "DE123456789")]);
        let de = CountryCode::new("DE").unwrap();

        let hit = find_scoped_duplicate(
            [&existing],
            existing.user_id(),
            &de,
            &details(&[("tax_id", "DE123456789")]),
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn different_field_same_value_is_fine() {
        let existing = user_with_details("DE", &[("tax_id", "X-100")]);
        let de = CountryCode::new("DE").unwrap();

        let hit = find_scoped_duplicate(
            [&existing],
            UserId::new(),
            &de,
            &details(&[("registration_no", "X-100")]),
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn blank_values_are_skipped() {
        let existing = user_with_details("DE", &[("tax_id", "")]);
        let de = CountryCode::new("DE").unwrap();

        let hit = find_scoped_duplicate([&existing], UserId::new(), &de, &details(&[("tax_id", "")]));
        assert_eq!(hit, None);
    }

    #[test]
    fn first_clashing_field_in_order_wins() {
        let existing = user_with_details("DE", &[("tax_id", "T-1"), ("registration_no", "R-1")]);
        let de = CountryCode::new("DE").unwrap();

        let hit = find_scoped_duplicate(
            [&existing],
            UserId::new(),
            &de,
            &details(&[("registration_no", "R-1"), ("tax_id", "T-1")]),
        );
        // BTreeMap iteration order: registration_no sorts before tax_id.
        assert_eq!(hit.as_deref(), Some("registration_no"));
    }
}
