//! Decides whether a profile edit invalidates an existing verification.

use crate::user::{ProfileChanges, UserProfile, VerificationStatus};

/// Outcome of evaluating a profile edit against the verification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reverification {
    /// The edit does not touch verification-sensitive state.
    None,
    /// A verified identity changed; an admin must look again (documents kept).
    RequireReview,
    /// The country changed on a non-verified account; existing documents were
    /// collected against another country's requirements and must go.
    ResetDocuments,
}

/// Evaluate `changes` against the *pre-update* profile.
///
/// A `Some` field equal to the current value counts as unchanged, so
/// re-submitting a profile form verbatim never triggers re-verification.
pub fn evaluate(profile: &UserProfile, changes: &ProfileChanges) -> Reverification {
    let country_changed = changes
        .country
        .as_ref()
        .is_some_and(|c| c != profile.country());
    let company_changed = changes
        .company_name
        .as_ref()
        .is_some_and(|n| n != profile.company_name());
    let details_changed = changes
        .verification_details
        .as_ref()
        .is_some_and(|d| d != profile.verification_details());

    if profile.verification_status() == VerificationStatus::Verified
        && (country_changed || company_changed || details_changed)
    {
        Reverification::RequireReview
    } else if country_changed {
        Reverification::ResetDocuments
    } else {
        Reverification::None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use proptest::prelude::*;

    use tradepost_auth::{Actor, Role};
    use tradepost_core::{CountryCode, UserId};
    use tradepost_moderation::ModerationAction;

    use super::*;
    use crate::user::NewUser;

    fn profile(status: VerificationStatus) -> UserProfile {
        let id = UserId::new();
        let actor = Actor::new(id, Role::Seller);
        let (mut user, _) = UserProfile::register(
            NewUser {
                id,
                role: Role::Seller,
                email: "ops@acme.example".to_string(),
                display_name: "Acme Industrial".to_string(),
                company_name: "Acme Industrial GmbH".to_string(),
                country: CountryCode::new("DE").unwrap(),
            },
            Utc::now(),
        )
        .unwrap();

        if status != VerificationStatus::Unverified {
            user.submit_documents(
                &actor,
                BTreeMap::from([("trade_register".to_string(), "doc://1".to_string())]),
                Utc::now(),
            )
            .unwrap();
        }
        let admin = Actor::admin(UserId::new());
        match status {
            VerificationStatus::Verified => {
                user.review_verification(&ModerationAction::Approve, &admin, Utc::now())
                    .unwrap();
            }
            VerificationStatus::Rejected => {
                user.review_verification(
                    &ModerationAction::Reject {
                        reason: "insufficient".to_string(),
                    },
                    &admin,
                    Utc::now(),
                )
                .unwrap();
            }
            VerificationStatus::Unverified | VerificationStatus::Pending => {}
        }
        user
    }

    #[test]
    fn verified_user_company_change_requires_review() {
        let user = profile(VerificationStatus::Verified);
        let changes = ProfileChanges {
            company_name: Some("Acme Industrial AG".to_string()),
            ..ProfileChanges::default()
        };
        assert_eq!(evaluate(&user, &changes), Reverification::RequireReview);
    }

    #[test]
    fn verified_user_country_change_requires_review_not_reset() {
        // For a verified identity the review rule wins over the reset rule.
        let user = profile(VerificationStatus::Verified);
        let changes = ProfileChanges {
            country: Some(CountryCode::new("FR").unwrap()),
            ..ProfileChanges::default()
        };
        assert_eq!(evaluate(&user, &changes), Reverification::RequireReview);
    }

    #[test]
    fn verified_user_details_change_requires_review() {
        let user = profile(VerificationStatus::Verified);
        let changes = ProfileChanges {
            verification_details: Some(BTreeMap::from([(
                "tax_id".to_string(),
                "DE999999999".to_string(),
            )])),
            ..ProfileChanges::default()
        };
        assert_eq!(evaluate(&user, &changes), Reverification::RequireReview);
    }

    #[test]
    fn unverified_user_country_change_resets_documents() {
        for status in [
            VerificationStatus::Unverified,
            VerificationStatus::Pending,
            VerificationStatus::Rejected,
        ] {
            let user = profile(status);
            let changes = ProfileChanges {
                country: Some(CountryCode::new("FR").unwrap()),
                ..ProfileChanges::default()
            };
            assert_eq!(evaluate(&user, &changes), Reverification::ResetDocuments);
        }
    }

    #[test]
    fn unverified_user_company_change_is_harmless() {
        let user = profile(VerificationStatus::Pending);
        let changes = ProfileChanges {
            company_name: Some("Acme Industrial AG".to_string()),
            ..ProfileChanges::default()
        };
        assert_eq!(evaluate(&user, &changes), Reverification::None);
    }

    #[test]
    fn same_value_does_not_count_as_changed() {
        let user = profile(VerificationStatus::Verified);
        let changes = ProfileChanges {
            company_name: Some(user.company_name().to_string()),
            country: Some(user.country().clone()),
            verification_details: Some(user.verification_details().clone()),
            ..ProfileChanges::default()
        };
        assert_eq!(evaluate(&user, &changes), Reverification::None);
    }

    #[test]
    fn display_name_change_never_triggers() {
        let user = profile(VerificationStatus::Verified);
        let changes = ProfileChanges {
            display_name: Some("Acme (EU office)".to_string()),
            ..ProfileChanges::default()
        };
        assert_eq!(evaluate(&user, &changes), Reverification::None);
    }

    proptest! {
        // Evaluation is a pure function of (profile, changes).
        #[test]
        fn evaluation_is_deterministic(company in "[A-Za-z ]{1,24}") {
            let user = profile(VerificationStatus::Verified);
            let changes = ProfileChanges {
                company_name: Some(company),
                ..ProfileChanges::default()
            };
            prop_assert_eq!(evaluate(&user, &changes), evaluate(&user, &changes));
        }
    }
}
