use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_auth::{Actor, Role, require_admin, require_owner};
use tradepost_core::{CountryCode, DomainError, DomainResult, Entity, PlanId, UserId};
use tradepost_events::Event;
use tradepost_moderation::ModerationAction;

use crate::reverification::{Reverification, evaluate};

/// Verification lifecycle of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Unverified,
    Pending,
    Verified,
    Rejected,
}

impl core::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        })
    }
}

/// A user's current subscription term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan_id: PlanId,
    pub expires_at: DateTime<Utc>,
    /// Renewal cancellation does not revoke current-term access; it only
    /// prevents rollover past `expires_at`.
    pub renewal_cancelled: bool,
}

impl Subscription {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A marketplace account (buyer, seller, or admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    id: UserId,
    role: Role,
    email: String,
    display_name: String,
    company_name: String,
    country: CountryCode,
    verification_status: VerificationStatus,
    /// Free-form verification detail fields (tax ids, registration numbers).
    verification_details: BTreeMap<String, String>,
    /// Document kind → storage reference. The required set depends on country.
    verification_documents: BTreeMap<String, String>,
    verification_note: Option<String>,
    subscription: Option<Subscription>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input for account registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub id: UserId,
    pub role: Role,
    pub email: String,
    pub display_name: String,
    pub company_name: String,
    pub country: CountryCode,
}

/// Owner-editable profile fields. `None` = leave untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub company_name: Option<String>,
    pub country: Option<CountryCode>,
    pub verification_details: Option<BTreeMap<String, String>>,
}

/// Domain events emitted by account operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserEvent {
    Registered {
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    VerificationSubmitted {
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    VerificationApproved {
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    VerificationRejected {
        user_id: UserId,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
    /// A profile edit invalidated an existing verification.
    VerificationReviewRequired {
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    /// A country change reset verification and cleared stale documents.
    VerificationReset {
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    SubscriptionActivated {
        user_id: UserId,
        plan_id: PlanId,
        expires_at: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    RenewalCancelled {
        user_id: UserId,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::Registered { .. } => "accounts.user.registered",
            UserEvent::VerificationSubmitted { .. } => "accounts.verification.submitted",
            UserEvent::VerificationApproved { .. } => "accounts.verification.approved",
            UserEvent::VerificationRejected { .. } => "accounts.verification.rejected",
            UserEvent::VerificationReviewRequired { .. } => "accounts.verification.review_required",
            UserEvent::VerificationReset { .. } => "accounts.verification.reset",
            UserEvent::SubscriptionActivated { .. } => "accounts.subscription.activated",
            UserEvent::RenewalCancelled { .. } => "accounts.subscription.renewal_cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            UserEvent::Registered { occurred_at, .. }
            | UserEvent::VerificationSubmitted { occurred_at, .. }
            | UserEvent::VerificationApproved { occurred_at, .. }
            | UserEvent::VerificationRejected { occurred_at, .. }
            | UserEvent::VerificationReviewRequired { occurred_at, .. }
            | UserEvent::VerificationReset { occurred_at, .. }
            | UserEvent::SubscriptionActivated { occurred_at, .. }
            | UserEvent::RenewalCancelled { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Entity for UserProfile {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl UserProfile {
    /// Validate and create a new account.
    pub fn register(input: NewUser, now: DateTime<Utc>) -> DomainResult<(Self, UserEvent)> {
        if !input.email.contains('@') {
            return Err(DomainError::validation("email address is malformed"));
        }
        if input.display_name.trim().is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }

        let user = Self {
            id: input.id,
            role: input.role,
            email: input.email,
            display_name: input.display_name,
            company_name: input.company_name,
            country: input.country,
            verification_status: VerificationStatus::Unverified,
            verification_details: BTreeMap::new(),
            verification_documents: BTreeMap::new(),
            verification_note: None,
            subscription: None,
            created_at: now,
            updated_at: now,
        };

        let event = UserEvent::Registered {
            user_id: user.id,
            occurred_at: now,
        };

        Ok((user, event))
    }

    pub fn user_id(&self) -> UserId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn country(&self) -> &CountryCode {
        &self.country
    }

    pub fn verification_status(&self) -> VerificationStatus {
        self.verification_status
    }

    pub fn verification_details(&self) -> &BTreeMap<String, String> {
        &self.verification_details
    }

    pub fn verification_documents(&self) -> &BTreeMap<String, String> {
        &self.verification_documents
    }

    pub fn verification_note(&self) -> Option<&str> {
        self.verification_note.as_deref()
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }

    /// Apply an owner profile update.
    ///
    /// The re-verification trigger runs against the pre-update state; the
    /// caller is responsible for running the scoped duplicate guard *before*
    /// calling this (no partial save on a duplicate).
    pub fn apply_profile_update(
        &mut self,
        actor: &Actor,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<UserEvent>> {
        require_owner(actor, self.id)?;

        if let Some(name) = &changes.display_name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("display name cannot be empty"));
            }
        }

        let outcome = evaluate(self, &changes);

        if let Some(v) = changes.display_name {
            self.display_name = v;
        }
        if let Some(v) = changes.company_name {
            self.company_name = v;
        }
        if let Some(v) = changes.country {
            self.country = v;
        }
        if let Some(v) = changes.verification_details {
            self.verification_details = v;
        }
        self.updated_at = now;

        Ok(match outcome {
            Reverification::None => None,
            Reverification::RequireReview => {
                self.verification_status = VerificationStatus::Pending;
                self.verification_note = None;
                Some(UserEvent::VerificationReviewRequired {
                    user_id: self.id,
                    occurred_at: now,
                })
            }
            Reverification::ResetDocuments => {
                // Stale documents for another country's requirements must not
                // silently persist.
                self.verification_status = VerificationStatus::Unverified;
                self.verification_documents.clear();
                self.verification_note = None;
                Some(UserEvent::VerificationReset {
                    user_id: self.id,
                    occurred_at: now,
                })
            }
        })
    }

    /// Submit (or re-submit) verification documents; moves to `pending`.
    pub fn submit_documents(
        &mut self,
        actor: &Actor,
        documents: BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> DomainResult<UserEvent> {
        require_owner(actor, self.id)?;

        if documents.is_empty() {
            return Err(DomainError::validation("at least one document is required"));
        }

        self.verification_documents = documents;
        self.verification_status = VerificationStatus::Pending;
        self.verification_note = None;
        self.updated_at = now;

        Ok(UserEvent::VerificationSubmitted {
            user_id: self.id,
            occurred_at: now,
        })
    }

    /// Apply an admin verification decision.
    ///
    /// Only valid from `pending`; rejection requires a non-empty reason.
    pub fn review_verification(
        &mut self,
        action: &ModerationAction,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> DomainResult<UserEvent> {
        require_admin(actor)?;

        if self.verification_status != VerificationStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "verification review only valid from pending (current: {})",
                self.verification_status
            )));
        }

        let event = match action {
            ModerationAction::Approve => {
                self.verification_status = VerificationStatus::Verified;
                self.verification_note = None;
                UserEvent::VerificationApproved {
                    user_id: self.id,
                    occurred_at: now,
                }
            }
            ModerationAction::Reject { reason } => {
                if reason.trim().is_empty() {
                    return Err(DomainError::validation("rejection requires a reason"));
                }
                self.verification_status = VerificationStatus::Rejected;
                self.verification_note = Some(reason.clone());
                UserEvent::VerificationRejected {
                    user_id: self.id,
                    reason: reason.clone(),
                    occurred_at: now,
                }
            }
        };

        self.updated_at = now;
        Ok(event)
    }

    /// Install a paid (or renewed) subscription term.
    pub fn activate_subscription(
        &mut self,
        plan_id: PlanId,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<UserEvent> {
        if expires_at <= now {
            return Err(DomainError::validation("subscription term must end in the future"));
        }

        self.subscription = Some(Subscription {
            plan_id,
            expires_at,
            renewal_cancelled: false,
        });
        self.updated_at = now;

        Ok(UserEvent::SubscriptionActivated {
            user_id: self.id,
            plan_id,
            expires_at,
            occurred_at: now,
        })
    }

    /// Mark the subscription to not roll over. Current-term access persists.
    pub fn cancel_renewal(&mut self, actor: &Actor, now: DateTime<Utc>) -> DomainResult<UserEvent> {
        require_owner(actor, self.id)?;

        let Some(sub) = self.subscription.as_mut() else {
            return Err(DomainError::validation("no subscription to cancel"));
        };

        sub.renewal_cancelled = true;
        self.updated_at = now;

        Ok(UserEvent::RenewalCancelled {
            user_id: self.id,
            occurred_at: now,
        })
    }
}
