//! User profile types
//!
//! Local cache of the backend user record. Never authoritative; refreshed
//! from the backend after sign-in and on demand.

use serde::{Deserialize, Serialize};

/// Identity verification state reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    NotStarted,
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

crate::impl_domain_enum_conversions!(KycStatus {
    NotStarted => "not_started",
    Pending => "pending",
    UnderReview => "under_review",
    Approved => "approved",
    Rejected => "rejected",
});

/// Wallet linked to the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAddress {
    pub address: String,
    /// Chain name, e.g. "ethereum"
    pub network: String,
    #[serde(default)]
    pub is_primary: bool,
}

/// User profile as returned by `/auth/profile`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub wallets: Vec<WalletAddress>,
    pub is_admin: bool,
    pub has_completed_onboarding: bool,
    pub email_verified: bool,
    pub kyc_status: KycStatus,
}

impl UserProfile {
    /// Display name, else "first last", else the email
    pub fn preferred_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.email.clone()
        } else {
            full
        }
    }

    pub fn primary_wallet(&self) -> Option<&WalletAddress> {
        self.wallets.iter().find(|w| w.is_primary).or_else(|| self.wallets.first())
    }
}

/// Partial profile update sent with `PUT /auth/profile`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallets: Option<Vec<WalletAddress>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_completed_onboarding: Option<bool>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the update to a cached profile
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(v) = &self.first_name {
            profile.first_name = Some(v.clone());
        }
        if let Some(v) = &self.last_name {
            profile.last_name = Some(v.clone());
        }
        if let Some(v) = &self.display_name {
            profile.display_name = Some(v.clone());
        }
        if let Some(v) = &self.wallets {
            profile.wallets = v.clone();
        }
        if let Some(v) = self.has_completed_onboarding {
            profile.has_completed_onboarding = v;
        }
    }
}
