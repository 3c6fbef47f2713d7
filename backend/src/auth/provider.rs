//! Normalization of federated identity claims.
//!
//! The OAuth handshake itself happens outside this service; by the time a
//! request reaches us the provider has already vouched for the profile. Each
//! provider's raw profile shape is normalized into one [`ProviderClaim`] the
//! lifecycle service consumes.

use serde::Deserialize;
use validator::Validate;

/// Normalized identity asserted by an external provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderClaim {
    pub email: String,
    pub username: String,
    pub name: String,
    pub profile_picture_url: Option<String>,
}

/// Raw profile fields from Google's userinfo response.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GoogleProfile {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Given name is required"))]
    pub given_name: String,
    #[validate(length(min = 1, message = "Family name is required"))]
    pub family_name: String,
    pub picture: Option<String>,
}

/// Raw profile fields from GitHub's user response.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GithubProfile {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<GoogleProfile> for ProviderClaim {
    fn from(profile: GoogleProfile) -> Self {
        ProviderClaim {
            email: profile.email,
            username: format!(
                "{}_{}",
                profile.given_name.to_lowercase(),
                profile.family_name.to_lowercase()
            ),
            name: format!("{} {}", profile.given_name, profile.family_name),
            profile_picture_url: profile.picture,
        }
    }
}

impl From<GithubProfile> for ProviderClaim {
    fn from(profile: GithubProfile) -> Self {
        let name = profile.name.unwrap_or_else(|| profile.login.clone());
        ProviderClaim {
            email: profile.email,
            username: profile.login,
            name,
            profile_picture_url: profile.avatar_url,
        }
    }
}
