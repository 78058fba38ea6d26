//! Auth and my-list backend request/response types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// --- Users ---

/// Opaque user identifier (number or string on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    /// Numeric identifier.
    Numeric(u64),
    /// String identifier.
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Authenticated user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Creation timestamp (ISO-8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// Returns a copy with the profile fields of `updates` applied.
    ///
    /// Password fields are never stored on the record.
    #[must_use]
    pub fn merged(&self, updates: &UserUpdate) -> Self {
        let mut user = self.clone();
        if let Some(ref name) = updates.name {
            user.name.clone_from(name);
        }
        if let Some(ref email) = updates.email {
            user.email.clone_from(email);
        }
        user
    }
}

/// Successful `POST /login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token. Older backends omit it.
    #[serde(rename = "Token", default)]
    pub token: Option<String>,
    /// Signed-in user.
    #[serde(rename = "User")]
    pub user: User,
}

/// User payload of `GET /user` and `PUT /userUpdate`.
///
/// The backend wraps the record as `{"User": …}`, `{"user": …}`, or not at all.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserEnvelope {
    Capitalized {
        #[serde(rename = "User")]
        user: User,
    },
    Lowercase {
        user: User,
    },
    Bare(User),
}

impl UserEnvelope {
    pub(crate) fn into_user(self) -> User {
        match self {
            Self::Capitalized { user } | Self::Lowercase { user } | Self::Bare(user) => user,
        }
    }
}

/// `POST /login` request body.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /register` request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub password_confirmation: String,
}

/// `PUT /userUpdate` request body. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// New password confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    /// Current password, required by the backend when changing passwords.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
}

/// Minimum length of a new password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Form input rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A registration field is blank.
    #[error("All fields are required")]
    MissingFields,
    /// Registration password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
    /// New password and confirmation differ.
    #[error("New passwords do not match")]
    NewPasswordMismatch,
    /// New password is shorter than [`MIN_PASSWORD_LEN`].
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
}

impl Registration {
    /// Checks the sign-up form.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            &self.name,
            &self.email,
            &self.password,
            &self.password_confirmation,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ValidationError::MissingFields);
        }
        if self.password != self.password_confirmation {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

impl UserUpdate {
    /// Checks the account form. Only applies when a new password is given.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        if self.password_confirmation.as_deref() != Some(password) {
            return Err(ValidationError::NewPasswordMismatch);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(())
    }

    /// Whether nothing would be sent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.current_password.is_none()
    }
}

// --- My list ---

/// Kind of catalog item. Movies and TV series share one numeric id space.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Feature film.
    #[default]
    Movie,
    /// TV series.
    Tv,
}

impl MediaKind {
    /// Wire name (`movie` / `tv`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown media kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media kind: {0} (expected movie or tv)")]
pub struct ParseMediaKindError(String);

impl FromStr for MediaKind {
    type Err = ParseMediaKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            other => Err(ParseMediaKindError(String::from(other))),
        }
    }
}

/// A favorite returned by `GET /retrieve`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Favorite {
    /// TMDB id. The backend sends it as a number or a numeric string.
    #[serde(deserialize_with = "deserialize_tmdb_id")]
    pub tmdb_id: u64,
    /// Item kind (defaults to movie when missing).
    #[serde(default)]
    pub media_type: MediaKind,
    /// When the item was added.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `GET /retrieve` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct FavoritesResponse {
    #[serde(default)]
    pub favorites: Vec<Favorite>,
}

/// `POST /add` and `DELETE /delete/{id}` request body.
#[derive(Debug, Serialize)]
pub(crate) struct FavoriteRequest {
    pub tmdb_id: String,
    pub media_type: MediaKind,
}

fn deserialize_tmdb_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn test_registration_requires_all_fields() {
        // Arrange
        let registration = Registration {
            name: String::from("A"),
            email: String::from("a@b.com"),
            password: String::from("secret123"),
            password_confirmation: String::from("  "),
        };

        // Act & Assert
        assert_eq!(registration.validate(), Err(ValidationError::MissingFields));
    }

    #[test]
    fn test_registration_password_mismatch() {
        // Arrange
        let registration = Registration {
            name: String::from("A"),
            email: String::from("a@b.com"),
            password: String::from("secret123"),
            password_confirmation: String::from("secret124"),
        };

        // Act
        let err = registration.validate().unwrap_err();

        // Assert
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn test_update_without_password_is_valid() {
        // Arrange
        let updates = UserUpdate {
            name: Some(String::from("B")),
            ..UserUpdate::default()
        };

        // Act & Assert
        assert!(updates.validate().is_ok());
    }

    #[test]
    fn test_update_password_rules() {
        // Arrange
        let mismatch = UserUpdate {
            password: Some(String::from("longenough")),
            password_confirmation: Some(String::from("different")),
            ..UserUpdate::default()
        };
        let short = UserUpdate {
            password: Some(String::from("short")),
            password_confirmation: Some(String::from("short")),
            ..UserUpdate::default()
        };

        // Act & Assert
        assert_eq!(
            mismatch.validate().unwrap_err().to_string(),
            "New passwords do not match"
        );
        assert_eq!(
            short.validate().unwrap_err().to_string(),
            "Password must be at least 8 characters"
        );
    }

    #[test]
    fn test_user_envelope_variants() {
        // Arrange
        let capitalized = r#"{"User":{"id":1,"name":"A","email":"a@b.com"}}"#;
        let lowercase = r#"{"user":{"id":"u-9","name":"B","email":"b@b.com"}}"#;
        let bare = r#"{"id":3,"name":"C","email":"c@b.com","created_at":"2024-01-01T00:00:00Z"}"#;

        // Act
        let a = serde_json::from_str::<UserEnvelope>(capitalized)
            .unwrap()
            .into_user();
        let b = serde_json::from_str::<UserEnvelope>(lowercase)
            .unwrap()
            .into_user();
        let c = serde_json::from_str::<UserEnvelope>(bare).unwrap().into_user();

        // Assert
        assert_eq!(a.id, UserId::Numeric(1));
        assert_eq!(b.id, UserId::Text(String::from("u-9")));
        assert_eq!(c.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_login_response_without_token() {
        // Arrange
        let json = r#"{"User":{"id":7,"name":"N","email":"n@b.com"}}"#;

        // Act
        let response: LoginResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert!(response.token.is_none());
        assert_eq!(response.user.email, "n@b.com");
    }

    #[test]
    fn test_favorite_accepts_string_and_number_ids() {
        // Arrange
        let json = r#"{"favorites":[
            {"tmdb_id":"550","media_type":"movie"},
            {"tmdb_id":1399,"media_type":"tv","created_at":"2024-05-01"}
        ]}"#;

        // Act
        let response: FavoritesResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.favorites.len(), 2);
        assert_eq!(response.favorites[0].tmdb_id, 550);
        assert_eq!(response.favorites[1].media_type, MediaKind::Tv);
        assert_eq!(
            response.favorites[1].created_at.as_deref(),
            Some("2024-05-01")
        );
    }

    #[test]
    fn test_favorite_rejects_non_numeric_id() {
        // Arrange
        let json = r#"{"favorites":[{"tmdb_id":"abc","media_type":"movie"}]}"#;

        // Act
        let result = serde_json::from_str::<FavoritesResponse>(json);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_favorites_missing_is_empty() {
        // Arrange & Act
        let response: FavoritesResponse = serde_json::from_str("{}").unwrap();

        // Assert
        assert!(response.favorites.is_empty());
    }

    #[test]
    fn test_user_update_skips_unset_fields() {
        // Arrange
        let update = UserUpdate {
            name: Some(String::from("New")),
            ..UserUpdate::default()
        };

        // Act
        let json = serde_json::to_string(&update).unwrap();

        // Assert
        assert_eq!(json, r#"{"name":"New"}"#);
    }

    #[test]
    fn test_merged_ignores_password_fields() {
        // Arrange
        let user = User {
            id: UserId::Numeric(1),
            name: String::from("Old"),
            email: String::from("old@b.com"),
            created_at: None,
        };
        let update = UserUpdate {
            email: Some(String::from("new@b.com")),
            password: Some(String::from("secret123")),
            ..UserUpdate::default()
        };

        // Act
        let merged = user.merged(&update);

        // Assert
        assert_eq!(merged.name, "Old");
        assert_eq!(merged.email, "new@b.com");
        assert!(!serde_json::to_string(&merged).unwrap().contains("secret"));
    }

    #[test]
    fn test_media_kind_parse() {
        // Arrange & Act & Assert
        assert_eq!("movie".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert_eq!("TV".parse::<MediaKind>().unwrap(), MediaKind::Tv);
        assert!("show".parse::<MediaKind>().is_err());
    }
}
