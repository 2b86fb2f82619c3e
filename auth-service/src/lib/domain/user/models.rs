use std::fmt;
use std::str::FromStr;

use crate::user::errors::EmailError;
use crate::user::errors::RepositoryError;

/// User account entity.
///
/// `session_id` is present iff the user has an active session and
/// `reset_token` is present iff a password reset is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub hashed_password: String,
    pub session_id: Option<SessionId>,
    pub reset_token: Option<ResetToken>,
}

/// User unique identifier, assigned by the store at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub i64);

impl UserId {
    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFilter` - String is not an integer
    pub fn from_string(s: &str) -> Result<Self, RepositoryError> {
        s.parse::<i64>()
            .map(UserId)
            .map_err(|e| RepositoryError::InvalidFilter(format!("id: {}", e)))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Validated EmailAddress value object
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque credential of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Single-use credential authorizing one password change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResetToken(String);

impl ResetToken {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Persisted fields of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Id,
    Email,
    HashedPassword,
    SessionId,
    ResetToken,
}

impl UserField {
    /// Column name in the `users` table.
    pub fn column(&self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Email => "email",
            UserField::HashedPassword => "hashed_password",
            UserField::SessionId => "session_id",
            UserField::ResetToken => "reset_token",
        }
    }

    fn is_nullable(&self) -> bool {
        matches!(self, UserField::SessionId | UserField::ResetToken)
    }

    fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (UserField::Id, FieldValue::Id(_)) => true,
            (UserField::Id, _) => false,
            (_, FieldValue::Id(_)) => false,
            (_, FieldValue::Text(_)) => true,
            (field, FieldValue::Null) => field.is_nullable(),
        }
    }

    fn parse_value(&self, raw: Option<&str>) -> Result<FieldValue, RepositoryError> {
        match (self, raw) {
            (UserField::Id, Some(raw)) => UserId::from_string(raw).map(FieldValue::Id),
            (_, Some(raw)) => Ok(FieldValue::Text(raw.to_string())),
            (_, None) => Ok(FieldValue::Null),
        }
    }
}

impl FromStr for UserField {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(UserField::Id),
            "email" => Ok(UserField::Email),
            "hashed_password" => Ok(UserField::HashedPassword),
            "session_id" => Ok(UserField::SessionId),
            "reset_token" => Ok(UserField::ResetToken),
            other => Err(RepositoryError::InvalidFilter(format!(
                "unknown field '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Value compared against, or written to, a user field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Id(UserId),
    Text(String),
    Null,
}

impl FieldValue {
    /// Whether the value equals the given optional text.
    fn matches_text(&self, actual: Option<&str>) -> bool {
        match self {
            FieldValue::Text(expected) => actual == Some(expected.as_str()),
            FieldValue::Null => actual.is_none(),
            FieldValue::Id(_) => false,
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Conjunction of field equality conditions used to look users up.
///
/// Every condition is checked against the field schema on construction, so a
/// filter that exists is always valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFilter {
    conditions: Vec<(UserField, FieldValue)>,
}

impl UserFilter {
    /// Filter on a single field.
    ///
    /// # Errors
    /// * `InvalidFilter` - Value type does not fit the field
    pub fn by(field: UserField, value: FieldValue) -> Result<Self, RepositoryError> {
        Self {
            conditions: Vec::new(),
        }
        .and(field, value)
    }

    /// Add a condition to the filter.
    ///
    /// # Errors
    /// * `InvalidFilter` - Value type does not fit the field
    pub fn and(mut self, field: UserField, value: FieldValue) -> Result<Self, RepositoryError> {
        if !field.accepts(&value) {
            return Err(RepositoryError::InvalidFilter(format!(
                "value {:?} does not fit field '{}'",
                value, field
            )));
        }
        self.conditions.push((field, value));
        Ok(self)
    }

    pub fn by_id(id: UserId) -> Self {
        Self {
            conditions: vec![(UserField::Id, FieldValue::Id(id))],
        }
    }

    pub fn by_email(email: &EmailAddress) -> Self {
        Self {
            conditions: vec![(UserField::Email, FieldValue::Text(email.as_str().to_string()))],
        }
    }

    pub fn by_session_id(session_id: &str) -> Self {
        Self {
            conditions: vec![(UserField::SessionId, FieldValue::Text(session_id.to_string()))],
        }
    }

    pub fn by_reset_token(reset_token: &str) -> Self {
        Self {
            conditions: vec![(UserField::ResetToken, FieldValue::Text(reset_token.to_string()))],
        }
    }

    /// Build a filter from raw field names and values.
    ///
    /// `None` values match absent (null) fields.
    ///
    /// # Errors
    /// * `InvalidFilter` - Unknown field name, unparsable value, or no pairs
    pub fn parse<'a, I>(pairs: I) -> Result<Self, RepositoryError>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut filter = Self {
            conditions: Vec::new(),
        };
        for (name, raw) in pairs {
            let field = name.parse::<UserField>()?;
            let value = field.parse_value(raw)?;
            filter = filter.and(field, value)?;
        }
        if filter.conditions.is_empty() {
            return Err(RepositoryError::InvalidFilter("empty filter".to_string()));
        }
        Ok(filter)
    }

    pub fn conditions(&self) -> &[(UserField, FieldValue)] {
        &self.conditions
    }

    /// Whether a user satisfies every condition.
    pub fn matches(&self, user: &User) -> bool {
        self.conditions.iter().all(|(field, value)| match field {
            UserField::Id => *value == FieldValue::Id(user.id),
            UserField::Email => value.matches_text(Some(user.email.as_str())),
            UserField::HashedPassword => value.matches_text(Some(user.hashed_password.as_str())),
            UserField::SessionId => {
                value.matches_text(user.session_id.as_ref().map(SessionId::as_str))
            }
            UserField::ResetToken => {
                value.matches_text(user.reset_token.as_ref().map(ResetToken::as_str))
            }
        })
    }
}

/// Set of field assignments applied to one user as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    changes: Vec<(UserField, FieldValue)>,
}

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assignment to the patch.
    ///
    /// # Errors
    /// * `InvalidFilter` - Field is `id`, or the value does not fit the field
    pub fn set(mut self, field: UserField, value: FieldValue) -> Result<Self, RepositoryError> {
        if field == UserField::Id {
            return Err(RepositoryError::InvalidFilter(
                "field 'id' cannot be updated".to_string(),
            ));
        }
        if !field.accepts(&value) {
            return Err(RepositoryError::InvalidFilter(format!(
                "value {:?} does not fit field '{}'",
                value, field
            )));
        }
        self.assign(field, value);
        Ok(self)
    }

    // A later assignment to the same field replaces the earlier one.
    fn assign(&mut self, field: UserField, value: FieldValue) {
        self.changes.retain(|(existing, _)| *existing != field);
        self.changes.push((field, value));
    }

    pub fn session_id(mut self, session_id: Option<&SessionId>) -> Self {
        self.assign(
            UserField::SessionId,
            session_id.map_or(FieldValue::Null, |s| FieldValue::Text(s.as_str().to_string())),
        );
        self
    }

    pub fn reset_token(mut self, reset_token: Option<&ResetToken>) -> Self {
        self.assign(
            UserField::ResetToken,
            reset_token.map_or(FieldValue::Null, |t| FieldValue::Text(t.as_str().to_string())),
        );
        self
    }

    pub fn hashed_password(mut self, hashed_password: String) -> Self {
        self.assign(UserField::HashedPassword, FieldValue::Text(hashed_password));
        self
    }

    /// Build a patch from raw field names and values.
    ///
    /// # Errors
    /// * `InvalidFilter` - Unknown or immutable field name, or unfit value
    pub fn parse<'a, I>(pairs: I) -> Result<Self, RepositoryError>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        pairs.into_iter().try_fold(Self::new(), |patch, (name, raw)| {
            let field = name.parse::<UserField>()?;
            let value = field.parse_value(raw)?;
            patch.set(field, value)
        })
    }

    pub fn changes(&self) -> &[(UserField, FieldValue)] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Apply every assignment to a copy of `user`.
    ///
    /// # Errors
    /// * `InvalidFilter` - A new email is not a valid address
    pub fn apply(&self, user: &User) -> Result<User, RepositoryError> {
        let mut updated = user.clone();
        for (field, value) in self.changes.iter().cloned() {
            match field {
                UserField::Id => {}
                UserField::Email => {
                    let email = value.into_text().unwrap_or_default();
                    updated.email = EmailAddress::new(email)
                        .map_err(|e| RepositoryError::InvalidFilter(e.to_string()))?;
                }
                UserField::HashedPassword => {
                    updated.hashed_password = value.into_text().unwrap_or_default();
                }
                UserField::SessionId => {
                    updated.session_id = value.into_text().map(SessionId::new);
                }
                UserField::ResetToken => {
                    updated.reset_token = value.into_text().map(ResetToken::new);
                }
            }
        }
        Ok(updated)
    }
}
