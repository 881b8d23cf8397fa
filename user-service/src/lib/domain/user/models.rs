use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::EmailError;
use crate::user::errors::NameError;
use crate::user::errors::PhoneNumberError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered user. The phone number is the login handle.
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub first_name: FirstName,
    pub last_name: Option<LastName>,
    pub email: Option<EmailAddress>,
    pub phone_number: PhoneNumber,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone_number", &self.phone_number)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Arguments
    /// * `s` - UUID string to parse
    ///
    /// # Returns
    /// Parsed UserId
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

const MAX_NAME_LENGTH: usize = 64;

fn validated_name(name: String) -> Result<String, NameError> {
    let name = name.trim().to_string();
    let length = name.chars().count();

    if length == 0 {
        Err(NameError::Empty)
    } else if length > MAX_NAME_LENGTH {
        Err(NameError::TooLong {
            max: MAX_NAME_LENGTH,
            actual: length,
        })
    } else {
        Ok(name)
    }
}

/// Display name shown for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstName(String);

impl FirstName {
    /// Create a first name, trimming surrounding whitespace.
    ///
    /// # Errors
    /// * `Empty` - Nothing left after trimming
    /// * `TooLong` - More than 64 characters
    pub fn new(name: String) -> Result<Self, NameError> {
        validated_name(name).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FirstName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastName(String);

impl LastName {
    /// Create a last name, trimming surrounding whitespace.
    ///
    /// # Errors
    /// * `Empty` - Nothing left after trimming
    /// * `TooLong` - More than 64 characters
    pub fn new(name: String) -> Result<Self, NameError> {
        validated_name(name).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone number value type, used as the login handle.
///
/// Accepts an optional leading `+` followed by 4-15 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MIN_DIGITS: usize = 4;
    const MAX_DIGITS: usize = 15;

    /// Create a validated phone number.
    ///
    /// # Arguments
    /// * `phone_number` - Raw phone number string
    ///
    /// # Errors
    /// * `InvalidFormat` - Not an optional `+` followed by 4-15 digits
    pub fn new(phone_number: String) -> Result<Self, PhoneNumberError> {
        let phone_number = phone_number.trim().to_string();
        let digits = phone_number.strip_prefix('+').unwrap_or(&phone_number);

        let valid_length = (Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len());
        if valid_length && digits.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(phone_number))
        } else {
            Err(PhoneNumberError::InvalidFormat {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            })
        }
    }

    /// Get phone number as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
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
    ///
    /// # Returns
    /// Email string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Command to register a new user with domain types
#[derive(Debug)]
pub struct RegisterCommand {
    pub first_name: FirstName,
    pub phone_number: PhoneNumber,
    pub password: String,
}

impl RegisterCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `first_name` - Validated display name
    /// * `phone_number` - Validated login handle
    /// * `password` - Plain text password (will be hashed by service)
    pub fn new(first_name: FirstName, phone_number: PhoneNumber, password: String) -> Self {
        Self {
            first_name,
            phone_number,
            password,
        }
    }
}

/// Command to update profile fields of the authenticated user.
///
/// All fields are optional to support partial updates.
/// Only provided fields will be updated. For the optional profile fields
/// `Some(None)` clears the stored value.
#[derive(Debug, Default)]
pub struct UpdateProfileCommand {
    pub first_name: Option<FirstName>,
    pub last_name: Option<Option<LastName>>,
    pub email: Option<Option<EmailAddress>>,
    pub phone_number: Option<PhoneNumber>,
}

impl UpdateProfileCommand {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
    }
}
