//! Normalization and validation of identity fields.
//!
//! Every normalizer is deterministic and idempotent. Validators run on the
//! normalized value. Signup and login validation check every field and return
//! all violations at once.

use akiba_models::{FieldErrors, LoginIdentifier, LoginRequest, SignupRequest};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidateEmail;

use super::password::MAX_PASSWORD_BYTES;

pub const EMAIL_MESSAGE: &str = "must be a valid email address";
pub const PHONE_MESSAGE: &str = "must be valid E.164 format";
pub const USERNAME_MESSAGE: &str = "must be 3-20 chars and only letters, numbers, underscore";
pub const PASSWORD_MESSAGE: &str = "must be at least 8 chars and include a letter and number";
pub const PASSWORD_LENGTH_MESSAGE: &str = "must be at most 72 bytes";
pub const REQUIRED_MESSAGE: &str = "is required";

const MIN_PASSWORD_CHARS: usize = 8;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_]{3,20}$").expect("valid username regex");
    static ref E164_RE: Regex = Regex::new(r"^\+[1-9][0-9]{7,14}$").expect("valid E.164 regex");
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn normalize_phone(phone: &str) -> String {
    phone.trim().to_string()
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Only surrounding whitespace is removed; inner whitespace is part of the secret.
pub fn normalize_password(password: &str) -> String {
    password.trim().to_string()
}

pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email.validate_email()
}

pub fn is_valid_phone(phone: &str) -> bool {
    E164_RE.is_match(phone)
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Picks the identity field a login string refers to, by shape alone:
/// `@` means email, a leading `+` means phone, anything else is a username.
/// The value is normalized with the same rule used at signup.
pub fn classify_login(login: &str) -> LoginIdentifier {
    let login = login.trim();
    if login.contains('@') {
        LoginIdentifier::Email(normalize_email(login))
    } else if login.starts_with('+') {
        LoginIdentifier::Phone(normalize_phone(login))
    } else {
        LoginIdentifier::Username(normalize_username(login))
    }
}

/// Signup fields after normalization; all of them passed validation.
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedSignup {
    pub email: String,
    pub phone: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for NormalizedSignup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedSignup")
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub fn validate_signup(request: &SignupRequest) -> Result<NormalizedSignup, FieldErrors> {
    let email = normalize_email(&request.email);
    let phone = normalize_phone(&request.phone);
    let username = normalize_username(&request.username);
    let password = normalize_password(&request.password);

    let mut fields = FieldErrors::new();
    if !is_valid_email(&email) {
        fields.insert("email".to_string(), EMAIL_MESSAGE.to_string());
    }
    if !is_valid_phone(&phone) {
        fields.insert("phone".to_string(), PHONE_MESSAGE.to_string());
    }
    if !is_valid_username(&username) {
        fields.insert("username".to_string(), USERNAME_MESSAGE.to_string());
    }
    if !is_valid_password(&password) {
        fields.insert("password".to_string(), PASSWORD_MESSAGE.to_string());
    } else if password.len() > MAX_PASSWORD_BYTES {
        fields.insert("password".to_string(), PASSWORD_LENGTH_MESSAGE.to_string());
    }

    if fields.is_empty() {
        Ok(NormalizedSignup {
            email,
            phone,
            username,
            password,
        })
    } else {
        Err(fields)
    }
}

/// Login input ready for lookup. `password` is the caller's raw value: it is
/// compared against the stored hash without trimming.
#[derive(Clone)]
pub struct NormalizedLogin {
    pub login: LoginIdentifier,
    pub password: String,
}

pub fn validate_login(request: &LoginRequest) -> Result<NormalizedLogin, FieldErrors> {
    let mut fields = FieldErrors::new();
    if request.login.trim().is_empty() {
        fields.insert("login".to_string(), REQUIRED_MESSAGE.to_string());
    }
    if request.password.trim().is_empty() {
        fields.insert("password".to_string(), REQUIRED_MESSAGE.to_string());
    }
    if !fields.is_empty() {
        return Err(fields);
    }

    Ok(NormalizedLogin {
        login: classify_login(&request.login),
        password: request.password.clone(),
    })
}
