/// Password hashing and signup input checks
///
/// Passwords are hashed with Argon2id (64 MB memory, 3 passes, 4 lanes) and
/// stored as PHC strings, so verification reads its parameters back from the
/// stored hash. Verification is constant-time inside `argon2`.
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("MyP@ssw0rd!")?;
/// assert!(verify_password("MyP@ssw0rd!", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Errors from hashing or verifying a password
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a parseable PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

const M_COST_KIB: u32 = 65536;
const T_COST: u32 = 3;
const P_COST: u32 = 4;

/// Hashes a password with Argon2id and a fresh random salt
///
/// Returns a PHC string such as `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(M_COST_KIB)
        .t_cost(T_COST)
        .p_cost(P_COST)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored PHC hash
///
/// `Ok(false)` means the password is wrong; `Err` means the stored hash
/// itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Special characters accepted by the password policy
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+=-";

/// Policy message returned for any password that fails the check
pub const PASSWORD_POLICY_MESSAGE: &str = "Password must be between 8-32 characters and contain an uppercase letter, a lowercase letter, a number, and a special character";

/// Validates password strength
///
/// A password is accepted when it:
/// - is 8 to 32 characters long
/// - contains an ASCII uppercase letter
/// - contains an ASCII lowercase letter
/// - contains an ASCII digit
/// - contains one of `!@#$%^&*()_+=-`
///
/// All failures return the same policy message.
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("MyP@ssw0rd!").is_ok());
/// assert!(validate_password_strength("Sh0rt!").is_err());
/// assert!(validate_password_strength("Password123").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    let length = password.chars().count();

    let acceptable = (8..=32).contains(&length)
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c));

    if acceptable {
        Ok(())
    } else {
        Err(PASSWORD_POLICY_MESSAGE.to_string())
    }
}

/// Accepted email shape: `local@label.rest`
pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+$").expect("email pattern compiles")
});

/// Checks an email address against [`EMAIL_PATTERN`]
pub fn validate_email(email: &str) -> Result<(), String> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err("Invalid email format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_phc() {
        let hash = hash_password("MyP@ssw0rd!").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(hash.contains("m=65536,t=3,p=4"));
    }

    #[test]
    fn test_hash_uses_fresh_salt() {
        let first = hash_password("MyP@ssw0rd!").unwrap();
        let second = hash_password("MyP@ssw0rd!").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("MyP@ssw0rd!").unwrap();

        assert!(verify_password("MyP@ssw0rd!", &hash).unwrap());
        assert!(!verify_password("myp@ssw0rd!", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_against_unusable_hash() {
        assert!(matches!(
            verify_password("MyP@ssw0rd!", "plaintext"),
            Err(PasswordError::InvalidHash(_))
        ));
        assert!(verify_password("MyP@ssw0rd!", "$argon2id$invalid").is_err());
    }

    #[test]
    fn test_validate_password_strength_valid() {
        let valid_passwords = vec![
            "MyP@ssw0rd!",
            "Str0ng!Pass",
            "C0mpl3x#Pwd",
            "S3cur3$Password",
            "Aa1-aaaa",
        ];

        for password in valid_passwords {
            assert!(
                validate_password_strength(password).is_ok(),
                "Password '{}' should be valid",
                password
            );
        }
    }

    #[test]
    fn test_validate_password_strength_length_bounds() {
        assert!(validate_password_strength("Sh0rt!").is_err());
        assert!(validate_password_strength("Aa1!aaaa").is_ok());

        let at_limit = format!("Aa1!{}", "a".repeat(28));
        assert_eq!(at_limit.len(), 32);
        assert!(validate_password_strength(&at_limit).is_ok());

        let over_limit = format!("Aa1!{}", "a".repeat(29));
        let err = validate_password_strength(&over_limit).unwrap_err();
        assert!(err.contains("8-32 characters"));
    }

    #[test]
    fn test_validate_password_strength_missing_classes() {
        assert!(validate_password_strength("lowercase1!").is_err());
        assert!(validate_password_strength("UPPERCASE1!").is_err());
        assert!(validate_password_strength("NoDigits!!").is_err());
        assert!(validate_password_strength("NoSpecial123").is_err());
    }

    #[test]
    fn test_validate_password_strength_special_set() {
        // Only the listed specials count
        assert!(validate_password_strength("Password1?").is_err());
        assert!(validate_password_strength("Password1~").is_err());
        assert!(validate_password_strength("Password1=").is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("first.last+tag@mail-host.co.uk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@localhost").is_err());
        assert!(validate_email("alice@.com").is_err());
        assert!(validate_email("alice@example.").is_err());
        assert!(validate_email("al ice@example.com").is_err());
        assert!(validate_email("alice@exa_mple.com").is_err());
        assert!(validate_email("alice@example.com\n").is_err());
        assert!(validate_email("x alice@example.com").is_err());
    }
}
