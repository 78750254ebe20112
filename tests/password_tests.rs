//! Password hashing tests

use chirpy_auth::{auth::PasswordHasher, error::AuthError};

#[test]
fn test_password_hash_and_verify() {
    let hasher = PasswordHasher::new();
    let password = "yelllows";

    let hash = hasher.hash(password).expect("Hashing should succeed");
    assert!(!hash.is_empty());

    hasher.verify(password, &hash).expect("Verification should succeed");
}

#[test]
fn test_password_verify_with_wrong_password() {
    let hasher = PasswordHasher::new();

    let hash = hasher.hash("yelllows").expect("Hashing should succeed");

    let result = hasher.verify("wrongpass", &hash);
    assert!(matches!(result, Err(AuthError::HashMismatch)));
}

#[test]
fn test_password_does_not_match_other_hash() {
    let hasher = PasswordHasher::new();
    let hash1 = hasher.hash("correctPassword123!").unwrap();
    let hash2 = hasher.hash("anotherPassword456!").unwrap();

    assert!(hasher.verify("correctPassword123!", &hash2).is_err());
    assert!(hasher.verify("anotherPassword456!", &hash1).is_err());
    assert!(hasher.verify("", &hash1).is_err());
}

#[test]
fn test_password_hash_empty_string() {
    let hasher = PasswordHasher::new();

    let hash = hasher.hash("").expect("Empty password should hash");

    hasher.verify("", &hash).expect("Empty password should verify");
    assert!(hasher.verify("password", &hash).is_err());
}

#[test]
fn test_password_hash_special_and_unicode() {
    let hasher = PasswordHasher::new();

    for password in ["P@ssw0rd!#$", "密码测试Test123!🔒"] {
        let hash = hasher.hash(password).expect("Password should hash");
        hasher.verify(password, &hash).expect("Password should verify");
    }
}

#[test]
fn test_password_hash_long_password() {
    let hasher = PasswordHasher::new();
    let password = "bybcryptbecauseitislongerthan72byteswhichisaverylongstringindeed".repeat(8);

    let hash = hasher.hash(&password).expect("Long password should hash");
    hasher.verify(&password, &hash).expect("Long password should verify");

    // Argon2 reads the whole input, so a change past byte 72 still matters
    let mut altered = password.clone();
    altered.push('x');
    assert!(hasher.verify(&altered, &hash).is_err());
}

#[test]
fn test_password_verify_invalid_hash() {
    let hasher = PasswordHasher::new();

    for bad in ["invalid_hash_format", "invalidhash", "$argon2id$v=19$broken", ""] {
        assert!(
            matches!(hasher.verify("yelllows", bad), Err(AuthError::HashMismatch)),
            "hash {:?} should fail closed",
            bad
        );
    }
}
