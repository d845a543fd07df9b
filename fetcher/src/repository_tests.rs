//! Unit tests for repository client orchestration.

use super::*;
use crate::test_utils::{
    FixtureRepository, MANIFEST_HREF, StubKeyring, StubTransport, TEST_BASE_URL, other_fingerprint,
};
use crate::trust::MockKeyringSource;

const VERSIONS: &[&str] = &[
    "4.2.0-17-generic",
    "4.2.0-18-generic",
    "4.4.10-22.54.amzn1.x86_64",
];

fn config() -> RepositoryConfig {
    RepositoryConfig::new("/home/analyst/.gnupg/pubring.gpg").with_base_url(TEST_BASE_URL)
}

fn served() -> StubTransport {
    FixtureRepository::with_versions(VERSIONS)
        .expect("fixture repo")
        .serve(VERSIONS)
}

fn repository(
    config: RepositoryConfig,
    transport: &StubTransport,
    keyring: impl KeyringSource + 'static,
) -> Repository {
    Repository::with_collaborators(config, Box::new(transport.clone()), Box::new(keyring))
}

#[test]
fn list_returns_modules_in_manifest_order() {
    let transport = served();
    let repo = repository(config(), &transport, StubKeyring::trusting_publisher());

    let manifest = repo.list().expect("trusted repository");
    let versions: Vec<_> = manifest.modules().iter().map(|m| m.version.as_str()).collect();
    assert_eq!(versions, VERSIONS);
}

#[test]
fn find_returns_every_match() {
    let transport = served();
    let repo = repository(config(), &transport, StubKeyring::trusting_publisher());

    let modules = repo.find("*-generic").expect("two matches");
    assert_eq!(modules.len(), 2);
}

#[test]
fn find_without_match_is_not_found() {
    let transport = served();
    let repo = repository(config(), &transport, StubKeyring::trusting_publisher());

    let err = repo.find("5.*").expect_err("no match");
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[test]
fn get_downloads_single_match() {
    let temp = tempfile::tempdir().expect("temp dir");
    let transport = served();
    let repo = repository(
        config().with_download_dir(temp.path()),
        &transport,
        StubKeyring::trusting_publisher(),
    );

    let path = repo.get("4.4.10*amzn1.x86_64").expect("one match");

    assert_eq!(path, temp.path().join("lime-4.4.10-22.54.amzn1.x86_64.ko"));
    assert_eq!(
        std::fs::read(&path).expect("module written"),
        b"module for 4.4.10-22.54.amzn1.x86_64"
    );
}

#[test]
fn get_with_multiple_matches_downloads_nothing() {
    let transport = served();
    let repo = repository(config(), &transport, StubKeyring::trusting_publisher());

    let err = repo.get("*-generic").expect_err("ambiguous");

    match err {
        RepositoryError::AmbiguousMatch { query, count } => {
            assert_eq!(query, "*-generic");
            assert_eq!(count, 2);
        }
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }
    assert!(
        transport
            .requests()
            .iter()
            .all(|url| !url.contains("/modules/")),
        "requests: {:?}",
        transport.requests()
    );
}

#[test]
fn get_with_no_match_downloads_nothing() {
    let transport = served();
    let repo = repository(config(), &transport, StubKeyring::trusting_publisher());

    let err = repo.get("2.6.*").expect_err("no match");
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    assert!(
        transport
            .requests()
            .iter()
            .all(|url| !url.contains("/modules/"))
    );
}

#[test]
fn untrusted_key_aborts_before_manifest_fetch() {
    let transport = served();
    let repo = repository(
        config(),
        &transport,
        StubKeyring::trusting(vec![other_fingerprint()]),
    );

    let err = repo.list().expect_err("publisher key not imported");
    assert!(matches!(err, RepositoryError::KeyNotTrusted { .. }));
    assert!(!transport.requested(MANIFEST_HREF));
}

#[test]
fn tampered_metadata_fails_signature_check() {
    let transport = served();
    let repo_fixture = FixtureRepository::with_versions(&["4.2.0-17-generic"]).expect("fixture");
    // Metadata for a different manifest, still carrying the original signature.
    transport.insert("repodata/repomd.xml", repo_fixture.metadata);
    let repo = repository(config(), &transport, StubKeyring::trusting_publisher());

    let err = repo.list().expect_err("signature does not cover these bytes");
    assert!(matches!(err, RepositoryError::SignatureVerification { .. }));
    assert!(!transport.requested(MANIFEST_HREF));
}

#[test]
fn disabled_verification_never_touches_keyring() {
    let transport = served();
    let repo = repository(
        config().with_verification(false),
        &transport,
        MockKeyringSource::new(),
    );

    let manifest = repo.list().expect("unverified listing");
    assert_eq!(manifest.len(), VERSIONS.len());
    assert!(!transport.requested("REPO_SIGNING_KEY.asc"));
    assert!(!transport.requested("repodata/repomd.xml.sig"));
}

#[test]
fn tampered_manifest_is_rejected() {
    let transport = served();
    let other = FixtureRepository::with_versions(&["9.9.9-evil"]).expect("fixture");
    transport.insert(MANIFEST_HREF, other.compressed_manifest);
    let repo = repository(config(), &transport, StubKeyring::trusting_publisher());

    let err = repo.find("9.9.9-evil").expect_err("digest differs");
    assert!(matches!(
        err,
        RepositoryError::ChecksumMismatch {
            form: crate::error::DigestForm::Compressed,
            ..
        }
    ));
}

#[test]
fn every_operation_refetches_metadata() {
    let transport = served();
    let repo = repository(config(), &transport, StubKeyring::trusting_publisher());

    repo.list().expect("first listing");
    repo.list().expect("second listing");

    let metadata_fetches = transport
        .requests()
        .iter()
        .filter(|url| url.ends_with("repodata/repomd.xml"))
        .count();
    assert_eq!(metadata_fetches, 2);
}

#[test]
fn unreadable_keyring_is_reported() {
    let transport = served();
    let repo = repository(config(), &transport, StubKeyring::unreadable());

    let err = repo.list().expect_err("keyring missing");
    assert!(matches!(err, RepositoryError::KeyringLoad { .. }));
}
