//! Tests for repository metadata parsing and the publisher trust chain.

use super::*;
use crate::test_utils::{
    FixtureRepository, PUBLISHER_KEY, StubTransport, TEST_BASE_URL, other_fingerprint,
    publisher_fingerprint, repomd_xml, sha256_hex,
};
use crate::trust::{Fingerprint, MockKeyringSource, MockTrustStore, TrustStore};
use rstest::{fixture, rstest};

const REPOMD_FIXTURE: &[u8] = include_bytes!("../tests/fixtures/repodata/repomd.xml");

#[fixture]
fn config() -> RepositoryConfig {
    RepositoryConfig::new("/home/analyst/.gnupg/pubring.gpg").with_base_url(TEST_BASE_URL)
}

#[fixture]
fn served() -> StubTransport {
    let repo = FixtureRepository::with_versions(&["4.2.0-17-generic"]).expect("fixture repo");
    repo.serve(&["4.2.0-17-generic"])
}

/// A keyring that parses the publisher key and yields `store` once.
fn keyring_with(store: MockTrustStore) -> MockKeyringSource {
    let mut keyring = MockKeyringSource::new();
    keyring
        .expect_read_public_key()
        .returning(|_| Ok(publisher_fingerprint()));
    keyring
        .expect_load_trust_store()
        .return_once(move || Ok(Box::new(store) as Box<dyn TrustStore>));
    keyring
}

fn trusting_store(signer: Fingerprint) -> MockTrustStore {
    let mut store = MockTrustStore::new();
    store
        .expect_contains_fingerprint()
        .returning(|fingerprint| *fingerprint == publisher_fingerprint());
    store
        .expect_verify_detached()
        .returning(move |_, _| Ok(signer.clone()));
    store
}

#[test]
fn parses_repository_metadata_fixture() {
    let metadata = parse_repo_metadata(REPOMD_FIXTURE).expect("fixture parses");

    assert_eq!(metadata.revision, "1487818901");
    let manifest = metadata.manifest;
    assert_eq!(manifest.kind, PRIMARY_DATA_TYPE);
    assert_eq!(
        manifest.checksum.as_str(),
        "eba1bffc37262c1866cd5c76775181c507fe84c0321e166e2febda745e13545e"
    );
    assert_eq!(
        manifest.open_checksum.as_str(),
        "0cf6f38bb35f9ea27158575b290ddcad4264ccbd3bdf01ffad9480ac24cb924f"
    );
    assert_eq!(
        manifest.location.href,
        "repodata/0cf6f38bb35f9ea27158575b290ddcad4264ccbd3bdf01ffad9480ac24cb924f-primary.xml.gz"
    );
    assert_eq!(manifest.timestamp, "1487818901");
    assert_eq!(manifest.size, 23803);
    assert_eq!(manifest.open_size, 167_164);
}

#[test]
fn selects_primary_descriptor_among_several() {
    let other = "1".repeat(64);
    let primary = "2".repeat(64);
    let xml = format!(
        concat!(
            "<repomd><revision>7</revision>",
            "<data type=\"other\"><checksum>{other}</checksum><open_checksum>{other}</open_checksum>",
            "<location href=\"repodata/other.xml.gz\"/></data>",
            "<data type=\"primary\"><checksum>{primary}</checksum><open_checksum>{primary}</open_checksum>",
            "<location href=\"repodata/primary.xml.gz\"/></data>",
            "</repomd>"
        ),
        other = other,
        primary = primary,
    );

    let metadata = parse_repo_metadata(xml.as_bytes()).expect("metadata parses");
    assert_eq!(metadata.manifest.location.href, "repodata/primary.xml.gz");
    assert_eq!(metadata.manifest.checksum.as_str(), primary);
}

#[rstest]
#[case::not_xml(b"this is not xml".as_slice())]
#[case::truncated(b"<repomd><revision>1</revision><data type=\"primary\">".as_slice())]
#[case::no_descriptor(b"<repomd><revision>1</revision></repomd>".as_slice())]
#[case::bad_digest(b"<repomd><data type=\"primary\"><checksum>xyz</checksum><open_checksum>xyz</open_checksum><location href=\"a\"/></data></repomd>".as_slice())]
#[case::not_utf8(b"\xff\xfe<repomd/>".as_slice())]
fn rejects_malformed_metadata(#[case] bytes: &[u8]) {
    let err = parse_repo_metadata(bytes).expect_err("metadata is malformed");
    assert!(
        matches!(err, RepositoryError::MetadataParse { .. }),
        "got {err:?}"
    );
}

#[rstest]
fn verified_fetch_returns_parsed_metadata(config: RepositoryConfig, served: StubTransport) {
    let keyring = keyring_with(trusting_store(publisher_fingerprint()));

    let metadata = MetadataFetcher::new(&config, &served, &keyring)
        .fetch()
        .expect("trusted metadata");

    assert_eq!(metadata.revision, "1487818901");
    assert_eq!(
        served.requests(),
        [
            "http://repo.test/repodata/repomd.xml",
            "http://repo.test/REPO_SIGNING_KEY.asc",
            "http://repo.test/repodata/repomd.xml.sig",
        ]
    );
}

#[rstest]
fn disabled_verification_skips_key_and_signature(config: RepositoryConfig, served: StubTransport) {
    let config = config.with_verification(false);
    let keyring = MockKeyringSource::new();

    MetadataFetcher::new(&config, &served, &keyring)
        .fetch()
        .expect("unverified metadata");

    assert!(!served.requested("REPO_SIGNING_KEY.asc"));
    assert!(!served.requested("repodata/repomd.xml.sig"));
}

#[rstest]
fn untrusted_publisher_key_aborts_before_signature(config: RepositoryConfig, served: StubTransport) {
    let mut store = MockTrustStore::new();
    store.expect_contains_fingerprint().return_const(false);
    store.expect_verify_detached().never();
    let keyring = keyring_with(store);

    let err = MetadataFetcher::new(&config, &served, &keyring)
        .fetch()
        .expect_err("key is not imported");

    match err {
        RepositoryError::KeyNotTrusted {
            fingerprint,
            keyring,
        } => {
            assert_eq!(fingerprint, publisher_fingerprint());
            assert_eq!(keyring, config.keyring());
        }
        other => panic!("expected KeyNotTrusted, got {other:?}"),
    }
    assert!(!served.requested("repodata/repomd.xml.sig"));
}

#[rstest]
fn invalid_signature_is_rejected(config: RepositoryConfig, served: StubTransport) {
    let mut store = MockTrustStore::new();
    store.expect_contains_fingerprint().return_const(true);
    store
        .expect_verify_detached()
        .returning(|_, _| Err(TrustError::NoValidSigner { keys: 1 }));
    let keyring = keyring_with(store);

    let err = MetadataFetcher::new(&config, &served, &keyring)
        .fetch()
        .expect_err("signature does not verify");
    assert!(matches!(err, RepositoryError::SignatureVerification { .. }));
}

#[rstest]
fn signature_is_checked_over_raw_metadata_bytes(config: RepositoryConfig, served: StubTransport) {
    let repo = FixtureRepository::with_versions(&["4.2.0-17-generic"]).expect("fixture repo");
    let expected_data = repo.metadata.clone();
    let expected_signature = repo.signature.clone();

    let mut store = MockTrustStore::new();
    store.expect_contains_fingerprint().return_const(true);
    store
        .expect_verify_detached()
        .withf(move |data, signature| {
            data == expected_data.as_slice() && signature == expected_signature.as_slice()
        })
        .times(1)
        .returning(|_, _| Ok(publisher_fingerprint()));
    let keyring = keyring_with(store);

    MetadataFetcher::new(&config, &served, &keyring)
        .fetch()
        .expect("trusted metadata");
}

#[rstest]
fn other_trusted_signer_is_accepted(config: RepositoryConfig, served: StubTransport) {
    let keyring = keyring_with(trusting_store(other_fingerprint()));

    let result = MetadataFetcher::new(&config, &served, &keyring).fetch();
    assert!(result.is_ok(), "got {result:?}");
}

#[rstest]
fn unparseable_signing_key_names_its_url(config: RepositoryConfig, served: StubTransport) {
    let mut keyring = MockKeyringSource::new();
    keyring.expect_read_public_key().returning(|_| {
        Err(TrustError::InvalidKey {
            reason: "no armor header".to_owned(),
        })
    });
    keyring.expect_load_trust_store().never();

    let err = MetadataFetcher::new(&config, &served, &keyring)
        .fetch()
        .expect_err("key is garbage");
    match err {
        RepositoryError::InvalidSigningKey { url, .. } => {
            assert_eq!(url, "http://repo.test/REPO_SIGNING_KEY.asc");
        }
        other => panic!("expected InvalidSigningKey, got {other:?}"),
    }
}

#[rstest]
fn unreadable_keyring_is_reported(config: RepositoryConfig, served: StubTransport) {
    let mut keyring = MockKeyringSource::new();
    keyring
        .expect_read_public_key()
        .withf(|armored| armored == PUBLISHER_KEY)
        .returning(|_| Ok(publisher_fingerprint()));
    keyring.expect_load_trust_store().returning(|| {
        Err(TrustError::KeyringUnreadable {
            path: "/home/analyst/.gnupg/pubring.gpg".into(),
            reason: "No such file or directory".to_owned(),
        })
    });

    let err = MetadataFetcher::new(&config, &served, &keyring)
        .fetch()
        .expect_err("keyring is missing");
    assert!(matches!(err, RepositoryError::KeyringLoad { .. }));
}

#[rstest]
fn missing_metadata_is_a_network_error(config: RepositoryConfig) {
    let transport = StubTransport::new();
    let keyring = MockKeyringSource::new();

    let err = MetadataFetcher::new(&config, &transport, &keyring)
        .fetch()
        .expect_err("nothing served");
    assert!(matches!(err, RepositoryError::Network { .. }));
}

#[rstest]
fn malformed_metadata_fails_after_authentication(config: RepositoryConfig) {
    let transport = StubTransport::new();
    transport.insert("repodata/repomd.xml", b"<repomd>".to_vec());
    transport.insert("repodata/repomd.xml.sig", b"sig".to_vec());
    transport.insert("REPO_SIGNING_KEY.asc", PUBLISHER_KEY.to_vec());
    let keyring = keyring_with(trusting_store(publisher_fingerprint()));

    let err = MetadataFetcher::new(&config, &transport, &keyring)
        .fetch()
        .expect_err("metadata is truncated");
    assert!(matches!(err, RepositoryError::MetadataParse { .. }));
}

#[test]
fn generated_metadata_round_trips_declared_digests() {
    let checksum = sha256_hex(b"compressed");
    let open_checksum = sha256_hex(b"open");
    let xml = repomd_xml(&checksum, &open_checksum, 10, 4);

    let metadata = parse_repo_metadata(xml.as_bytes()).expect("metadata parses");
    assert_eq!(metadata.manifest.checksum.as_str(), checksum);
    assert_eq!(metadata.manifest.open_checksum.as_str(), open_checksum);
    assert_eq!(metadata.manifest.size, 10);
}
