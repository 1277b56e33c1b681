use super::*;

fn artifact(bytes: &[u8]) -> Artifact {
    Artifact {
        bytes: bytes.to_vec(),
        mime_type: "video/mp4".to_string(),
        format: ExportFormat::Mp4,
        width: 1280,
        height: 720,
        bitrate_bps: 2_500_000,
        frames: 3,
    }
}

#[test]
fn mint_resolve_revoke() {
    let store = ArtifactStore::new();
    assert!(store.is_empty());

    let url = store.mint(artifact(b"abc"));
    assert!(url.as_str().starts_with("artifact://backdrop/0-"));
    assert_eq!(ArtifactUrl::parse(url.as_str()).unwrap(), url);
    assert_eq!(store.resolve(&url).unwrap().bytes, b"abc");

    assert!(store.revoke(&url));
    assert!(!store.revoke(&url));
    assert!(store.resolve(&url).is_none());
    assert!(store.is_empty());
}

#[test]
fn identical_artifacts_get_distinct_urls() {
    let store = ArtifactStore::new();
    let a = store.mint(artifact(b"same"));
    let b = store.clone().mint(artifact(b"same"));
    assert_ne!(a, b);
    assert_eq!(store.len(), 2);
}

#[test]
fn parse_rejects_foreign_and_malformed_urls() {
    assert!(ArtifactUrl::parse("blob:https://example.com/123").is_err());
    assert!(ArtifactUrl::parse("artifact://backdrop/x-0123456789abcdef").is_err());
    assert!(ArtifactUrl::parse("artifact://backdrop/1-0123").is_err());
    assert!(ArtifactUrl::parse("artifact://backdrop/1-0123456789abcdef").is_ok());
}
