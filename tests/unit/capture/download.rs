use super::*;

#[test]
fn file_name_carries_timestamp_and_extension() {
    assert_eq!(
        export_file_name(1_700_000_000_123, "mp4"),
        "spectroflow-export-1700000000123.mp4"
    );
}

#[test]
fn blob_concatenates_chunks_in_order() {
    let blob = Blob::from_chunks("video/webm", &[vec![1, 2], vec![], vec![3]]);
    assert_eq!(blob.bytes, vec![1, 2, 3]);
    assert_eq!(blob.mime_type, "video/webm");
    assert!(!blob.is_empty());
}

#[test]
fn directory_downloads_writes_the_file() {
    let dir = std::env::temp_dir().join(format!(
        "spectroflow-downloads-{}-{}",
        std::process::id(),
        unix_millis_now()
    ));
    let mut target = DirectoryDownloads::new(&dir);
    let blob = Blob::from_chunks("video/webm", &[b"abc".to_vec()]);
    let path = target.deliver("clip.webm", &blob).unwrap();
    assert_eq!(path, dir.join("clip.webm"));
    assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn nested_names_are_rejected() {
    let mut target = DirectoryDownloads::new(std::env::temp_dir());
    let blob = Blob::from_chunks("video/webm", &[]);
    assert!(target.deliver("../escape.webm", &blob).is_err());
}
