use evidence_core::document::{
    ContentHash, DirectoryCorpus, Document, DocumentCorpus, DocumentError, DocumentId,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn make_doc(source: &str, content: Vec<u8>) -> Result<Document, DocumentError> {
    let id = DocumentId::new(source).expect("Test id error");
    Document::ingest(id, source.to_string(), content, None)
}

#[test]
fn invariant_utf8_rejection() {
    // Invalid UTF-8 sequence
    let invalid_bytes = vec![0, 159, 146, 150];
    let result = make_doc("doc.md", invalid_bytes);
    assert!(matches!(result, Err(DocumentError::InvalidUtf8(_))));
}

#[test]
fn invariant_same_content_same_hash() {
    let content = "Hello world".as_bytes().to_vec();

    let doc1 = make_doc("a.md", content.clone()).unwrap();
    let doc2 = make_doc("b.md", content).unwrap();

    assert_eq!(doc1.version, doc2.version);
    assert_ne!(doc1.id, doc2.id);
}

#[test]
fn invariant_no_newline_normalization() {
    let doc_unix = make_doc("doc.md", b"line\n".to_vec()).unwrap();
    let doc_windows = make_doc("doc.md", b"line\r\n".to_vec()).unwrap();

    assert_ne!(doc_unix.version, doc_windows.version);
}

#[test]
fn hash_format_is_prefixed_sha256() {
    let hash = ContentHash::from_content(b"");
    assert_eq!(
        hash.as_str(),
        "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn ingest_extracts_title_and_url() {
    let doc = make_doc(
        "149520415.md",
        b"# Password Policy\n\n**Source URL:** https://wiki.example.com/pages/149520415\n\nRules."
            .to_vec(),
    )
    .unwrap();

    assert_eq!(doc.title, "Password Policy");
    assert_eq!(doc.url, "https://wiki.example.com/pages/149520415");
}

#[test]
fn id_from_path_is_relative_to_root() {
    let id = DocumentId::from_path(Path::new("docs"), Path::new("docs/Guide.md")).unwrap();
    assert_eq!(id.as_str(), "guide.md");

    assert!(DocumentId::from_path(Path::new("docs"), Path::new("other/guide.md")).is_err());
}

#[test]
fn directory_corpus_reads_markdown_sorted_and_skips_bad_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.md"), "# Beta\nbody").unwrap();
    fs::write(dir.path().join("A.md"), "# Alpha\nbody").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    fs::write(dir.path().join("broken.md"), [0u8, 159, 146, 150]).unwrap();
    fs::create_dir(dir.path().join("nested.md")).unwrap();

    let corpus = DirectoryCorpus::new(dir.path());
    let docs = corpus.documents().unwrap();

    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a.md", "b.md"]);
    assert_eq!(docs[0].title, "Alpha");
    assert!(docs[0].last_modified.is_some());

    let fetched = corpus.fetch(&DocumentId::new("b.md").unwrap()).unwrap();
    assert_eq!(fetched.map(|d| d.title), Some("Beta".to_string()));
}

#[test]
fn directory_corpus_missing_root_is_an_error() {
    let dir = tempdir().unwrap();
    let corpus = DirectoryCorpus::new(dir.path().join("missing"));
    assert!(corpus.documents().is_err());
}

#[test]
fn directory_corpus_keeps_one_file_per_identity() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Policy.md"), "# Upper\nbody").unwrap();
    fs::write(dir.path().join("policy.md"), "# Lower\nbody").unwrap();
    fs::write(dir.path().join("other.md"), "# Other\nbody").unwrap();

    let docs = DirectoryCorpus::new(dir.path()).documents().unwrap();

    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["other.md", "policy.md"]);
    // Paths sort uppercase first
    assert_eq!(docs[1].title, "Upper");
    assert!(docs[1].source.ends_with("Policy.md"));
}
