//! Container codec for Stackblocks project archives.
//!
//! Every project is one ZIP-format container (an `.sb3`-style file) holding
//! the program graph (`project.json`), platform metadata (`data.json`), the
//! comment forest (`comments.json`), and binary assets named by content
//! identifier. This crate is the one place that touches the wire format:
//! everything above it works with [`Container`], an in-memory,
//! order-preserving entry list.
//!
//! # Design rules
//!
//! 1. A missing entry is `None`, never an error — callers must be able to
//!    tell "document absent, use the default" apart from "container
//!    corrupt".
//! 2. [`Container::put_entry`] replaces in place. Appending a second entry
//!    with the same name is how several generations of save handlers grew
//!    containers with duplicate `data.json` entries; that bug class is
//!    structurally impossible here.
//! 3. The codec never interprets entry contents.

pub mod container;
pub mod error;

pub use container::Container;
pub use error::{ArchiveError, ArchiveResult};

/// Container entry name for the program graph document.
pub const PROGRAM_ENTRY: &str = "project.json";
/// Container entry name for the metadata document.
pub const METADATA_ENTRY: &str = "data.json";
/// Container entry name for the comment forest document.
pub const COMMENTS_ENTRY: &str = "comments.json";

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Container {
        let mut c = Container::new();
        c.put_entry(PROGRAM_ENTRY, br#"{"targets":[]}"#.to_vec());
        c.put_entry(METADATA_ENTRY, br#"{"id":1}"#.to_vec());
        c.put_entry(COMMENTS_ENTRY, b"[]".to_vec());
        c.put_entry("83a9787d4cb6f3b7632b4ddfebf74367.wav", vec![0u8; 128]);
        c
    }

    #[test]
    fn roundtrip_preserves_entries_and_order() {
        let original = sample();
        let bytes = original.serialize().unwrap();
        let reopened = Container::open(&bytes).unwrap();
        assert_eq!(reopened, original);
        assert_eq!(
            reopened.entry_names(),
            [
                PROGRAM_ENTRY,
                METADATA_ENTRY,
                COMMENTS_ENTRY,
                "83a9787d4cb6f3b7632b4ddfebf74367.wav",
            ]
        );
    }

    #[test]
    fn read_missing_entry_is_none() {
        let c = sample();
        assert!(c.read_entry("nope.json").is_none());
    }

    #[test]
    fn put_entry_replaces_in_place() {
        let mut c = sample();
        c.put_entry(METADATA_ENTRY, br#"{"id":2}"#.to_vec());
        // Still one entry under that name, same position, new bytes.
        assert_eq!(c.len(), 4);
        assert_eq!(c.entry_names()[1], METADATA_ENTRY);
        assert_eq!(c.read_entry(METADATA_ENTRY).unwrap(), br#"{"id":2}"#);
    }

    #[test]
    fn repeated_saves_do_not_accumulate_duplicates() {
        let mut c = sample();
        for round in 0..5 {
            c.put_entry(METADATA_ENTRY, format!(r#"{{"id":{round}}}"#).into_bytes());
            let bytes = c.serialize().unwrap();
            c = Container::open(&bytes).unwrap();
        }
        assert_eq!(c.len(), 4);
        assert_eq!(c.read_entry(METADATA_ENTRY).unwrap(), br#"{"id":4}"#);
    }

    #[test]
    fn remove_entry() {
        let mut c = sample();
        assert!(c.remove_entry(COMMENTS_ENTRY));
        assert!(!c.contains(COMMENTS_ENTRY));
        assert!(!c.remove_entry(COMMENTS_ENTRY));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn untouched_entries_survive_byte_identical() {
        let original = sample();
        let bytes = original.serialize().unwrap();
        let mut reopened = Container::open(&bytes).unwrap();
        reopened.put_entry(METADATA_ENTRY, br#"{"id":9}"#.to_vec());
        let bytes2 = reopened.serialize().unwrap();
        let reopened2 = Container::open(&bytes2).unwrap();

        assert_eq!(
            reopened2.read_entry(PROGRAM_ENTRY),
            original.read_entry(PROGRAM_ENTRY)
        );
        assert_eq!(
            reopened2.read_entry("83a9787d4cb6f3b7632b4ddfebf74367.wav"),
            original.read_entry("83a9787d4cb6f3b7632b4ddfebf74367.wav")
        );
    }

    #[test]
    fn open_garbage_is_corrupt() {
        let err = Container::open(b"this is not an archive").unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt(_)));
    }

    #[test]
    fn open_truncated_archive_is_corrupt() {
        let bytes = sample().serialize().unwrap();
        let err = Container::open(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt(_)));
    }

    #[test]
    fn empty_container_roundtrip() {
        let c = Container::new();
        let bytes = c.serialize().unwrap();
        let reopened = Container::open(&bytes).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn binary_assets_roundtrip_unchanged() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let mut c = Container::new();
        c.put_entry("deadbeefdeadbeefdeadbeefdeadbeef.png", payload.clone());
        let bytes = c.serialize().unwrap();
        let reopened = Container::open(&bytes).unwrap();
        assert_eq!(
            reopened.read_entry("deadbeefdeadbeefdeadbeefdeadbeef.png"),
            Some(payload.as_slice())
        );
    }
}
