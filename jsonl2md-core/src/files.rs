use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::batch::BatchItem;
use crate::error::{Jsonl2mdError, Result};
use crate::export::is_accepted_transcript_name;

pub fn read_transcript(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Jsonl2mdError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Expands inputs into transcript files.
///
/// Files must carry an accepted extension. Directories are walked
/// recursively and contribute their accepted files in path order.
pub fn collect_transcripts(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found = WalkDir::new(input)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .filter(|path| file_name(path).is_some_and(is_accepted_transcript_name))
                .collect::<Vec<_>>();
            found.sort();
            paths.extend(found);
            continue;
        }

        if !file_name(input).is_some_and(is_accepted_transcript_name) {
            return Err(Jsonl2mdError::UnsupportedFileType {
                path: input.clone(),
            });
        }
        paths.push(input.clone());
    }

    Ok(paths)
}

/// Reads each transcript into a batch item named after its file name.
///
/// A file name shared by several paths names each of those items by its full
/// path instead. Unreadable files become rejected items so the rest of the
/// batch still converts.
pub fn load_batch(paths: &[PathBuf]) -> Vec<BatchItem> {
    paths
        .iter()
        .map(|path| {
            let name = item_name(path, paths);
            match read_transcript(path) {
                Ok(content) => BatchItem::new(name, content),
                Err(err) => BatchItem::rejected(name, err.to_string()),
            }
        })
        .collect()
}

fn item_name(path: &Path, paths: &[PathBuf]) -> String {
    let name = file_name(path).unwrap_or_default();
    let shared = paths
        .iter()
        .filter(|other| file_name(other) == Some(name))
        .nth(1)
        .is_some();

    if shared {
        path.display().to_string()
    } else {
        name.to_string()
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn directories_are_walked_in_path_order() {
        let temp = tempdir().expect("tempdir");
        let nested = temp.path().join("nested");
        fs::create_dir_all(&nested).expect("mkdir");
        fs::write(temp.path().join("b.jsonl"), "{}").expect("write");
        fs::write(temp.path().join("a.json"), "{}").expect("write");
        fs::write(temp.path().join("notes.txt"), "skip").expect("write");
        fs::write(nested.join("c.jsonl"), "{}").expect("write");

        let paths = collect_transcripts(&[temp.path().to_path_buf()]).expect("collect");
        assert_eq!(
            paths,
            vec![
                temp.path().join("a.json"),
                temp.path().join("b.jsonl"),
                nested.join("c.jsonl"),
            ]
        );
    }

    #[test]
    fn explicit_file_with_wrong_extension_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("notes.md");
        fs::write(&path, "x").expect("write");

        let err = collect_transcripts(&[path]).expect_err("must fail");
        assert!(matches!(err, Jsonl2mdError::UnsupportedFileType { .. }));
    }

    #[test]
    fn missing_file_becomes_rejected_item() {
        let temp = tempdir().expect("tempdir");
        let good = temp.path().join("good.jsonl");
        let gone = temp.path().join("gone.jsonl");
        fs::write(&good, "{}").expect("write");

        let items = load_batch(&[gone, good]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "gone.jsonl");
        assert!(
            items[0]
                .content
                .as_ref()
                .is_err_and(|error| error.contains("gone.jsonl"))
        );
        assert_eq!(items[1].content, Ok(b"{}".to_vec()));
    }

    #[test]
    fn batch_items_use_file_names() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("chat.jsonl");
        fs::write(&path, "{\"type\":\"summary\",\"summary\":\"x\"}\n").expect("write");

        let items = load_batch(&[path]);
        assert_eq!(items[0].name, "chat.jsonl");
        assert!(
            items[0]
                .content
                .as_ref()
                .is_ok_and(|content| content.starts_with(b"{\"type\""))
        );
    }

    #[test]
    fn shared_file_names_fall_back_to_paths() {
        let temp = tempdir().expect("tempdir");
        let first = temp.path().join("a/s.jsonl");
        let second = temp.path().join("b/s.jsonl");
        let other = temp.path().join("b/t.jsonl");
        for path in [&first, &second, &other] {
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(path, "{}").expect("write");
        }

        let items = load_batch(&[first.clone(), second.clone(), other]);
        let names = items
            .iter()
            .map(|item| item.name.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                first.display().to_string(),
                second.display().to_string(),
                "t.jsonl".to_string(),
            ]
        );
    }
}
