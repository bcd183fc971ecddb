//! Writing RWS payloads to disk.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// `utf-8-sig` style marker expected by downstream SAS/Excel tooling.
const UTF8_BOM: &str = "\u{feff}";

/// Writes CSV text verbatim as UTF-8 (no byte-order mark).
pub(crate) fn write_csv(content: &str, target: &Path) -> Result<()> {
    ensure_parent(target)?;
    fs::write(target, content).with_context(|| format!("failed to write {}", target.display()))
}

/// Writes an XML payload as UTF-8 with a byte-order mark.
///
/// RWS responses occasionally arrive with stray bytes ahead of the document
/// (a BOM from the server, or gateway noise), so everything before the first
/// `<` is discarded. If nothing remains, no file is written and an empty
/// string is returned.
pub(crate) fn write_xml(content: &str, target: &Path) -> Result<String> {
    let document = match content.find('<') {
        Some(idx) => &content[idx..],
        None => "",
    };
    if document.trim().is_empty() {
        return Ok(String::new());
    }

    ensure_parent(target)?;
    let mut payload = String::with_capacity(UTF8_BOM.len() + document.len());
    payload.push_str(UTF8_BOM);
    payload.push_str(document);
    fs::write(target, payload).with_context(|| format!("failed to write {}", target.display()))?;
    Ok(document.to_string())
}

fn ensure_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_write_strips_leading_prefix_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.xml");

        let written = write_xml("\u{feff}junk<ODM/>", &target).unwrap();
        assert_eq!(written, "<ODM/>");

        let on_disk = fs::read_to_string(&target).unwrap();
        assert_eq!(on_disk, "\u{feff}<ODM/>");
    }

    #[test]
    fn empty_xml_payload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.xml");

        assert_eq!(write_xml("", &target).unwrap(), "");
        assert_eq!(write_xml("   \n\t", &target).unwrap(), "");
        assert!(!target.exists());
    }

    #[test]
    fn payload_without_any_tag_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.xml");

        assert_eq!(write_xml("no xml here", &target).unwrap(), "");
        assert!(!target.exists());
    }

    #[test]
    fn csv_write_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("AE.csv");

        write_csv("SUBJECT,AETERM\n001,Headache\n", &target).unwrap();
        let on_disk = fs::read_to_string(&target).unwrap();
        assert_eq!(on_disk, "SUBJECT,AETERM\n001,Headache\n");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("deep").join("AE.csv");

        write_csv("a,b\n", &target).unwrap();
        assert!(target.exists());
    }
}
