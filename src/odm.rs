//! Minimal ODM metadata walking.
//!
//! The clinical-view metadata endpoint returns a CDISC ODM document shaped
//! `ODM > Study > MetaDataVersion > FormDef...`. The only thing callers need
//! from it is the ordered list of form OIDs, so this walks the element stream
//! instead of deserializing the whole schema.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Collects the `OID` attribute of every `FormDef` that is an immediate child
/// of a `MetaDataVersion` element, in document order.
///
/// Matching is on local names, so any namespace prefix (or none) is accepted.
/// Duplicates are kept; a `FormDef` without an `OID` is skipped.
pub(crate) fn extract_form_oids(odm: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(odm);
    let mut forms = Vec::new();

    // Depth of the MetaDataVersion element currently open, if any. ODM puts
    // it at ODM > Study > MetaDataVersion, i.e. depth 3.
    let mut depth = 0usize;
    let mut mdv_depth: Option<usize> = None;

    loop {
        match reader
            .read_event()
            .context("failed to parse ODM metadata document")?
        {
            Event::Start(e) => {
                depth += 1;
                if depth == 3 && e.local_name().as_ref() == b"MetaDataVersion" {
                    mdv_depth = Some(depth);
                } else if mdv_depth == Some(depth - 1) && e.local_name().as_ref() == b"FormDef" {
                    if let Some(oid) = attribute_value(&e, "OID")? {
                        forms.push(oid);
                    }
                }
            }
            Event::Empty(e) => {
                if mdv_depth == Some(depth) && e.local_name().as_ref() == b"FormDef" {
                    if let Some(oid) = attribute_value(&e, "OID")? {
                        forms.push(oid);
                    }
                }
            }
            Event::End(_) => {
                if mdv_depth == Some(depth) {
                    mdv_depth = None;
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(forms)
}

fn attribute_value(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}
