//! About.xml descriptor handling
//!
//! The per-mod metadata pipeline: lenient byte decoding, the generic
//! document deserializer, list-wrapper normalization, and the mapper that
//! produces the canonical [`crate::mods::Mod`].

pub mod document;
pub mod mapper;
pub mod normalize;

pub use document::{DocValue, DocumentOptions};
pub use mapper::{map_descriptor, DescriptorContext};

use crate::scan::ScanDiagnostics;
use std::collections::HashMap;

/// Root element of a mod descriptor document.
const META_ROOT_TAG: &str = "ModMetaData";

/// Decode descriptor bytes with automatic encoding detection.
///
/// Descriptors come from many authoring tools; UTF-16 with BOM and
/// BOM-prefixed UTF-8 both occur in the wild. Decoding never fails - at
/// worst it is lossy, and the XML parser decides what to make of it.
pub fn decode_descriptor_bytes(bytes: &[u8]) -> String {
    if bytes.len() >= 2 {
        if bytes[0] == 0xFF && bytes[1] == 0xFE {
            let (decoded, _, had_errors) = encoding_rs::UTF_16LE.decode(bytes);
            if had_errors {
                tracing::warn!("UTF-16LE descriptor decoding had errors");
            }
            return decoded.into_owned();
        } else if bytes[0] == 0xFE && bytes[1] == 0xFF {
            let (decoded, _, had_errors) = encoding_rs::UTF_16BE.decode(bytes);
            if had_errors {
                tracing::warn!("UTF-16BE descriptor decoding had errors");
            }
            return decoded.into_owned();
        }
    }

    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        return String::from_utf8_lossy(&bytes[3..]).into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            tracing::warn!("Descriptor is not valid UTF-8, using lossy conversion");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Run descriptor text through the deserializer and normalizer, returning
/// the fields under the metadata root element.
///
/// Failures are recorded against the given folder in the diagnostics and
/// yield `None` - a malformed descriptor must not abort a directory scan.
pub fn parse_descriptor(
    text: &str,
    folder: &str,
    options: &DocumentOptions,
    diagnostics: &mut ScanDiagnostics,
) -> Option<HashMap<String, DocValue>> {
    let tree = match document::parse_document(text, options) {
        Ok(tree) => tree,
        Err(e) => {
            diagnostics.invalid_xml.push(folder.to_string());
            diagnostics.record_error(folder, e);
            return None;
        }
    };

    let normalized = normalize::collapse_list_wrappers(tree);
    match normalized
        .as_map()
        .and_then(|root| root.get(META_ROOT_TAG))
        .and_then(|meta| meta.as_map())
    {
        Some(meta) => Some(meta.clone()),
        None => {
            diagnostics.invalid_xml.push(folder.to_string());
            diagnostics.record_error(folder, format!("no <{}> root element", META_ROOT_TAG));
            None
        }
    }
}
