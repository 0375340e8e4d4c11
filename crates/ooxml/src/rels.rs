//! Relationship sidecar parsing.
//!
//! Every `.rels` sidecar is parsed on its own. Relationship IDs are scoped to
//! the part the sidecar governs, so the graph is keyed by `(owner, id)`.

use crate::package::{local_name, owner_of_sidecar, resolve_target, Package};
use embed_core::{Error, Relationship, Result, Warning};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::io::{Read, Seek};

/// Relationships of a container, keyed by owning part and ID.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    relationships: BTreeMap<(String, String), Relationship>,
}

impl RelationshipGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relationship; an ID already present for the same owner is kept.
    pub fn insert(&mut self, relationship: Relationship) -> bool {
        let key = (relationship.owner.clone(), relationship.id.clone());
        if self.relationships.contains_key(&key) {
            log::debug!(
                "Duplicate relationship '{}' for '{}' ignored",
                relationship.id,
                relationship.owner
            );
            return false;
        }
        self.relationships.insert(key, relationship);
        true
    }

    /// Look up a relationship by owner and ID.
    pub fn get(&self, owner: &str, id: &str) -> Option<&Relationship> {
        self.relationships.get(&(owner.to_string(), id.to_string()))
    }

    /// All relationships owned by `owner`.
    pub fn owned_by<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships
            .values()
            .filter(move |rel| rel.owner == owner)
    }

    /// All internal relationships that target `part_path`.
    pub fn targeting<'a>(&'a self, part_path: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships
            .values()
            .filter(move |rel| rel.target_path.as_deref() == Some(part_path))
    }

    /// Every relationship, ordered by owner then ID.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

/// Parse every sidecar in the container.
///
/// Malformed sidecars are skipped with a warning.
pub fn resolve_all<R: Read + Seek>(package: &mut Package<R>) -> (RelationshipGraph, Vec<Warning>) {
    let mut graph = RelationshipGraph::new();
    let mut warnings = Vec::new();

    let sidecars: Vec<(String, String)> = package
        .part_names()
        .iter()
        .filter_map(|name| owner_of_sidecar(name).map(|owner| (name.clone(), owner)))
        .collect();

    for (sidecar, owner) in sidecars {
        let parsed = package
            .read_part(&sidecar)
            .and_then(|data| parse_sidecar(&data, &owner));

        match parsed {
            Ok(relationships) => {
                log::debug!("{}: {} relationships", sidecar, relationships.len());
                for relationship in relationships {
                    graph.insert(relationship);
                }
            }
            Err(e) => {
                log::warn!("Skipping malformed relationship sidecar '{}': {}", sidecar, e);
                warnings.push(Warning::new(
                    sidecar.as_str(),
                    format!("malformed relationship sidecar skipped: {}", e),
                ));
            }
        }
    }

    (graph, warnings)
}

/// Parse one sidecar's relationships for the part `owner`.
///
/// Entries without an `Id` or a `Target` are dropped. The document must be
/// UTF-8, balanced, and rooted at `Relationships`.
pub fn parse_sidecar(data: &[u8], owner: &str) -> Result<Vec<Relationship>> {
    let xml = std::str::from_utf8(data)
        .map_err(|e| Error::XmlError(format!("sidecar is not valid UTF-8: {}", e)))?;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut relationships = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                check_root(e, &mut saw_root, depth)?;
                depth += 1;
                if let Some(rel) = relationship_from(e, owner) {
                    relationships.push(rel);
                }
            }
            Ok(Event::Empty(ref e)) => {
                check_root(e, &mut saw_root, depth)?;
                if let Some(rel) = relationship_from(e, owner) {
                    relationships.push(rel);
                }
            }
            Ok(Event::End(_)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::XmlError("unexpected closing tag".to_string()))?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(Error::XmlError("no Relationships root element".to_string()));
    }
    if depth != 0 {
        return Err(Error::XmlError("unclosed element at end of document".to_string()));
    }

    Ok(relationships)
}

fn check_root(e: &BytesStart, saw_root: &mut bool, depth: usize) -> Result<()> {
    if depth == 0 {
        if *saw_root {
            return Err(Error::XmlError("more than one root element".to_string()));
        }
        let name = e.name();
        if local_name(name.as_ref()) != b"Relationships" {
            return Err(Error::XmlError(format!(
                "unexpected root element '{}'",
                String::from_utf8_lossy(name.as_ref())
            )));
        }
        *saw_root = true;
    }
    Ok(())
}

fn relationship_from(e: &BytesStart, owner: &str) -> Option<Relationship> {
    let name = e.name();
    if local_name(name.as_ref()) != b"Relationship" {
        return None;
    }

    let mut id = None;
    let mut target = None;
    let mut rel_type = String::new();
    let mut external = false;

    for attr in e.attributes().flatten() {
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        match attr.key.as_ref() {
            b"Id" => id = Some(value),
            b"Target" => target = Some(value),
            b"Type" => rel_type = value,
            b"TargetMode" => external = value.eq_ignore_ascii_case("External"),
            _ => {}
        }
    }

    let (Some(id), Some(target)) = (id, target) else {
        log::debug!("Relationship in '{}' without Id or Target dropped", owner);
        return None;
    };

    let target_path = (!external).then(|| resolve_target(owner, &target));

    Some(Relationship {
        id,
        target,
        target_path,
        rel_type,
        owner: owner.to_string(),
        external,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/oleObject" Target="../embeddings/oleObject1.bin"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/a%20b" TargetMode="External"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"/>
  <Relationship Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image9.png"/>
</Relationships>"#;

    const OWNER: &str = "ppt/slides/slide1.xml";

    #[test]
    fn test_parse_sidecar() {
        let rels = parse_sidecar(SLIDE_RELS.as_bytes(), OWNER).unwrap();
        assert_eq!(rels.len(), 3);

        assert_eq!(rels[1].id, "rId2");
        assert_eq!(
            rels[1].target_path.as_deref(),
            Some("ppt/embeddings/oleObject1.bin")
        );
        assert!(rels[1].rel_type.ends_with("/oleObject"));
        assert_eq!(rels[1].owner, OWNER);

        assert!(rels[2].external);
        assert_eq!(rels[2].target_path, None);
        assert_eq!(rels[2].target, "https://example.com/a%20b");
    }

    #[test]
    fn test_missing_id_or_target_dropped() {
        let rels = parse_sidecar(SLIDE_RELS.as_bytes(), OWNER).unwrap();
        assert!(rels.iter().all(|r| r.id != "rId4"));
        assert!(rels
            .iter()
            .all(|r| r.target_path.as_deref() != Some("ppt/media/image9.png")));
    }

    #[test]
    fn test_malformed_sidecars() {
        assert!(parse_sidecar(b"<Relationships><Relationship Id=\"a\"", OWNER).is_err());
        assert!(parse_sidecar(b"<Relationships><Other></Relationships>", OWNER).is_err());
        assert!(parse_sidecar(b"<Relationships>", OWNER).is_err());
        assert!(parse_sidecar(b"this is not xml at all", OWNER).is_err());
        assert!(parse_sidecar(b"<Types/>", OWNER).is_err());
        assert!(parse_sidecar(&[0x3C, 0xFF, 0xFE, 0x3E], OWNER).is_err());
    }

    #[test]
    fn test_empty_relationships_is_valid() {
        assert!(parse_sidecar(b"<Relationships/>", OWNER).unwrap().is_empty());
    }

    #[test]
    fn test_ids_scoped_per_owner() {
        let mut graph = RelationshipGraph::new();
        for owner in ["ppt/slides/slide1.xml", "ppt/slides/slide2.xml"] {
            let rels = parse_sidecar(SLIDE_RELS.as_bytes(), owner).unwrap();
            for rel in rels {
                graph.insert(rel);
            }
        }

        assert_eq!(graph.len(), 6);
        assert!(graph.get("ppt/slides/slide1.xml", "rId2").is_some());
        assert!(graph.get("ppt/slides/slide2.xml", "rId2").is_some());
        assert!(graph.get("ppt/slides/slide3.xml", "rId2").is_none());
        assert_eq!(graph.owned_by("ppt/slides/slide2.xml").count(), 3);
        assert_eq!(graph.targeting("ppt/embeddings/oleObject1.bin").count(), 2);
    }

    #[test]
    fn test_duplicate_id_keeps_first() {
        let mut graph = RelationshipGraph::new();
        let rels = parse_sidecar(SLIDE_RELS.as_bytes(), OWNER).unwrap();
        assert!(graph.insert(rels[1].clone()));

        let mut other = rels[1].clone();
        other.target = "elsewhere.bin".to_string();
        assert!(!graph.insert(other));
        assert_eq!(graph.get(OWNER, "rId2").unwrap().target, "../embeddings/oleObject1.bin");
    }

    #[test]
    fn test_resolve_all_skips_malformed() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        writer.start_file("ppt/slides/_rels/slide1.xml.rels", options).unwrap();
        writer.write_all(SLIDE_RELS.as_bytes()).unwrap();
        writer.start_file("ppt/slides/_rels/slide2.xml.rels", options).unwrap();
        writer.write_all(b"<Relationships><broken").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut package = Package::from_reader(Cursor::new(bytes)).unwrap();
        let (graph, warnings) = resolve_all(&mut package);

        assert_eq!(graph.len(), 3);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].source, "ppt/slides/_rels/slide2.xml.rels");
    }
}
