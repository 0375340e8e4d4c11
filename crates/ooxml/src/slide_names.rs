//! Display-name hints from slide markup.
//!
//! Embedded objects are stored under generic part names, but the slide that
//! shows them usually carries the name the author saw. Two heuristics
//! recover it:
//!
//! 1. The name of the visual frame that encloses the object placeholder.
//! 2. The nearest frame on the same slide whose name looks like a filename.
//!
//! Placeholders with no usable name produce no hint.

use crate::markup::MarkupTree;
use crate::package::{extract_slide_number, is_slide_path, Package};
use crate::rels::RelationshipGraph;
use embed_core::naming::{is_generic_display_name, looks_like_filename, normalize_display_name};
use embed_core::{DisplayNameHint, HintConfidence, HintPrecedence, Result, Warning};
use std::io::{Read, Seek};

/// Elements that reference an embedded object through a relationship ID.
const PLACEHOLDER_ELEMENTS: &[&str] = &["oleObj"];

/// Elements that form a named visual frame.
const FRAME_ELEMENTS: &[&str] = &["graphicFrame", "pic", "sp"];

/// Name of a frame, taken from its non-visual properties.
fn frame_name(tree: &MarkupTree, frame: usize) -> Option<String> {
    tree.node(frame)
        .children
        .iter()
        .copied()
        .filter(|&child| {
            let name = &tree.node(child).name;
            name.starts_with("nv") && name.ends_with("Pr")
        })
        .find_map(|nv| tree.child(nv, "cNvPr"))
        .and_then(|cnv| tree.node(cnv).attr("name"))
        .map(normalize_display_name)
        .filter(|name| !is_generic_display_name(name))
}

/// Relationship ID a placeholder references.
fn placeholder_rel_id(tree: &MarkupTree, index: usize) -> Option<&str> {
    let node = tree.node(index);
    node.prefixed_attr("id")
        .or_else(|| node.plain_attr("id"))
        .filter(|id| !id.trim().is_empty())
}

/// Collect hints from one slide's markup.
pub fn hints_from_markup(slide_path: &str, xml: &str) -> Result<Vec<DisplayNameHint>> {
    let tree = MarkupTree::parse(xml)?;

    // (position of the frame's node, name) for every filename-like frame
    let filename_frames: Vec<(usize, String)> = FRAME_ELEMENTS
        .iter()
        .flat_map(|element| tree.find_all(element))
        .filter_map(|frame| frame_name(&tree, frame).map(|name| (frame, name)))
        .filter(|(_, name)| looks_like_filename(name))
        .collect();

    let placeholders: Vec<usize> = PLACEHOLDER_ELEMENTS
        .iter()
        .flat_map(|element| tree.find_all(element))
        .collect();

    // (placeholder, frame enclosing it)
    let enclosing: Vec<(usize, usize)> = placeholders
        .iter()
        .filter_map(|&p| tree.nearest_ancestor(p, FRAME_ELEMENTS).map(|frame| (p, frame)))
        .collect();

    let mut hints = Vec::new();

    for &placeholder in &placeholders {
        let Some(rel_id) = placeholder_rel_id(&tree, placeholder) else {
            log::debug!("{}: object placeholder without relationship ID", slide_path);
            continue;
        };

        if let Some(name) = tree
            .nearest_ancestor(placeholder, FRAME_ELEMENTS)
            .and_then(|frame| frame_name(&tree, frame))
        {
            hints.push(DisplayNameHint {
                rel_id: rel_id.to_string(),
                slide_path: slide_path.to_string(),
                name,
                confidence: HintConfidence::EnclosingFrame,
            });
        }

        // A frame around another object names that object only.
        // Ties in distance go to the earlier frame.
        if let Some((_, name)) = filename_frames
            .iter()
            .filter(|(frame, _)| {
                !enclosing
                    .iter()
                    .any(|&(other, owner)| other != placeholder && owner == *frame)
            })
            .min_by_key(|(frame, _)| (frame.abs_diff(placeholder), *frame))
        {
            hints.push(DisplayNameHint {
                rel_id: rel_id.to_string(),
                slide_path: slide_path.to_string(),
                name: name.clone(),
                confidence: HintConfidence::FilenameLike,
            });
        }
    }

    Ok(hints)
}

/// Collect hints from every slide, in slide-number order.
///
/// Hints whose relationship ID is unknown to the slide are dropped. A slide
/// that cannot be read or parsed yields a warning and no hints.
pub fn collect_hints<R: Read + Seek>(
    package: &mut Package<R>,
    relationships: &RelationshipGraph,
) -> (Vec<DisplayNameHint>, Vec<Warning>) {
    let mut slides: Vec<String> = package
        .part_names()
        .iter()
        .filter(|name| is_slide_path(name))
        .cloned()
        .collect();
    slides.sort_by_key(|path| (extract_slide_number(path).unwrap_or(usize::MAX), path.clone()));

    let mut hints = Vec::new();
    let mut warnings = Vec::new();

    for slide in slides {
        let parsed = package
            .read_text(&slide)
            .and_then(|xml| hints_from_markup(&slide, &xml));

        match parsed {
            Ok(found) => {
                for hint in found {
                    if relationships.get(&hint.slide_path, &hint.rel_id).is_some() {
                        log::debug!(
                            "{}: hint '{}' for {} ({:?})",
                            slide,
                            hint.name,
                            hint.rel_id,
                            hint.confidence
                        );
                        hints.push(hint);
                    } else {
                        log::debug!("{}: no relationship '{}', hint dropped", slide, hint.rel_id);
                    }
                }
            }
            Err(e) => {
                log::warn!("Skipping slide '{}' for name hints: {}", slide, e);
                warnings.push(Warning::new(
                    slide.as_str(),
                    format!("slide markup unreadable, no name hints: {}", e),
                ));
            }
        }
    }

    (hints, warnings)
}

/// Best hint for a part: highest rank under `precedence`, first in slide order on ties.
pub fn best_hint_for_part<'a>(
    hints: &'a [DisplayNameHint],
    relationships: &RelationshipGraph,
    part_path: &str,
    precedence: HintPrecedence,
) -> Option<&'a DisplayNameHint> {
    let mut best: Option<&DisplayNameHint> = None;

    for hint in hints {
        let targets_part = relationships
            .get(&hint.slide_path, &hint.rel_id)
            .is_some_and(|rel| rel.target_path.as_deref() == Some(part_path));
        if !targets_part {
            continue;
        }

        let better = match best {
            None => true,
            Some(current) => precedence.rank(hint.confidence) > precedence.rank(current.confidence),
        };
        if better {
            best = Some(hint);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rels::parse_sidecar;

    const SLIDE: &str = r#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p" xmlns:r="urn:r">
<p:cSld><p:spTree>
  <p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/></p:nvSpPr></p:sp>
  <p:graphicFrame>
    <p:nvGraphicFramePr><p:cNvPr id="3" name="Quarterly Budget"/></p:nvGraphicFramePr>
    <a:graphic><a:graphicData><p:oleObj r:id="rId2" progId="Excel.Sheet.8"/></a:graphicData></a:graphic>
  </p:graphicFrame>
  <p:graphicFrame>
    <p:nvGraphicFramePr><p:cNvPr id="4" name="Object 3"/></p:nvGraphicFramePr>
    <a:graphic><a:graphicData><p:oleObj r:id="rId3" progId="Word.Document.8"/></a:graphicData></a:graphic>
  </p:graphicFrame>
  <p:sp><p:nvSpPr><p:cNvPr id="5" name="minutes.doc"/></p:nvSpPr></p:sp>
</p:spTree></p:cSld></p:sld>"#;

    const SLIDE_PATH: &str = "ppt/slides/slide1.xml";

    fn graph() -> RelationshipGraph {
        let rels = r#"<Relationships>
  <Relationship Id="rId2" Target="../embeddings/oleObject1.bin"/>
  <Relationship Id="rId3" Target="../embeddings/oleObject2.bin"/>
</Relationships>"#;
        let mut graph = RelationshipGraph::new();
        for rel in parse_sidecar(rels.as_bytes(), SLIDE_PATH).unwrap() {
            graph.insert(rel);
        }
        graph
    }

    #[test]
    fn test_enclosing_frame_hint() {
        let hints = hints_from_markup(SLIDE_PATH, SLIDE).unwrap();
        let first: Vec<_> = hints.iter().filter(|h| h.rel_id == "rId2").collect();
        assert_eq!(first[0].name, "Quarterly Budget");
        assert_eq!(first[0].confidence, HintConfidence::EnclosingFrame);
    }

    #[test]
    fn test_generic_frame_name_discarded() {
        let hints = hints_from_markup(SLIDE_PATH, SLIDE).unwrap();
        let second: Vec<_> = hints.iter().filter(|h| h.rel_id == "rId3").collect();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "minutes.doc");
        assert_eq!(second[0].confidence, HintConfidence::FilenameLike);
    }

    #[test]
    fn test_best_hint_respects_precedence() {
        let hints = hints_from_markup(SLIDE_PATH, SLIDE).unwrap();
        let graph = graph();

        let best = best_hint_for_part(
            &hints,
            &graph,
            "ppt/embeddings/oleObject1.bin",
            HintPrecedence::EnclosingFrameFirst,
        )
        .unwrap();
        assert_eq!(best.name, "Quarterly Budget");

        let flipped = best_hint_for_part(
            &hints,
            &graph,
            "ppt/embeddings/oleObject1.bin",
            HintPrecedence::FilenameLikeFirst,
        )
        .unwrap();
        assert_eq!(flipped.name, "minutes.doc");

        assert!(best_hint_for_part(
            &hints,
            &graph,
            "ppt/embeddings/oleObject9.bin",
            HintPrecedence::default()
        )
        .is_none());
    }

    #[test]
    fn test_ties_keep_first() {
        let hint = |name: &str| DisplayNameHint {
            rel_id: "rId2".to_string(),
            slide_path: SLIDE_PATH.to_string(),
            name: name.to_string(),
            confidence: HintConfidence::EnclosingFrame,
        };
        let hints = vec![hint("First"), hint("Second")];
        let best = best_hint_for_part(
            &hints,
            &graph(),
            "ppt/embeddings/oleObject1.bin",
            HintPrecedence::default(),
        )
        .unwrap();
        assert_eq!(best.name, "First");
    }

    #[test]
    fn test_named_frame_does_not_leak_to_neighbour() {
        let xml = r#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p" xmlns:r="urn:r"><p:cSld><p:spTree>
  <p:graphicFrame>
    <p:nvGraphicFramePr><p:cNvPr id="2" name="report.pdf"/></p:nvGraphicFramePr>
    <a:graphic><a:graphicData><p:oleObj r:id="rId2"/></a:graphicData></a:graphic>
  </p:graphicFrame>
  <p:graphicFrame>
    <p:nvGraphicFramePr><p:cNvPr id="3" name="Object 2"/></p:nvGraphicFramePr>
    <a:graphic><a:graphicData><p:oleObj r:id="rId3"/></a:graphicData></a:graphic>
  </p:graphicFrame>
</p:spTree></p:cSld></p:sld>"#;
        let hints = hints_from_markup(SLIDE_PATH, xml).unwrap();

        assert!(hints.iter().all(|h| h.rel_id == "rId2"));
        assert!(hints.iter().all(|h| h.name == "report.pdf"));
        assert!(!hints.is_empty());
    }

    #[test]
    fn test_placeholder_without_frame_or_names() {
        let xml = r#"<sld><oleObj id="rId1"/></sld>"#;
        assert!(hints_from_markup(SLIDE_PATH, xml).unwrap().is_empty());
    }

    #[test]
    fn test_names_are_normalized() {
        let xml = "<sld><graphicFrame><nvGraphicFramePr><cNvPr name=\"  Cafe\u{301}   Menu \"/></nvGraphicFramePr><oleObj r:id=\"rId1\"/></graphicFrame></sld>";
        let hints = hints_from_markup(SLIDE_PATH, xml).unwrap();
        assert_eq!(hints[0].name, "Caf\u{e9} Menu");
    }

    #[test]
    fn test_unparsable_slide_is_error() {
        assert!(hints_from_markup(SLIDE_PATH, "<sld><graphicFrame></sld>").is_err());
    }
}
