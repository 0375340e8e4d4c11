//! Extraction of embedded parts from a container.

use crate::package::Package;
use crate::rels::{resolve_all, RelationshipGraph};
use crate::signature::classify;
use crate::slide_names::{best_hint_for_part, collect_hints};
use embed_core::naming::resolve_name;
use embed_core::{
    CollisionResolver, ContainerKind, ContainerPart, DisplayNameHint, Error, ExtractionPlan,
    ExtractionRecord, ExtractionReport, ExtractorConfig, FailureRecord, NameMapping, NameSources,
    PlannedPart, Result, Warning,
};
use embed_ole::read_root_name;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Container-wide metadata gathered before parts are named.
struct Analysis {
    relationships: RelationshipGraph,
    hints: Vec<DisplayNameHint>,
    warnings: Vec<Warning>,
}

/// Extracts embedded parts and names them.
pub struct Extractor {
    config: ExtractorConfig,
    mapping: Option<NameMapping>,
}

impl Extractor {
    /// Create an extractor with the given settings.
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            mapping: None,
        }
    }

    /// Use user-supplied names where the mapping has them.
    pub fn with_mapping(mut self, mapping: NameMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Directory a container's files are written to.
    pub fn target_dir(&self, container: &Path, output_dir: &Path) -> PathBuf {
        if self.config.subdirectory_per_container {
            let stem = container
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "container".to_string());
            output_dir.join(stem)
        } else {
            output_dir.to_path_buf()
        }
    }

    /// Extract every embedded part of `container` into `output_dir`.
    ///
    /// Failing to open the container or to prepare the output directory is
    /// fatal; everything else is recorded per part and the run continues.
    pub fn extract(&self, container: &Path, output_dir: &Path) -> Result<ExtractionReport> {
        let mut package = Package::open(container)?;
        let target_dir = self.target_dir(container, output_dir);
        prepare_output_dir(&target_dir)?;

        let analysis = self.analyze(&mut package);
        let mut report = ExtractionReport::new(container, &target_dir);
        report.warnings = analysis.warnings.clone();

        let mut resolver = CollisionResolver::new(&target_dir);

        for path in self.embedded_parts(&package) {
            let part = match package.read_part(&path) {
                Ok(data) => ContainerPart::new(path.as_str(), data),
                Err(e) => {
                    log::warn!("Failed to read '{}': {}", path, e);
                    report.failures.push(FailureRecord::from_error(path.as_str(), &e));
                    continue;
                }
            };

            let mut planned = self.decide(&part, &analysis, &mut resolver);

            match self.save_part(&part, &mut planned, &mut resolver) {
                Ok(output_path) => report.records.push(ExtractionRecord {
                    source_path: planned.source_path,
                    resolved_name: planned.resolved_name,
                    resolved_extension: planned.resolved_extension,
                    detected_type: planned.detected_type,
                    byte_size: planned.byte_size,
                    name_origin: planned.name_origin,
                    file_name: planned.file_name,
                    output_path,
                }),
                Err(e) => {
                    log::warn!("Failed to save '{}': {}", part.path, e);
                    report.failures.push(FailureRecord::from_error(part.path.as_str(), &e));
                }
            }
        }

        log::info!(
            "{}: {} extracted, {} failed, {} warnings",
            container.display(),
            report.records.len(),
            report.failures.len(),
            report.warnings.len()
        );

        Ok(report)
    }

    /// Decide names for every embedded part without writing anything.
    ///
    /// Collisions are resolved among the planned names only.
    pub fn plan(&self, container: &Path) -> Result<ExtractionPlan> {
        let mut package = Package::open(container)?;
        let analysis = self.analyze(&mut package);

        let mut plan = ExtractionPlan::new(container);
        plan.warnings = analysis.warnings.clone();

        let mut resolver = CollisionResolver::in_memory();
        for path in self.embedded_parts(&package) {
            match package.read_part(&path) {
                Ok(data) => {
                    let part = ContainerPart::new(path.as_str(), data);
                    plan.parts.push(self.decide(&part, &analysis, &mut resolver));
                }
                Err(e) => plan.failures.push(FailureRecord::from_error(path.as_str(), &e)),
            }
        }

        Ok(plan)
    }

    fn analyze<R: Read + Seek>(&self, package: &mut Package<R>) -> Analysis {
        let (relationships, mut warnings) = resolve_all(package);
        let (hints, hint_warnings) = collect_hints(package, &relationships);
        warnings.extend(hint_warnings);

        log::debug!(
            "{} relationships, {} name hints",
            relationships.len(),
            hints.len()
        );

        Analysis {
            relationships,
            hints,
            warnings,
        }
    }

    /// Embedded part paths in archive order.
    fn embedded_parts<R: Read + Seek>(&self, package: &Package<R>) -> Vec<String> {
        package
            .part_names()
            .iter()
            .filter(|name| self.config.is_embedded_path(name))
            .cloned()
            .collect()
    }

    fn decide(
        &self,
        part: &ContainerPart,
        analysis: &Analysis,
        resolver: &mut CollisionResolver,
    ) -> PlannedPart {
        let detected = classify(&part.data, Some(&part.path), &self.config);

        let ole_root = if detected.kind == ContainerKind::OleCompound {
            read_root_name(&part.data)
        } else {
            None
        };
        let hint = best_hint_for_part(
            &analysis.hints,
            &analysis.relationships,
            &part.path,
            self.config.hint_precedence,
        );
        let sources = NameSources {
            mapping: self
                .mapping
                .as_ref()
                .and_then(|mapping| mapping.original_name_for(&part.path)),
            hint: hint.map(|h| h.name.as_str()),
            ole_root: ole_root.as_deref(),
        };

        let resolved = resolve_name(part.bare_name(), &detected, &sources);
        let file_name = resolver.claim(&resolved.base, &resolved.extension);

        log::debug!(
            "{} -> {} ({}, {:?})",
            part.path,
            file_name,
            detected.description,
            resolved.origin
        );

        PlannedPart {
            source_path: part.path.clone(),
            resolved_name: resolved.base,
            resolved_extension: resolved.extension,
            detected_type: detected,
            byte_size: part.size(),
            name_origin: resolved.origin,
            file_name,
        }
    }

    /// Write a part under its planned name, claiming a new name if the
    /// file appeared on disk after it was planned.
    fn save_part(
        &self,
        part: &ContainerPart,
        planned: &mut PlannedPart,
        resolver: &mut CollisionResolver,
    ) -> Result<PathBuf> {
        let (path, mut file) = loop {
            let path = resolver.dir().join(&planned.file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("'{}' appeared on disk, claiming another name", path.display());
                    planned.file_name =
                        resolver.claim(&planned.resolved_name, &planned.resolved_extension);
                }
                Err(e) => {
                    return Err(Error::SaveFailed {
                        path,
                        reason: e.to_string(),
                    })
                }
            }
        };

        let written = file
            .write_all(&part.data)
            .and_then(|()| file.sync_all())
            .map_err(|e| e.to_string())
            .and_then(|()| self.verify_size(&path, part.size()));
        drop(file);

        if let Err(reason) = written {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("Failed to remove partial file '{}': {}", path.display(), e);
            }
            return Err(Error::SaveFailed { path, reason });
        }

        Ok(path)
    }

    fn verify_size(&self, path: &Path, expected: u64) -> std::result::Result<(), String> {
        if !self.config.verify_writes {
            return Ok(());
        }

        let written = fs::metadata(path)
            .map_err(|e| format!("cannot verify written file: {}", e))?
            .len();
        if written != expected {
            return Err(format!("wrote {} bytes, expected {}", written, expected));
        }

        Ok(())
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

fn prepare_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::OutputDirectory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let metadata = fs::metadata(dir).map_err(|e| Error::OutputDirectory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(Error::OutputDirectory {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    if metadata.permissions().readonly() {
        return Err(Error::OutputDirectory {
            path: dir.to_path_buf(),
            reason: "directory is read-only".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed_core::{ErrorKind, NameOrigin};
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_container(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (entry, data) in entries {
            writer.start_file(*entry, options).unwrap();
            writer.write_all(data).unwrap();
        }
        let bytes = writer.finish().unwrap().into_inner();
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_specific_names_kept_and_media_extracted() {
        let dir = TempDir::new().unwrap();
        let container = write_container(
            dir.path(),
            "deck.pptx",
            &[
                ("ppt/presentation.xml", b"<p:presentation/>"),
                ("ppt/media/image1.png", b"\x89PNG\r\n\x1a\n0000"),
                ("ppt/embeddings/Microsoft_Word_Document.docx", b"PK\x03\x04broken"),
            ],
        );
        let out = dir.path().join("out");

        let report = Extractor::default().extract(&container, &out).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].file_name, "image1.png");
        assert_eq!(report.records[1].file_name, "Microsoft_Word_Document.docx");
        assert_eq!(report.records[1].detected_type.extension, "zip");
        assert!(out.join("image1.png").is_file());
    }

    #[test]
    fn test_subdirectory_per_container() {
        let dir = TempDir::new().unwrap();
        let container = write_container(
            dir.path(),
            "lecture.pptx",
            &[("ppt/embeddings/oleObject1.bin", b"%PDF-1.4 body")],
        );
        let out = dir.path().join("out");

        let extractor =
            Extractor::new(ExtractorConfig::new().with_subdirectory_per_container(true));
        let report = extractor.extract(&container, &out).unwrap();

        assert_eq!(report.target_dir, out.join("lecture"));
        assert!(out.join("lecture").join("oleObject1.pdf").is_file());
        assert_eq!(report.records[0].name_origin, NameOrigin::Generic);
    }

    #[test]
    fn test_plan_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let container = write_container(
            dir.path(),
            "deck.pptx",
            &[
                ("ppt/embeddings/oleObject1.bin", b"%PDF-1.4 a"),
                ("ppt/embeddings/oleObject1.pdf", b"%PDF-1.4 b"),
            ],
        );

        let plan = Extractor::default().plan(&container).unwrap();
        assert_eq!(plan.parts.len(), 2);
        assert_eq!(plan.parts[0].file_name, "oleObject1.pdf");
        assert_eq!(plan.parts[1].file_name, "oleObject1_1.pdf");
        assert!(!dir.path().join("oleObject1.pdf").exists());
    }

    #[test]
    fn test_mapping_overrides_generated_names() {
        let dir = TempDir::new().unwrap();
        let container = write_container(
            dir.path(),
            "deck.pptx",
            &[("ppt/embeddings/oleObject1.bin", b"%PDF-1.4 a")],
        );
        let mapping = NameMapping::from_json(
            r#"{"mappings": [{"embedded_path": "ppt/embeddings/oleObject1.bin", "original_name": "Syllabus.pdf"}]}"#,
        )
        .unwrap();

        let plan = Extractor::default().with_mapping(mapping).plan(&container).unwrap();
        assert_eq!(plan.parts[0].file_name, "Syllabus.pdf");
        assert_eq!(plan.parts[0].name_origin, NameOrigin::Mapping);
    }

    #[test]
    fn test_output_directory_blocked_by_file() {
        let dir = TempDir::new().unwrap();
        let container = write_container(
            dir.path(),
            "deck.pptx",
            &[("ppt/embeddings/oleObject1.bin", b"data")],
        );
        let blocker = dir.path().join("out");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = Extractor::default().extract(&container, &blocker).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutputUnavailable);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_file_created_after_planning_is_kept() {
        let dir = TempDir::new().unwrap();
        let part = ContainerPart::new("ppt/embeddings/oleObject1.bin", b"%PDF-1.4 ours".to_vec());
        let mut resolver = CollisionResolver::new(dir.path());
        let mut planned = PlannedPart {
            source_path: part.path.clone(),
            resolved_name: "Report".to_string(),
            resolved_extension: "pdf".to_string(),
            detected_type: embed_core::formats::builtin("pdf"),
            byte_size: part.size(),
            name_origin: NameOrigin::Hint,
            file_name: resolver.claim("Report", "pdf"),
        };
        fs::write(dir.path().join("Report.pdf"), b"theirs").unwrap();

        let path = Extractor::default()
            .save_part(&part, &mut planned, &mut resolver)
            .unwrap();

        assert_eq!(planned.file_name, "Report_1.pdf");
        assert_eq!(path, dir.path().join("Report_1.pdf"));
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.4 ours");
        assert_eq!(fs::read(dir.path().join("Report.pdf")).unwrap(), b"theirs");
    }

    #[test]
    fn test_unwritable_name_is_save_failure() {
        let dir = TempDir::new().unwrap();
        let part = ContainerPart::new("ppt/embeddings/oleObject1.bin", b"%PDF-1.4".to_vec());
        let long_name = "x".repeat(300);
        let mut resolver = CollisionResolver::new(dir.path());
        let mut planned = PlannedPart {
            source_path: part.path.clone(),
            resolved_name: long_name.clone(),
            resolved_extension: "pdf".to_string(),
            detected_type: embed_core::formats::builtin("pdf"),
            byte_size: part.size(),
            name_origin: NameOrigin::Mapping,
            file_name: resolver.claim(&long_name, "pdf"),
        };

        let err = Extractor::default()
            .save_part(&part, &mut planned, &mut resolver)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PartSaveFailed);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_container_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = Extractor::default()
            .extract(&dir.path().join("nope.pptx"), dir.path())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
    }
}
