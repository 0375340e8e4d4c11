//! Container access and part path helpers.

use embed_core::{Error, Result};
use embed_ole::is_compound_file;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use zip::ZipArchive;

/// An opened OOXML container.
pub struct Package<R: Read + Seek> {
    archive: ZipArchive<R>,
    part_names: Vec<String>,
}

impl Package<File> {
    /// Open a container from disk.
    ///
    /// Missing files, legacy binary presentations, and anything that is not a
    /// ZIP archive are rejected before any part is read.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }

        let mut file = File::open(path)?;
        let mut head = [0u8; 8];
        let read = file.read(&mut head)?;
        if is_compound_file(&head[..read]) {
            return Err(Error::UnsupportedFormat(format!(
                "'{}' is a legacy binary (OLE) document; save it as .pptx and try again",
                path.display()
            )));
        }
        file.seek(SeekFrom::Start(0))?;

        Self::from_reader(file)
    }
}

impl<R: Read + Seek> Package<R> {
    /// Open a container from any seekable reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::UnsupportedFormat(format!("not a ZIP container: {}", e)))?;

        let mut part_names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            match archive.by_index_raw(i) {
                Ok(file) => part_names.push(file.name().to_string()),
                Err(e) => log::warn!("Skipping unreadable archive entry {}: {}", i, e),
            }
        }

        Ok(Self {
            archive,
            part_names,
        })
    }

    /// Part paths in archive order.
    pub fn part_names(&self) -> &[String] {
        &self.part_names
    }

    /// Whether the container holds a part at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.part_names.iter().any(|name| name == path)
    }

    /// Read a part's bytes.
    pub fn read_part(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(path).map_err(|e| Error::PartCorrupted {
            part: path.to_string(),
            reason: e.to_string(),
        })?;

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data).map_err(|e| Error::PartCorrupted {
            part: path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(data)
    }

    /// Read a part as UTF-8 text.
    pub fn read_text(&mut self, path: &str) -> Result<String> {
        let data = self.read_part(path)?;
        String::from_utf8(data)
            .map_err(|e| Error::XmlError(format!("'{}' is not valid UTF-8: {}", path, e)))
    }
}

/// Extract the local name from a potentially namespaced XML name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Directory portion of a part path, without a trailing slash.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// The part a relationship sidecar governs.
///
/// `dir/_rels/name.rels` governs `dir/name`; `_rels/.rels` governs the
/// package root, returned as the empty string.
pub fn owner_of_sidecar(sidecar: &str) -> Option<String> {
    let file = sidecar.strip_suffix(".rels")?;
    let (dir, name) = match file.rsplit_once("/_rels/") {
        Some((dir, name)) => (dir, name),
        None => ("", file.strip_prefix("_rels/")?),
    };

    if name.contains('/') {
        return None;
    }

    Some(if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    })
}

/// Resolve a relationship target to an absolute part path.
///
/// Relative targets resolve against the owner's directory; a leading `/`
/// means the package root. Percent-escapes are decoded and `.`/`..`
/// segments collapsed.
pub fn resolve_target(owner: &str, target: &str) -> String {
    let decoded = urlencoding::decode(target)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| target.to_string());

    let joined = match decoded.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let base = parent_dir(owner);
            if base.is_empty() {
                decoded
            } else {
                format!("{}/{}", base, decoded)
            }
        }
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract a number from a string like "slide3.xml" or "rId12".
pub fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".rels").trim_end_matches(".xml");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

/// Whether a part path is a slide (`ppt/slides/slideN.xml`).
pub fn is_slide_path(path: &str) -> bool {
    path.strip_prefix("ppt/slides/")
        .is_some_and(|name| !name.contains('/') && name.starts_with("slide") && name.ends_with(".xml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:oleObj"), b"oleObj");
        assert_eq!(local_name(b"a:cNvPr"), b"cNvPr");
        assert_eq!(local_name(b"Relationship"), b"Relationship");
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("ppt/slides/slide12.xml"), Some(12));
        assert_eq!(extract_slide_number("rId7"), Some(7));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_is_slide_path() {
        assert!(is_slide_path("ppt/slides/slide3.xml"));
        assert!(!is_slide_path("ppt/slides/_rels/slide3.xml.rels"));
        assert!(!is_slide_path("ppt/slideLayouts/slideLayout1.xml"));
    }

    #[test]
    fn test_owner_of_sidecar() {
        assert_eq!(
            owner_of_sidecar("ppt/slides/_rels/slide1.xml.rels"),
            Some("ppt/slides/slide1.xml".to_string())
        );
        assert_eq!(
            owner_of_sidecar("ppt/_rels/presentation.xml.rels"),
            Some("ppt/presentation.xml".to_string())
        );
        assert_eq!(owner_of_sidecar("_rels/.rels"), Some(String::new()));
        assert_eq!(owner_of_sidecar("ppt/slides/slide1.xml"), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../embeddings/oleObject1.bin"),
            "ppt/embeddings/oleObject1.bin"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "/ppt/media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(resolve_target("", "ppt/presentation.xml"), "ppt/presentation.xml");
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../embeddings/Budget%20Plan.xlsx"),
            "ppt/embeddings/Budget Plan.xlsx"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "./../../../escape.bin"),
            "escape.bin"
        );
    }

    #[test]
    fn test_package_reads_parts() {
        let bytes = zip_bytes(&[
            ("ppt/presentation.xml", b"<p:presentation/>"),
            ("ppt/embeddings/oleObject1.bin", b"\x01\x02\x03"),
        ]);
        let mut package = Package::from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(package.part_names().len(), 2);
        assert!(package.contains("ppt/embeddings/oleObject1.bin"));
        assert_eq!(
            package.read_part("ppt/embeddings/oleObject1.bin").unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(
            package.read_text("ppt/presentation.xml").unwrap(),
            "<p:presentation/>"
        );
    }

    #[test]
    fn test_missing_part_is_corrupted() {
        let bytes = zip_bytes(&[("a.txt", b"a")]);
        let mut package = Package::from_reader(Cursor::new(bytes)).unwrap();
        let err = package.read_part("missing.bin").unwrap_err();
        assert!(matches!(err, Error::PartCorrupted { .. }));
    }

    #[test]
    fn test_non_zip_is_unsupported() {
        let err = Package::from_reader(Cursor::new(b"plain text".to_vec())).err().unwrap();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_open_missing_and_legacy() {
        let dir = tempfile::TempDir::new().unwrap();

        let missing = dir.path().join("missing.pptx");
        assert!(matches!(
            Package::open(&missing).err().unwrap(),
            Error::InputNotFound(_)
        ));

        let legacy = dir.path().join("old.ppt");
        let mut data = embed_ole::COMPOUND_FILE_SIGNATURE.to_vec();
        data.resize(1024, 0);
        std::fs::write(&legacy, data).unwrap();
        assert!(matches!(
            Package::open(&legacy).err().unwrap(),
            Error::UnsupportedFormat(_)
        ));
    }
}
