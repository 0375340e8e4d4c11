//! Advisory compound-file header reader.
//!
//! Decodes just enough of the header and the first directory sector to
//! recover the root entry. Every structural problem yields `None`; this
//! reader never fails the surrounding extraction.

use embed_core::OleDirectoryEntry;

/// Compound file signature (`D0 CF 11 E0 A1 B1 1A E1`).
pub const COMPOUND_FILE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Size of the fixed header.
const HEADER_SIZE: usize = 512;

/// Size of one directory entry.
const DIR_ENTRY_SIZE: usize = 128;

/// Header field offsets.
mod header {
    pub const SECTOR_SHIFT: usize = 0x1E;
    pub const FIRST_DIR_SECTOR: usize = 0x30;
}

/// Directory entry field offsets.
mod entry {
    pub const NAME: usize = 0x00;
    pub const NAME_FIELD_LEN: usize = 64;
    pub const NAME_LENGTH: usize = 0x40;
    pub const OBJECT_TYPE: usize = 0x42;
    pub const START_SECTOR: usize = 0x74;
}

/// Names that identify the storage itself rather than the embedded document.
const RESERVED_NAMES: &[&str] = &["Root Entry", "\u{1}Ole"];

/// Whether the bytes start with the compound file signature.
pub fn is_compound_file(data: &[u8]) -> bool {
    data.starts_with(&COMPOUND_FILE_SIGNATURE)
}

/// Sector size declared by the header; 512 unless the shift is 12.
fn sector_size(data: &[u8]) -> usize {
    match read_u16_le(data, header::SECTOR_SHIFT) {
        Some(12) => 4096,
        _ => HEADER_SIZE,
    }
}

/// Read the first entry of the directory stream.
pub fn read_root_entry(data: &[u8]) -> Option<OleDirectoryEntry> {
    if data.len() < HEADER_SIZE || !is_compound_file(data) {
        return None;
    }

    let sector_size = sector_size(data);
    let first_dir_sector = read_u32_le(data, header::FIRST_DIR_SECTOR)? as usize;

    // Sector N follows the header sector.
    let offset = first_dir_sector
        .checked_add(1)?
        .checked_mul(sector_size)?;
    if offset.checked_add(DIR_ENTRY_SIZE)? > data.len() {
        log::debug!(
            "Directory sector {} lies outside a {} byte compound file",
            first_dir_sector,
            data.len()
        );
        return None;
    }

    let raw = &data[offset..offset + DIR_ENTRY_SIZE];
    let name_length = read_u16_le(raw, entry::NAME_LENGTH)?;
    let name_bytes = name_length as usize;
    if name_bytes < 2 || name_bytes > entry::NAME_FIELD_LEN || name_bytes % 2 != 0 {
        log::debug!("Implausible directory name length {}", name_length);
        return None;
    }

    // The declared length includes the UTF-16 terminator.
    let units: Vec<u16> = raw[entry::NAME..entry::NAME + name_bytes - 2]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let name = char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect::<String>()
        .trim_end_matches('\0')
        .to_string();

    Some(OleDirectoryEntry {
        name,
        name_length,
        entry_kind: raw[entry::OBJECT_TYPE],
        start_sector: read_u32_le(raw, entry::START_SECTOR)?,
    })
}

/// Recover the root entry name of an embedded compound file.
///
/// Reserved storage names, names shorter than two characters, and any
/// structural inconsistency yield `None`.
pub fn read_root_name(data: &[u8]) -> Option<String> {
    let entry = read_root_entry(data)?;

    if RESERVED_NAMES.contains(&entry.name.as_str()) {
        return None;
    }

    let name = entry
        .name
        .trim_matches(|c: char| c.is_whitespace() || c.is_control())
        .to_string();

    if name.chars().count() < 2 || name.contains(char::REPLACEMENT_CHARACTER) {
        return None;
    }

    Some(name)
}

fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal compound file: header sector plus one directory sector.
    fn compound_file(name: &str, dir_sector: u32) -> Vec<u8> {
        let mut data = vec![0u8; 1024];
        data[..8].copy_from_slice(&COMPOUND_FILE_SIGNATURE);
        data[0x1E..0x20].copy_from_slice(&9u16.to_le_bytes());
        data[0x30..0x34].copy_from_slice(&dir_sector.to_le_bytes());

        let units: Vec<u16> = name.encode_utf16().collect();
        let entry = 512;
        for (i, unit) in units.iter().enumerate() {
            data[entry + i * 2..entry + i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let name_length = ((units.len() + 1) * 2) as u16;
        data[entry + 0x40..entry + 0x42].copy_from_slice(&name_length.to_le_bytes());
        data[entry + 0x42] = 5;
        data[entry + 0x74..entry + 0x78].copy_from_slice(&3u32.to_le_bytes());
        data
    }

    #[test]
    fn test_read_u16_le() {
        let data = [0x01, 0x02, 0x03];
        assert_eq!(read_u16_le(&data, 0), Some(0x0201));
        assert_eq!(read_u16_le(&data, 2), None);
    }

    #[test]
    fn test_root_name_recovered() {
        let data = compound_file("Budget", 0);
        assert_eq!(read_root_name(&data), Some("Budget".to_string()));
    }

    #[test]
    fn test_root_entry_fields() {
        let entry = read_root_entry(&compound_file("Budget", 0)).unwrap();
        assert_eq!(entry.name, "Budget");
        assert_eq!(entry.name_length, 14);
        assert_eq!(entry.entry_kind, 5);
        assert_eq!(entry.start_sector, 3);
    }

    #[test]
    fn test_reserved_names_are_absent() {
        assert_eq!(read_root_name(&compound_file("Root Entry", 0)), None);
        assert_eq!(read_root_name(&compound_file("\u{1}Ole", 0)), None);
        assert_eq!(read_root_name(&compound_file("X", 0)), None);
    }

    #[test]
    fn test_directory_sector_out_of_bounds() {
        assert_eq!(read_root_name(&compound_file("Budget", 1)), None);
        assert_eq!(read_root_name(&compound_file("Budget", u32::MAX)), None);
    }

    #[test]
    fn test_implausible_name_length() {
        let mut data = compound_file("Budget", 0);
        data[512 + 0x40..512 + 0x42].copy_from_slice(&200u16.to_le_bytes());
        assert_eq!(read_root_entry(&data), None);

        data[512 + 0x40..512 + 0x42].copy_from_slice(&0u16.to_le_bytes());
        assert_eq!(read_root_entry(&data), None);
    }

    #[test]
    fn test_not_a_compound_file() {
        assert_eq!(read_root_name(b"PK\x03\x04 definitely a zip"), None);
        assert_eq!(read_root_name(&[]), None);
        assert!(!is_compound_file(&[0xD0, 0xCF]));
    }

    #[test]
    fn test_large_sector_shift() {
        let mut data = vec![0u8; 8192];
        data[..8].copy_from_slice(&COMPOUND_FILE_SIGNATURE);
        data[0x1E..0x20].copy_from_slice(&12u16.to_le_bytes());
        let units: Vec<u16> = "Plan".encode_utf16().collect();
        for (i, unit) in units.iter().enumerate() {
            data[4096 + i * 2..4096 + i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        data[4096 + 0x40..4096 + 0x42].copy_from_slice(&10u16.to_le_bytes());
        assert_eq!(read_root_name(&data), Some("Plan".to_string()));
    }
}
