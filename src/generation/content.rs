//! Content equality between two paths, following symlinks.
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

const CHUNK: usize = 8 * 1024;

/// Whether `a` and `b` hold the same content.
///
/// Files compare byte for byte. Directories compare structurally: the same
/// entry names, each pair equal. A file never equals a directory. Anything
/// unreadable, including a missing path, counts as different.
#[must_use]
pub fn same_content(a: &Path, b: &Path) -> bool {
    let (Ok(meta_a), Ok(meta_b)) = (fs::metadata(a), fs::metadata(b)) else {
        return false;
    };
    match (meta_a.is_dir(), meta_b.is_dir()) {
        (true, true) => same_dir(a, b),
        (false, false) => meta_a.len() == meta_b.len() && same_bytes(a, b).unwrap_or(false),
        _ => false,
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    let (Some(names_a), Some(names_b)) = (sorted_names(a), sorted_names(b)) else {
        return false;
    };
    names_a == names_b
        && names_a
            .iter()
            .all(|name| same_content(&a.join(name), &b.join(name)))
}

fn sorted_names(dir: &Path) -> Option<Vec<std::ffi::OsString>> {
    let mut names = fs::read_dir(dir)
        .ok()?
        .map(|e| e.map(|e| e.file_name()))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    names.sort();
    Some(names)
}

fn same_bytes(a: &Path, b: &Path) -> std::io::Result<bool> {
    let mut reader_a = BufReader::new(fs::File::open(a)?);
    let mut reader_b = BufReader::new(fs::File::open(b)?);
    let mut buf_a = vec![0u8; CHUNK];
    let mut buf_b = vec![0u8; CHUNK];
    loop {
        let n = read_full(&mut reader_a, &mut buf_a)?;
        let m = read_full(&mut reader_b, &mut buf_b)?;
        if n != m || buf_a.get(..n) != buf_b.get(..m) {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as possible; returns the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while let Some(rest) = buf.get_mut(filled..)
        && !rest.is_empty()
    {
        match reader.read(rest)? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
