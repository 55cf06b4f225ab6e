//! On-disk binary framing for a single cache entry (§4.4).
//!
//! Layout, in order, no framing between sections:
//!
//! ```text
//! u32 magic (0x20150306, little-endian)
//! string key            (u64 length, then UTF-8 bytes)
//! string etag           (empty = absent)
//! u64 server_date
//! u64 last_modified
//! u64 ttl
//! u64 soft_ttl
//! u32 header_count
//! header_count * (string name, string value)
//! <body bytes to EOF>
//! ```
//!
//! A mismatched magic number is a corruption signal, not a parse error to propagate:
//! the caller treats the entry as absent and lets pruning reclaim the file.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use volley_types::{CacheHeader, CACHE_MAGIC};

fn write_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    w.write_u64::<LittleEndian>(s.len() as u64)?;
    w.write_all(s.as_bytes())
}

fn read_string<R: Read>(r: &mut R) -> io::Result<String> {
    let len = r.read_u64::<LittleEndian>()?;
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write a `CacheHeader` followed by `body` to `w`.
pub fn write_entry<W: Write>(w: &mut W, header: &CacheHeader, body: &[u8]) -> io::Result<()> {
    w.write_u32::<LittleEndian>(CACHE_MAGIC)?;
    write_string(w, &header.key)?;
    write_string(w, &header.etag)?;
    w.write_u64::<LittleEndian>(header.server_date)?;
    w.write_u64::<LittleEndian>(header.last_modified)?;
    w.write_u64::<LittleEndian>(header.ttl)?;
    w.write_u64::<LittleEndian>(header.soft_ttl)?;
    w.write_u32::<LittleEndian>(header.response_headers.len() as u32)?;
    for (name, value) in &header.response_headers {
        write_string(w, name)?;
        write_string(w, value)?;
    }
    w.write_all(body)?;
    Ok(())
}

/// Corruption signal: the magic number didn't match. Distinct from a plain I/O error
/// so callers can tell "this file is garbage" from "disk read failed".
#[derive(Debug)]
pub struct BadMagic;

/// Read a `CacheHeader` and its trailing body out of `r`.
///
/// `Err(Ok(BadMagic))` signals a magic mismatch (corruption); `Err(Err(io))` signals a
/// genuine I/O failure. Both are non-fatal to the caller, which removes the entry
/// either way, but the distinction is useful for logging.
pub fn read_entry<R: Read>(r: &mut R) -> Result<(CacheHeader, Vec<u8>), Result<BadMagic, io::Error>> {
    let magic = r.read_u32::<LittleEndian>().map_err(Err)?;
    if magic != CACHE_MAGIC {
        return Err(Ok(BadMagic));
    }
    let key = read_string(r).map_err(Err)?;
    let etag = read_string(r).map_err(Err)?;
    let server_date = r.read_u64::<LittleEndian>().map_err(Err)?;
    let last_modified = r.read_u64::<LittleEndian>().map_err(Err)?;
    let ttl = r.read_u64::<LittleEndian>().map_err(Err)?;
    let soft_ttl = r.read_u64::<LittleEndian>().map_err(Err)?;
    let header_count = r.read_u32::<LittleEndian>().map_err(Err)?;
    let mut response_headers = HashMap::with_capacity(header_count as usize);
    for _ in 0..header_count {
        let name = read_string(r).map_err(Err)?;
        let value = read_string(r).map_err(Err)?;
        response_headers.insert(name, value);
    }
    let mut body = Vec::new();
    r.read_to_end(&mut body).map_err(Err)?;

    Ok((
        CacheHeader {
            key,
            etag,
            server_date,
            last_modified,
            ttl,
            soft_ttl,
            response_headers,
            file_size: 0,
        },
        body,
    ))
}
