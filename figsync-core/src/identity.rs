//! Content identity of local artifacts.
//!
//! The remote reports an MD5 digest (`computed_md5`) for every stored file,
//! so local identity uses the same algorithm to allow a direct equality test.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{io_err, MetadataError};
use crate::types::ContentIdentity;

const CHUNK_SIZE: usize = 64 * 1024;

/// Hash and measure the file at `path`.
///
/// Reads the whole file in fixed-size chunks; never mutates it.
pub fn identity(path: &Path) -> Result<ContentIdentity, MetadataError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);
    let mut ctx = md5::Context::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let n = reader.read(&mut buf).map_err(|e| io_err(path, e))?;
        if n == 0 {
            break;
        }
        ctx.consume(&buf[..n]);
        size += n as u64;
    }

    Ok(ContentIdentity {
        md5: format!("{:x}", ctx.compute()),
        size,
    })
}
