use std::io::{self, Read, Seek, SeekFrom};

const CHUNK_SIZE: usize = 4096;

/// Find the last line that is not empty or whitespace-only, reading backwards
/// from the end in fixed-size chunks.
///
/// `\n`, `\r` and `\r\n` all terminate lines. The returned line is untrimmed and
/// decoded lossily as UTF-8.
pub fn last_non_blank_line<R: Read + Seek>(reader: &mut R) -> io::Result<Option<String>> {
    let mut pos = reader.seek(SeekFrom::End(0))?;
    let mut chunk = vec![0u8; CHUNK_SIZE];
    // Bytes of the line being assembled, in reverse order
    let mut reversed = Vec::new();

    while pos > 0 {
        let len = chunk_len(pos);
        pos -= len as u64;
        reader.seek(SeekFrom::Start(pos))?;
        reader.read_exact(&mut chunk[..len])?;

        for &byte in chunk[..len].iter().rev() {
            if byte == b'\n' || byte == b'\r' {
                if let Some(line) = non_blank(&reversed) {
                    return Ok(Some(line));
                }
                reversed.clear();
            } else {
                reversed.push(byte);
            }
        }
    }

    Ok(non_blank(&reversed))
}

/// Bytes to read for the chunk ending at `pos`
fn chunk_len(pos: u64) -> usize {
    usize::try_from(pos).map_or(CHUNK_SIZE, |p| p.min(CHUNK_SIZE))
}

fn non_blank(reversed: &[u8]) -> Option<String> {
    if reversed.is_empty() {
        return None;
    }
    let bytes: Vec<u8> = reversed.iter().rev().copied().collect();
    let line = String::from_utf8_lossy(&bytes).into_owned();
    if line.trim().is_empty() {
        None
    } else {
        Some(line)
    }
}
