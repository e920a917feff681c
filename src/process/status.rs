use std::io::BufRead;

/// Extracts the real UID from a `/proc/[pid]/status` reader.
///
/// The `Uid:` line lists the real, effective, saved and filesystem UIDs; only the first one is
/// returned. Returns `Ok(None)` if the line is missing or malformed.
///
/// Lines are read as bytes: the `Name:` line carries the raw command name, which need not be
/// valid UTF-8.
pub fn read_real_uid<R: BufRead>(reader: &mut R) -> std::io::Result<Option<u32>> {
    let mut line = Vec::with_capacity(128);
    while reader.read_until(b'\n', &mut line)? != 0 {
        if let Some(rest) = line.strip_prefix(b"Uid:") {
            return Ok(String::from_utf8_lossy(rest)
                .split_whitespace()
                .next()
                .and_then(|uid| uid.parse::<u32>().ok()));
        }
        line.clear();
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_first_uid() {
        let data = "\
Name:\tnginx
Umask:\t0022
State:\tS (sleeping)
Tgid:\t812
Pid:\t812
PPid:\t790
Uid:\t101\t102\t103\t104
Gid:\t101\t101\t101\t101
";
        let uid = read_real_uid(&mut data.as_bytes()).unwrap();
        assert_eq!(uid, Some(101));
    }

    #[test]
    fn test_invalid_utf8_name_line() {
        let data: &[u8] = b"Name:\tbad\xffname\nPid:\t31\nUid:\t1000\t1000\t1000\t1000\n";
        let mut reader = data;
        assert_eq!(read_real_uid(&mut reader).unwrap(), Some(1000));
    }

    #[test]
    fn test_missing_uid_line() {
        let data = "Name:\tbash\nPid:\t1\n";
        assert_eq!(read_real_uid(&mut data.as_bytes()).unwrap(), None);
    }

    #[test]
    fn test_malformed_uid_line() {
        let data = "Uid:\troot\t0\t0\t0\n";
        assert_eq!(read_real_uid(&mut data.as_bytes()).unwrap(), None);
    }
}
