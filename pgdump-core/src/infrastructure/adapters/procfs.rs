// pgdump-core/src/infrastructure/adapters/procfs.rs
//
// Direct reads of the Linux /proc tree: TCP socket tables and per-process
// file descriptors. Addresses in /proc/net/tcp* are printed as host-order
// 32-bit words, so this assumes a little-endian host.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::detection::files::is_ignored_path;
use crate::domain::process::{NetworkConnection, OutputFile, TcpState};
use crate::infrastructure::error::InfrastructureError;

const O_ACCMODE: u32 = 0o3;

/// Socket inode -> connection, for every TCP socket on the host.
pub type SocketTable = HashMap<u64, NetworkConnection>;

#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcFs {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Alternate mount point, used by tests with a fake tree.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reads `net/tcp` and `net/tcp6`. A missing table (no IPv6, non-Linux)
    /// contributes nothing.
    pub fn socket_table(&self) -> Result<SocketTable, InfrastructureError> {
        let mut table = SocketTable::new();
        for (name, ipv6) in [("tcp", false), ("tcp6", true)] {
            let path = self.root.join("net").join(name);
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            for (inode, conn) in parse_tcp_table(&content, ipv6)? {
                table.insert(inode, conn);
            }
        }
        Ok(table)
    }

    /// Socket inodes behind the process' descriptors.
    pub fn socket_inodes(&self, pid: u32) -> Vec<u64> {
        self.fd_targets(pid)
            .into_iter()
            .filter_map(|(_, target)| socket_inode(&target.to_string_lossy()))
            .collect()
    }

    /// Regular files the process holds open for writing.
    pub fn open_files(&self, pid: u32) -> Vec<OutputFile> {
        let mut files = Vec::new();
        for (fd_path, target) in self.fd_targets(pid) {
            if !target.is_absolute() || is_ignored_path(&target) {
                continue;
            }
            // Going through the fd link also works for unlinked files.
            let meta = match fs::metadata(&fd_path) {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let Some(fd) = fd_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !self.is_writable(pid, fd) {
                continue;
            }
            files.push(OutputFile {
                path: strip_deleted(&target),
                size: meta.len(),
            });
        }
        files
    }

    fn fd_targets(&self, pid: u32) -> Vec<(PathBuf, PathBuf)> {
        let fd_dir = self.root.join(pid.to_string()).join("fd");
        let entries = match fs::read_dir(&fd_dir) {
            Ok(e) => e,
            Err(e) => {
                // Exited, or owned by another user without CAP_SYS_PTRACE.
                debug!(pid, error = %e, "Cannot list file descriptors");
                return Vec::new();
            }
        };
        entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                fs::read_link(&path).ok().map(|target| (path, target))
            })
            .collect()
    }

    /// Unknown flags are treated as writable.
    fn is_writable(&self, pid: u32, fd: &str) -> bool {
        let fdinfo = self.root.join(pid.to_string()).join("fdinfo").join(fd);
        match fs::read_to_string(fdinfo) {
            Ok(content) => parse_fd_flags(&content).is_none_or(|f| f & O_ACCMODE != 0),
            Err(_) => true,
        }
    }
}

/// `socket:[12345]` -> 12345
pub fn socket_inode(link: &str) -> Option<u64> {
    link.strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

fn strip_deleted(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    match text.strip_suffix(" (deleted)") {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    }
}

/// `flags:\t0100001` (octal).
fn parse_fd_flags(fdinfo: &str) -> Option<u32> {
    fdinfo
        .lines()
        .find_map(|l| l.strip_prefix("flags:"))
        .and_then(|v| u32::from_str_radix(v.trim(), 8).ok())
}

pub fn parse_tcp_table(
    content: &str,
    ipv6: bool,
) -> Result<Vec<(u64, NetworkConnection)>, InfrastructureError> {
    let source_name = if ipv6 { "/proc/net/tcp6" } else { "/proc/net/tcp" };
    let malformed = |detail: String| InfrastructureError::ProcFormat {
        source_name: source_name.to_string(),
        detail,
    };

    let mut rows = Vec::new();
    // First line is the column header.
    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 10 {
            return Err(malformed(format!("too few columns in '{}'", line.trim())));
        }

        let (local_addr, local_port) =
            parse_endpoint(fields[1], ipv6).ok_or_else(|| malformed(fields[1].to_string()))?;
        let (remote_addr, remote_port) =
            parse_endpoint(fields[2], ipv6).ok_or_else(|| malformed(fields[2].to_string()))?;
        let inode: u64 = fields[9]
            .parse()
            .map_err(|_| malformed(format!("bad inode '{}'", fields[9])))?;

        rows.push((
            inode,
            NetworkConnection {
                local_addr,
                local_port,
                remote_addr,
                remote_port,
                state: TcpState::from_hex(fields[3]),
            },
        ));
    }
    Ok(rows)
}

/// `0100007F:1538` -> 127.0.0.1:5432
fn parse_endpoint(raw: &str, ipv6: bool) -> Option<(IpAddr, u16)> {
    let (addr_hex, port_hex) = raw.split_once(':')?;
    let port = u16::from_str_radix(port_hex, 16).ok()?;
    let addr = if ipv6 {
        if addr_hex.len() != 32 {
            return None;
        }
        let mut octets = [0u8; 16];
        for (i, chunk) in octets.chunks_mut(4).enumerate() {
            let word = u32::from_str_radix(addr_hex.get(i * 8..i * 8 + 8)?, 16).ok()?;
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        IpAddr::V6(Ipv6Addr::from(octets))
    } else {
        if addr_hex.len() != 8 {
            return None;
        }
        let word = u32::from_str_radix(addr_hex, 16).ok()?;
        IpAddr::V4(Ipv4Addr::from(word.to_le_bytes()))
    };
    Some((addr, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    const TCP: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:1538 00000000:0000 0A 00000000:00000000 00:00000000 00000000    26        0 23456 1 0000000000000000 100 0 0 10 0
   1: 0200000A:C7B2 0A01000A:1538 01 00000000:00000000 02:000A7D8C 00000000  1000        0 98765 2 0000000000000000 20 4 30 10 -1
";

    const TCP6: &str = "  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000000000000000000001000000:D431 00000000000000000000000001000000:1538 01 00000000:00000000 00:00000000 00000000  1000        0 55501 1 0000000000000000 20 4 0 10 -1
   1: 0000000000000000FFFF00000200000A:D432 0000000000000000FFFF00000C01000A:1389 01 00000000:00000000 00:00000000 00000000  1000        0 55502 1 0000000000000000 20 4 0 10 -1
";

    #[test]
    fn test_parse_ipv4_table() -> Result<()> {
        let rows = parse_tcp_table(TCP, false)?;
        assert_eq!(rows.len(), 2);

        let (inode, listen) = &rows[0];
        assert_eq!(*inode, 23456);
        assert_eq!(listen.local_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(listen.local_port, 5432);
        assert_eq!(listen.state, TcpState::Listen);

        let (_, client) = &rows[1];
        assert_eq!(client.local_addr, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(client.remote_addr, IpAddr::V4(Ipv4Addr::new(10, 0, 1, 10)));
        assert_eq!(client.remote_port, 5432);
        assert_eq!(client.state, TcpState::Established);
        Ok(())
    }

    #[test]
    fn test_parse_ipv6_table() -> Result<()> {
        let rows = parse_tcp_table(TCP6, true)?;
        assert_eq!(rows[0].1.remote_addr, IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(rows[0].1.remote_port, 5432);

        let mapped = Ipv4Addr::new(10, 0, 1, 12).to_ipv6_mapped();
        assert_eq!(rows[1].1.remote_addr, IpAddr::V6(mapped));
        assert_eq!(rows[1].1.remote_port, 5001);
        Ok(())
    }

    #[test]
    fn test_truncated_row_is_rejected() {
        let broken = "header\n   0: 0100007F:1538 00000000:0000 0A\n";
        assert!(matches!(
            parse_tcp_table(broken, false),
            Err(InfrastructureError::ProcFormat { .. })
        ));
    }

    #[test]
    fn test_socket_inode_link() {
        assert_eq!(socket_inode("socket:[98765]"), Some(98765));
        assert_eq!(socket_inode("pipe:[1]"), None);
        assert_eq!(socket_inode("/tmp/x"), None);
    }

    #[test]
    fn test_fake_proc_tree() -> Result<()> {
        let root = tempdir()?;
        let data = tempdir()?;

        fs::create_dir_all(root.path().join("net"))?;
        fs::write(root.path().join("net/tcp"), TCP)?;

        let fd_dir = root.path().join("4242/fd");
        let fdinfo_dir = root.path().join("4242/fdinfo");
        fs::create_dir_all(&fd_dir)?;
        fs::create_dir_all(&fdinfo_dir)?;

        let dump = data.path().join("crm.dump");
        fs::write(&dump, vec![0u8; 4096])?;
        let input = data.path().join("input.sql");
        fs::write(&input, "select 1;")?;
        let unknown = data.path().join("spool.out");
        fs::write(&unknown, vec![0u8; 10])?;

        symlink("socket:[98765]", fd_dir.join("3"))?;
        symlink(&dump, fd_dir.join("4"))?;
        symlink(&input, fd_dir.join("5"))?;
        symlink("/dev/null", fd_dir.join("6"))?;
        // no fdinfo entry for 7
        symlink(&unknown, fd_dir.join("7"))?;
        fs::write(fdinfo_dir.join("4"), "pos:\t4096\nflags:\t0100001\n")?;
        fs::write(fdinfo_dir.join("5"), "pos:\t0\nflags:\t0100000\n")?;

        let proc = ProcFs::with_root(root.path());
        let table = proc.socket_table()?;
        assert_eq!(table.len(), 2);
        assert_eq!(proc.socket_inodes(4242), vec![98765]);
        assert_eq!(table[&98765].remote_port, 5432);

        let mut files = proc.open_files(4242);
        files.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            files,
            vec![
                OutputFile { path: dump, size: 4096 },
                OutputFile { path: unknown, size: 10 },
            ]
        );

        assert!(proc.open_files(1).is_empty());
        Ok(())
    }

    #[test]
    fn test_strip_deleted_suffix() {
        assert_eq!(
            strip_deleted(Path::new("/tmp/crm.dump (deleted)")),
            PathBuf::from("/tmp/crm.dump")
        );
        assert_eq!(
            strip_deleted(Path::new("/tmp/crm.dump")),
            PathBuf::from("/tmp/crm.dump")
        );
        // only a trailing marker is removed
        assert_eq!(
            strip_deleted(Path::new("/srv/a (deleted)/b.sql")),
            PathBuf::from("/srv/a (deleted)/b.sql")
        );
    }
}
