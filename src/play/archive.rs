//! Gzipped tar packaging of a bot directory for remote play.

use std::{fs, io, io::Write, path::Path};

use flate2::{write::GzEncoder, Compression};
use tar::Builder;

/// Archive the contents of `dir` with paths relative to it.
/// The directory itself gets no entry; symlinks are stored as links, never followed.
pub fn pack_directory(dir: &Path) -> io::Result<Vec<u8>> {
    let mut tar = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    tar.follow_symlinks(false);
    append_tree(&mut tar, dir, dir)?;
    tar.into_inner()?.finish()
}

fn append_tree<W: Write>(tar: &mut Builder<W>, dir: &Path, base: &Path) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let relative = path.strip_prefix(base).unwrap_or(&path);
        if entry.file_type()?.is_dir() {
            tar.append_dir(relative, &path)?;
            append_tree(tar, &path, base)?;
        } else {
            tar.append_path_with_name(&path, relative)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use pretty_assertions::assert_eq;
    use std::{io::Read, path::PathBuf};

    #[test]
    fn contents_land_at_archive_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM python:3\n").unwrap();
        fs::write(dir.path().join("bot.py"), "print('move')\n").unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib").join("util.py"), "X = 1\n").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let bytes = pack_directory(dir.path()).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

        let mut archive = tar::Archive::new(GzDecoder::new(bytes.as_slice()));
        let mut seen = Vec::new();
        let mut bot_source = String::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().into_owned();
            if path == Path::new("bot.py") {
                entry.read_to_string(&mut bot_source).unwrap();
            }
            seen.push(path);
        }

        assert_eq!(
            seen,
            vec![
                PathBuf::from("Dockerfile"),
                PathBuf::from("bot.py"),
                PathBuf::from("empty"),
                PathBuf::from("lib"),
                PathBuf::from("lib/util.py"),
            ]
        );
        assert_eq!(bot_source, "print('move')\n");
    }

    #[cfg(unix)]
    fn link_entries(bytes: &[u8]) -> Vec<(PathBuf, PathBuf)> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.header().entry_type().is_symlink())
            .map(|e| {
                let name = e.path().unwrap().into_owned();
                let target = e.link_name().unwrap().unwrap().into_owned();
                (name, target)
            })
            .collect()
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_stored_as_link() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bot.py"), "print('move')\n").unwrap();
        std::os::unix::fs::symlink("/nonexistent/target", dir.path().join("dangling")).unwrap();

        let bytes = pack_directory(dir.path()).unwrap();
        assert_eq!(
            link_entries(&bytes),
            vec![(PathBuf::from("dangling"), PathBuf::from("/nonexistent/target"))]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bot.py"), "print('move')\n").unwrap();
        std::os::unix::fs::symlink(".", dir.path().join("self")).unwrap();

        let bytes = pack_directory(dir.path()).unwrap();
        assert_eq!(link_entries(&bytes), vec![(PathBuf::from("self"), PathBuf::from("."))]);
    }

    #[test]
    fn missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pack_directory(&dir.path().join("gone")).is_err());
    }
}
