//! Standalone pack and unpack of a single container.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use sbk_mht::{write_atomic, write_parts, Container};

use crate::error::{ConvertError, ConvertResult};

/// Where container bytes come from or go to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Stdio,
    File(PathBuf),
}

impl Endpoint {
    /// `-` selects stdin/stdout.
    pub fn parse(arg: &Path) -> Self {
        if arg == Path::new("-") {
            Self::Stdio
        } else {
            Self::File(arg.to_path_buf())
        }
    }
}

/// Pack `dir` and write the container to `target`. Returns the byte count.
pub fn pack(dir: &Path, target: &Endpoint, overwrite: bool) -> ConvertResult<usize> {
    if let Endpoint::File(path) = target {
        if path.exists() && !overwrite {
            return Err(ConvertError::OutputExists(path.clone()));
        }
    }
    let container = Container::from_dir(dir)?;
    let bytes = container.to_bytes();
    match target {
        Endpoint::File(path) => write_atomic(path, &bytes, overwrite)?,
        Endpoint::Stdio => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&bytes)
                .and_then(|_| stdout.flush())
                .map_err(|e| ConvertError::io("-", "-", e))?;
        }
    }
    info!(dir = %dir.display(), parts = container.len(), bytes = bytes.len(), "packed container");
    Ok(bytes.len())
}

/// Read a container from `source` and unpack it into a new directory.
///
/// An existing `dir` is only reused with `overwrite`. Returns the written
/// paths.
pub fn unpack(source: &Endpoint, dir: &Path, overwrite: bool) -> ConvertResult<Vec<PathBuf>> {
    if dir.exists() && !overwrite {
        return Err(ConvertError::OutputExists(dir.to_path_buf()));
    }
    let bytes = match source {
        Endpoint::File(path) => {
            std::fs::read(path).map_err(|e| ConvertError::io("-", path, e))?
        }
        Endpoint::Stdio => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut bytes)
                .map_err(|e| ConvertError::io("-", "-", e))?;
            bytes
        }
    };
    let container = Container::from_bytes(&bytes)?;
    std::fs::create_dir_all(dir).map_err(|e| ConvertError::io("-", dir, e))?;
    let written = write_parts(dir, &container.parts, overwrite)?;
    info!(dir = %dir.display(), files = written.len(), "unpacked container");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn dash_means_stdio() {
        assert_eq!(Endpoint::parse(Path::new("-")), Endpoint::Stdio);
        assert_eq!(
            Endpoint::parse(Path::new("a.mht")),
            Endpoint::File(PathBuf::from("a.mht"))
        );
    }

    #[test]
    fn pack_then_unpack_restores_the_directory() {
        let work = tempfile::tempdir().unwrap();
        let src = work.path().join("src");
        fs::create_dir_all(src.join("img")).unwrap();
        fs::write(src.join("index.html"), "<p>x</p>").unwrap();
        fs::write(src.join("img/a.gif"), [7u8, 8, 9]).unwrap();

        let mht = Endpoint::File(work.path().join("page.mht"));
        assert!(pack(&src, &mht, false).unwrap() > 0);
        assert!(matches!(
            pack(&src, &mht, false).unwrap_err(),
            ConvertError::OutputExists(_)
        ));

        let dest = work.path().join("dest");
        let written = unpack(&mht, &dest, false).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read(dest.join("index.html")).unwrap(), b"<p>x</p>");
        assert_eq!(fs::read(dest.join("img/a.gif")).unwrap(), vec![7u8, 8, 9]);

        assert!(matches!(
            unpack(&mht, &dest, false).unwrap_err(),
            ConvertError::OutputExists(_)
        ));
        assert_eq!(unpack(&mht, &dest, true).unwrap().len(), 2);
    }
}
