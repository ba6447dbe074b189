use std::path::{Component, Path, PathBuf};

fn strip_root(path: &Path) -> &Path {
    match path.strip_prefix("/") {
        Ok(relative) => relative,
        Err(_) => path,
    }
}

/// Returns the path obtained by joining the given base path with the given relative path.
/// A leading '/' on `relative` is ignored, so absolute host paths land beneath `base`.
pub fn join_relative(base: impl AsRef<Path>, relative: impl AsRef<Path>) -> PathBuf {
    base.as_ref().join(strip_root(relative.as_ref()))
}

/// Inverse of [`join_relative`]: turns a path found beneath `base` back into the absolute path
/// it represents on the inspected host. Returns `None` if `path` is not beneath `base`.
pub fn unjoin_relative(base: impl AsRef<Path>, path: impl AsRef<Path>) -> Option<PathBuf> {
    let relative = path.as_ref().strip_prefix(base.as_ref()).ok()?;
    Some(
        std::iter::once(Component::RootDir)
            .chain(relative.components())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_relative() {
        assert_eq!(join_relative("/host", "proc/vz"), Path::new("/host/proc/vz"));
        assert_eq!(join_relative("/host", "/proc/vz"), Path::new("/host/proc/vz"));
        assert_eq!(
            join_relative("/host", "/host/proc"),
            Path::new("/host/host/proc")
        );
    }

    #[test]
    fn test_unjoin_relative() {
        assert_eq!(
            unjoin_relative("/host", "/host/proc/vz/vzquota"),
            Some(PathBuf::from("/proc/vz/vzquota"))
        );
        assert_eq!(unjoin_relative("/host", "/host"), Some(PathBuf::from("/")));
        assert_eq!(unjoin_relative("/host", "/proc/vz"), None);

        let joined = join_relative("/mnt/root", "/sys/bus/xen");
        assert_eq!(
            unjoin_relative("/mnt/root", joined),
            Some(PathBuf::from("/sys/bus/xen"))
        );
    }
}
