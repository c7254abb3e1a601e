use std::fs;
use std::io;
use std::path::Path;

/// Create `path` (and parents) and tighten it to 0700 when we own it.
///
/// Directories owned by another user (a shared temp root, for example) are
/// left untouched.
pub fn ensure_secure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};
        let metadata = fs::metadata(path)?;

        // SAFETY: getuid has no preconditions and cannot fail.
        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() != our_uid {
            return Ok(());
        }

        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            tracing::debug!(
                path = %path.display(),
                "State dir permissions are too open ({:o}); tightening to 0700",
                mode
            );
            fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}
