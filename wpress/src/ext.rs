//! Extension traits for base types defined in `wpress-core`.
use std::path::{Component, Path};
use std::str;

use wpress_core::EntryHeader;

use crate::Error;

pub trait EntryExt {
    fn checked_path(&self) -> Result<&Path, Error>;
}

impl EntryExt for EntryHeader {
    /// Decode the entry name and ensure that there are no non-normal
    /// components.
    fn checked_path(&self) -> Result<&Path, Error> {
        let name = str::from_utf8(self.name_bytes()).map_err(|_| Error::NonUtf8Name {
            name: String::from_utf8_lossy(self.name_bytes()).into_owned(),
        })?;
        let path = Path::new(name);
        check_path(path)?;
        Ok(path)
    }
}

/// Iterate the components of the path and ensure that there are no
/// non-normal components.
pub(crate) fn check_path(path: &Path) -> Result<(), Error> {
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            invalid => {
                let bad_component: &Path = invalid.as_ref();
                return Err(Error::InvalidPath {
                    entry: path.to_path_buf(),
                    component: bad_component.to_path_buf(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use wpress_core::EntryHeader;

    use super::EntryExt;
    use crate::Error;

    #[test]
    fn relative_names_pass() {
        let header = EntryHeader::new("wp-content/themes/index.php", 0, 0).unwrap();
        assert_eq!(
            header.checked_path().unwrap().to_str().unwrap(),
            "wp-content/themes/index.php"
        );
    }

    #[test]
    fn parent_components_are_rejected() {
        let header = EntryHeader::new("../escape.txt", 0, 0).unwrap();
        assert!(matches!(
            header.checked_path(),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn absolute_names_are_rejected() {
        let header = EntryHeader::new("/etc/passwd", 0, 0).unwrap();
        assert!(matches!(
            header.checked_path(),
            Err(Error::InvalidPath { .. })
        ));
    }
}
