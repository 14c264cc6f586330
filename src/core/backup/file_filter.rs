use crate::model::core::backup::job::BackupOptions;
use crate::model::error::Error;
use crate::model::error::task::TaskError;
use crate::platform::attributes::FileAttributes;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Decides which candidate files of a job end up in the snapshot.
///
/// Attribute checks run first, then exclude patterns, then include patterns.
/// Patterns are case-insensitive globs matched against the base name only.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include_hidden: bool,
    include_system: bool,
    exclude: Option<GlobSet>,
    include: Option<GlobSet>,
}

impl FileFilter {
    pub fn new(options: &BackupOptions) -> Result<Self, Error> {
        Ok(FileFilter {
            include_hidden: options.include_hidden,
            include_system: options.include_system,
            exclude: Self::build_glob_set(&options.exclude_patterns)?,
            include: Self::build_glob_set(&options.include_patterns)?,
        })
    }

    fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>, Error> {
        if patterns.is_empty() {
            return Ok(None);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
                .map_err(|err| TaskError::invalid_pattern(pattern.as_str(), err))?;
            builder.add(glob);
        }
        let glob_set = builder
            .build()
            .map_err(|err| TaskError::invalid_pattern(patterns.join(", "), err))?;
        Ok(Some(glob_set))
    }

    /// `attributes` is `None` when they could not be read, such files are kept.
    pub fn accepts(&self, path: &Path, attributes: Option<&FileAttributes>) -> bool {
        if let Some(attributes) = attributes {
            if attributes.hidden && !self.include_hidden {
                return false;
            }
            if attributes.system && !self.include_system {
                return false;
            }
        }
        match path.file_name() {
            Some(name) => self.accepts_name(&name.to_string_lossy()),
            None => false,
        }
    }

    pub fn accepts_name(&self, name: &str) -> bool {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(name) {
                return false;
            }
        }
        match &self.include {
            Some(include) => include.is_match(name),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(exclude: &[&str], include: &[&str]) -> FileFilter {
        let options = BackupOptions {
            exclude_patterns: exclude.iter().map(|x| x.to_string()).collect(),
            include_patterns: include.iter().map(|x| x.to_string()).collect(),
            ..Default::default()
        };
        FileFilter::new(&options).unwrap()
    }

    fn attributes(hidden: bool, system: bool) -> FileAttributes {
        FileAttributes {
            hidden,
            system,
            read_only: false,
            #[cfg(not(target_os = "windows"))]
            mode: 0o644,
            #[cfg(target_os = "windows")]
            attributes: 0,
            size: 0,
            created: None,
            modified: None,
            accessed: None,
        }
    }

    #[test]
    fn no_patterns_accept_everything() {
        let filter = filter(&[], &[]);
        assert!(filter.accepts_name("report.docx"));
        assert!(filter.accepts_name("b.tmp"));
    }

    #[test]
    fn exclude_is_case_insensitive() {
        let filter = filter(&["*.tmp"], &[]);
        assert!(filter.accepts_name("a.txt"));
        assert!(!filter.accepts_name("b.tmp"));
        assert!(!filter.accepts_name("C.TMP"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter = filter(&["secret*"], &["*.txt"]);
        assert!(filter.accepts_name("notes.txt"));
        assert!(!filter.accepts_name("secret.txt"));
        assert!(!filter.accepts_name("image.png"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let filter = filter(&[], &["log?.txt"]);
        assert!(filter.accepts_name("log1.txt"));
        assert!(!filter.accepts_name("log12.txt"));
        assert!(!filter.accepts_name("log.txt"));
    }

    #[test]
    fn patterns_only_see_the_base_name() {
        let filter = filter(&["cache*"], &[]);
        assert!(filter.accepts(Path::new("/data/cache/readme.md"), None));
        assert!(!filter.accepts(Path::new("/data/docs/cache.db"), None));
    }

    #[test]
    fn hidden_and_system_files_follow_options() {
        let filter = filter(&[], &[]);
        let path = Path::new("/data/file.txt");
        assert!(filter.accepts(path, Some(&attributes(false, false))));
        assert!(!filter.accepts(path, Some(&attributes(true, false))));
        assert!(!filter.accepts(path, Some(&attributes(false, true))));

        let options = BackupOptions {
            include_hidden: true,
            include_system: true,
            ..Default::default()
        };
        let filter = FileFilter::new(&options).unwrap();
        assert!(filter.accepts(path, Some(&attributes(true, true))));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let options = BackupOptions {
            exclude_patterns: vec!["[unclosed".to_string()],
            ..Default::default()
        };
        assert!(FileFilter::new(&options).is_err());
    }
}
