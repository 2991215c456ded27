//! Submission validation

use crease_core::{MediaFile, Rejection};

/// Declared size ceiling shown on the upload surface (50 MB)
pub const DEFAULT_MAX_SIZE: u64 = 50 * 1024 * 1024;

/// Intake configuration
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    /// Accepted media types; `type/*` matches a whole family
    pub accepted_media_types: Vec<String>,
    /// Accepted file extensions, without the dot
    pub accepted_extensions: Vec<String>,
    /// Size ceiling in bytes
    pub max_size: u64,
    /// Reject files above `max_size` instead of only advertising the limit
    pub enforce_size_limit: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        IntakeConfig {
            accepted_media_types: vec!["video/*".into()],
            accepted_extensions: vec!["mp4".into(), "mov".into(), "avi".into()],
            max_size: DEFAULT_MAX_SIZE,
            enforce_size_limit: false,
        }
    }
}

impl IntakeConfig {
    /// Same allow-list with the size ceiling enforced
    pub fn strict() -> Self {
        IntakeConfig {
            enforce_size_limit: true,
            ..Self::default()
        }
    }

    fn media_type_accepted(&self, media_type: &str) -> bool {
        let media_type = media_type.trim().to_ascii_lowercase();
        if media_type.is_empty() {
            return false;
        }
        self.accepted_media_types.iter().any(|pattern| {
            let pattern = pattern.to_ascii_lowercase();
            match pattern.strip_suffix("/*") {
                Some(family) => media_type
                    .split_once('/')
                    .map_or(false, |(f, _)| f == family),
                None => pattern == media_type,
            }
        })
    }

    fn extension_accepted(&self, file: &MediaFile) -> bool {
        file.extension().map_or(false, |ext| {
            self.accepted_extensions
                .iter()
                .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
    }

    /// Check one file against the allow-list and size ceiling
    pub fn validate(&self, file: &MediaFile) -> Result<(), Rejection> {
        if !self.media_type_accepted(&file.media_type) && !self.extension_accepted(file) {
            return Err(Rejection::UnsupportedType {
                name: file.name.clone(),
                media_type: file.media_type.clone(),
            });
        }
        if self.enforce_size_limit && file.size > self.max_size {
            return Err(Rejection::TooLarge {
                size: file.size,
                limit: self.max_size,
            });
        }
        Ok(())
    }

    /// Keep the first acceptable file of a submission
    ///
    /// Extra files are dropped silently. With no acceptable file the first
    /// file's rejection is reported, or `NoFile` for an empty submission.
    pub fn pick<I>(&self, files: I) -> Result<MediaFile, Rejection>
    where
        I: IntoIterator<Item = MediaFile>,
    {
        let mut first_rejection = None;
        let mut discarded = 0usize;
        let mut accepted = None;

        for file in files {
            if accepted.is_some() {
                discarded += 1;
                continue;
            }
            match self.validate(&file) {
                Ok(()) => accepted = Some(file),
                Err(reason) => {
                    discarded += 1;
                    first_rejection.get_or_insert(reason);
                }
            }
        }

        match accepted {
            Some(file) => {
                if discarded > 0 {
                    tracing::debug!(kept = %file.name, discarded, "extra files dropped");
                }
                Ok(file)
            }
            None => Err(first_rejection.unwrap_or(Rejection::NoFile)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_video_containers() {
        let config = IntakeConfig::default();
        for (name, ty) in [
            ("swing.mp4", "video/mp4"),
            ("swing.mov", "video/quicktime"),
            ("swing.avi", "video/x-msvideo"),
            ("swing.webm", "video/webm"),
            ("SWING.MP4", ""),
        ] {
            let file = MediaFile::declared(name, ty, 1024);
            assert!(config.validate(&file).is_ok(), "{} should be accepted", name);
        }
    }

    #[test]
    fn test_rejects_pdf() {
        let config = IntakeConfig::default();
        let file = MediaFile::declared("notes.pdf", "application/pdf", 1024);
        let reason = config.validate(&file).unwrap_err();
        assert_eq!(reason.to_string(), "unsupported type");
    }

    #[test]
    fn test_size_limit_advisory_by_default() {
        let big = MediaFile::declared("long.mp4", "video/mp4", DEFAULT_MAX_SIZE + 1);
        assert!(IntakeConfig::default().validate(&big).is_ok());
        assert_eq!(
            IntakeConfig::strict().validate(&big),
            Err(Rejection::TooLarge {
                size: DEFAULT_MAX_SIZE + 1,
                limit: DEFAULT_MAX_SIZE
            })
        );

        let exact = MediaFile::declared("exact.mp4", "video/mp4", DEFAULT_MAX_SIZE);
        assert!(IntakeConfig::strict().validate(&exact).is_ok());
    }

    #[test]
    fn test_pick_first_accepted() {
        let config = IntakeConfig::default();
        let files = vec![
            MediaFile::declared("notes.pdf", "application/pdf", 10),
            MediaFile::declared("first.mp4", "video/mp4", 10),
            MediaFile::declared("second.mov", "video/quicktime", 10),
        ];
        assert_eq!(config.pick(files).unwrap().name, "first.mp4");
    }

    #[test]
    fn test_pick_empty() {
        assert_eq!(IntakeConfig::default().pick(Vec::new()), Err(Rejection::NoFile));
    }

    #[test]
    fn test_pick_reports_first_rejection() {
        let files = vec![
            MediaFile::declared("a.pdf", "application/pdf", 10),
            MediaFile::declared("b.txt", "text/plain", 10),
        ];
        match IntakeConfig::default().pick(files) {
            Err(Rejection::UnsupportedType { name, .. }) => assert_eq!(name, "a.pdf"),
            other => panic!("unexpected {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_pick_keeps_first_video(extra in 0usize..8, junk_front in 0usize..4) {
            let config = IntakeConfig::default();
            let mut files = Vec::new();
            for i in 0..junk_front {
                files.push(MediaFile::declared(format!("doc{}.pdf", i), "application/pdf", 1));
            }
            files.push(MediaFile::declared("keep.mp4", "video/mp4", 1));
            for i in 0..extra {
                files.push(MediaFile::declared(format!("more{}.mov", i), "video/quicktime", 1));
            }
            let picked = config.pick(files);
            prop_assert_eq!(picked.map(|f| f.name), Ok("keep.mp4".to_string()));
        }
    }
}
