//! Property tests for the pure classification and planning layers.

use std::path::PathBuf;

use proptest::prelude::*;

use livesass::classifier::{classify, FileType};
use livesass::config::FormatSpec;
use livesass::planner::plan;

proptest! {
    /// Classification never faults, whatever the file name looks like.
    #[test]
    fn classification_is_total(name in "[a-zA-Z0-9_./-]{1,40}") {
        let path = PathBuf::from(name);
        prop_assert!(classify(&path, &[], None).is_ok());
    }

    /// Every Sass-extension file gets a real verdict, case-insensitively.
    #[test]
    fn sass_files_are_never_irrelevant(
        stem in "[a-zA-Z][a-zA-Z0-9]{0,20}",
        ext in prop::sample::select(vec!["sass", "scss", "SASS", "Scss"]),
    ) {
        let path = PathBuf::from(format!("{stem}.{ext}"));
        let verdict = classify(&path, &[], None).unwrap();
        prop_assert_ne!(verdict, FileType::Irrelevant);
    }

    /// The underscore rule holds regardless of the rest of the name.
    #[test]
    fn underscore_prefix_means_partial(stem in "[a-z][a-z0-9]{0,16}") {
        let path = PathBuf::from(format!("_{stem}.scss"));
        prop_assert_eq!(classify(&path, &[], None).unwrap(), FileType::Partial);
    }

    /// In-place planning keeps the directory and only swaps the extension.
    #[test]
    fn planner_swaps_extension_in_place(stem in "[a-z][a-z0-9]{0,12}") {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join(format!("{stem}.scss"));

        let planned = plan(&source, &FormatSpec::default(), None).unwrap();
        prop_assert_eq!(planned.css, dir.path().join(format!("{stem}.css")));
        prop_assert!(planned.map.to_string_lossy().ends_with(".css.map"));
    }
}
