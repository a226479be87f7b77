//! Every binary in this crate carries the workspace license header.

use std::fs;
use std::path::Path;

const HEADER: &str = "// SPDX-License-Identifier: AGPL-3.0-only\n";

#[test]
fn test_bins_carry_license_header() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/bin");
    let mut seen = 0;
    for entry in fs::read_dir(&dir).expect("src/bin") {
        let path = entry.expect("dir entry").path();
        if path.extension().is_some_and(|e| e == "rs") {
            let text = fs::read_to_string(&path).expect("read source");
            assert!(text.starts_with(HEADER), "{} lacks the license header", path.display());
            seen += 1;
        }
    }
    assert!(seen >= 2);
}
