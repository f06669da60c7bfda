mod common;

use std::path::Path;

use anyhow::Result;

use common::FixtureRun;

#[test]
fn valid_fixtures_have_no_diagnostics() -> Result<()> {
    let mut run = FixtureRun::analyse(Path::new("tests/valid"))?;
    assert!(!run.files.is_empty(), "no valid fixtures found");

    let mut report = String::new();
    for path in run.files.clone() {
        let unexpected = run.take(&path);
        if unexpected.is_empty() {
            continue;
        }

        report.push_str(&format!("\n{}:\n", path.display()));
        for line in unexpected {
            report.push_str(&format!("    {line}\n"));
        }
    }

    assert!(report.is_empty(), "valid fixtures raised diagnostics:{report}");
    Ok(())
}
