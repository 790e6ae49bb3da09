use anyhow::Result;

use crate::cargo;

/// Feature tiers of `clearhold-common`; each must build without the others
const TIERS: &[&str] = &["", "foundation", "observability", "runtime", "test-utils"];

pub fn check_tiers() -> Result<()> {
    for (index, &tier) in TIERS.iter().enumerate() {
        let label = if tier.is_empty() { "no features" } else { tier };
        println!("[{}/{}] clearhold-common: {label}", index + 1, TIERS.len());

        let mut args = vec!["check", "-p", "clearhold-common", "--no-default-features"];
        if !tier.is_empty() {
            args.extend(["--features", tier]);
        }
        cargo(&args, &format!("clearhold-common does not build with {label}"))?;
    }

    println!("All {} clearhold-common tiers build", TIERS.len());
    Ok(())
}
