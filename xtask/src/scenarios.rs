//! Named groups of integration suites, so one area of the client can be
//! exercised without the whole workspace run.

use anyhow::{bail, Result};

use crate::cargo;

pub struct Suite {
    pub name: &'static str,
    pub about: &'static str,
    /// `(package, test target)` pairs
    pub targets: &'static [(&'static str, &'static str)],
}

pub const SUITES: &[Suite] = &[
    Suite {
        name: "session",
        about: "sign-in, refresh single-flight, restore and sign-out",
        targets: &[
            ("clearhold-core", "session_integration"),
            ("clearhold-infra", "auth_backend_integration"),
            ("clearhold-app", "auth_commands"),
        ],
    },
    Suite {
        name: "requests",
        about: "request pipeline: retry, timeout, cancellation, interceptors",
        targets: &[("clearhold-infra", "api_client_integration")],
    },
    Suite {
        name: "offline",
        about: "offline queue persistence and replay",
        targets: &[
            ("clearhold-core", "queue_replay_integration"),
            ("clearhold-infra", "sqlite_store_integration"),
            ("clearhold-app", "request_commands"),
        ],
    },
    Suite {
        name: "context",
        about: "application start-up, restart and shutdown",
        targets: &[
            ("clearhold-app", "context_lifecycle"),
            ("clearhold-infra", "config_loader_integration"),
        ],
    },
];

/// Run the suite called `name`, or every suite when `None`
pub fn run(name: Option<&str>) -> Result<()> {
    let selected: Vec<&Suite> = match name {
        None => SUITES.iter().collect(),
        Some(name) => match SUITES.iter().find(|suite| suite.name == name) {
            Some(suite) => vec![suite],
            None => {
                let known: Vec<&str> = SUITES.iter().map(|suite| suite.name).collect();
                bail!("unknown scenario '{name}' (known: {})", known.join(", "));
            }
        },
    };

    for suite in selected {
        println!("\n==> scenario {}: {}", suite.name, suite.about);
        for &(package, target) in suite.targets {
            cargo(
                &["test", "-p", package, "--test", target],
                &format!("{package} {target} failed"),
            )?;
        }
    }
    Ok(())
}
