//! Human-readable run report.

use gitrip_recover::{Status, Summary};

/// Prints the run summary to stdout.
pub fn print(summary: &Summary) {
    let status = match summary.status {
        Status::Success => "Success",
        Status::PartialSuccess => "Partial Success",
        Status::Failure | Status::Unknown => "FAILED",
    };

    println!();
    println!("Status:            {status}");
    println!("Retrieved Objects: {}", summary.found_objects.len());
    println!("Missing Objects:   {}", summary.missing_objects.len());
    println!(
        "Pack Data Listed:  {}",
        summary.pack_information_available
    );
    println!("Repository:        {}", summary.config.repository_name);

    println!("Remotes:");
    for remote in &summary.config.remotes {
        println!("  - {}: {}", remote.name, remote.url);
    }

    println!("Branches:");
    for branch in &summary.config.branches {
        println!("  - {} ({})", branch.name, branch.remote);
    }

    let user = &summary.config.user;
    if !user.name.is_empty() || !user.email.is_empty() || !user.username.is_empty() {
        println!("User:              {} <{}> {}", user.name, user.email, user.username);
    }

    if let Some(token) = &summary.config.github_token {
        println!("Leaked Token:      {} ({})", token.token, token.username);
    }

    println!();
    println!(
        "You can find the retrieved repository data in {}",
        summary.output_directory.display()
    );
}
