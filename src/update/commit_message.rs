//! Commit messages for regenerated APIs.

use crate::defaults::GOOGLEAPIS_URL;
use crate::git::Commit;

const PROVENANCE_PREFIX: &str = "PiperOrigin-RevId: ";

/// Build the message for a regeneration commit from the upstream commits it
/// covers.
///
/// `commits` is newest first, as returned by `commits_since`; the message
/// lists them oldest first. Provenance lines are moved after the ordinary
/// lines, followed by one `Source-Link` per upstream commit.
pub fn create_commit_message(commits: &[Commit]) -> String {
    let mut body = String::new();
    let mut tags = Vec::new();
    let mut links = Vec::new();

    for commit in commits.iter().rev() {
        for line in commit.message.split('\n') {
            if line.starts_with(PROVENANCE_PREFIX) {
                tags.push(line);
            } else {
                body.push_str(line);
                body.push('\n');
            }
        }
        links.push(format!(
            "Source-Link: {}/commit/{}",
            GOOGLEAPIS_URL, commit.hash
        ));
    }

    for tag in tags {
        body.push_str(tag);
        body.push('\n');
    }
    for link in links {
        body.push_str(&link);
        body.push('\n');
    }
    body
}
