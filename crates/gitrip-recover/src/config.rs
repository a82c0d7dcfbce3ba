//! Repository configuration parsing.
//!
//! The exposed `config` file uses git's INI-style syntax. Only the
//! sections that matter for reconnaissance are modeled: remotes,
//! branches, user identity and leaked github credentials. Everything
//! else is ignored.

use serde::{Deserialize, Serialize};

/// Sentinel name for a remote/branch section without a subsection.
const UNNAMED: &str = "?";

/// A configured remote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub name: String,
    pub url: String,
}

/// A configured branch and the remote it tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub remote: String,
}

/// The committer identity recorded in the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub username: String,
}

/// A leaked github credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubToken {
    pub username: String,
    pub token: String,
}

/// Structured view of the repository configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Derived from the first remote url: the segment after the last `/`
    /// with a trailing `.git` stripped.
    pub repository_name: String,
    pub remotes: Vec<Remote>,
    pub branches: Vec<Branch>,
    pub user: User,
    /// Present only if the configuration contains a github section.
    pub github_token: Option<GithubToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Remote,
    Branch,
    User,
    Github,
    Other,
}

impl RepoConfig {
    /// Parses the raw bytes of an exposed `config` file.
    ///
    /// Unknown sections and keys are ignored; lines without `=` are
    /// skipped. This never fails: a garbage file simply yields an empty
    /// config.
    pub fn parse(content: &[u8]) -> Self {
        let mut config = RepoConfig::default();
        let mut section = Section::Other;

        for line in String::from_utf8_lossy(content).lines() {
            let line = line.trim();

            if line.starts_with('[') && line.ends_with(']') {
                let inner = &line[1..line.len() - 1];
                let mut words = inner.splitn(2, ' ');
                let name = words.next().unwrap_or_default();
                let subsection = words
                    .next()
                    .map(|s| s.trim().trim_matches('"').to_string())
                    .unwrap_or_else(|| UNNAMED.to_string());

                section = match name {
                    "remote" => {
                        config.remotes.push(Remote {
                            name: subsection,
                            ..Remote::default()
                        });
                        Section::Remote
                    }
                    "branch" => {
                        config.branches.push(Branch {
                            name: subsection,
                            ..Branch::default()
                        });
                        Section::Branch
                    }
                    "user" => Section::User,
                    "github" => {
                        config.github_token.get_or_insert_with(GithubToken::default);
                        Section::Github
                    }
                    _ => Section::Other,
                };
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match section {
                Section::Remote => {
                    if key == "url" {
                        if let Some(remote) = config.remotes.last_mut() {
                            remote.url = value.to_string();
                        }
                        if let Some(segment) = value.rsplit('/').next() {
                            if !segment.is_empty() {
                                config.repository_name = segment
                                    .strip_suffix(".git")
                                    .unwrap_or(segment)
                                    .to_string();
                            }
                        }
                    }
                }
                Section::Branch => {
                    if key == "remote" {
                        if let Some(branch) = config.branches.last_mut() {
                            branch.remote = value.to_string();
                        }
                    }
                }
                Section::User => match key {
                    "name" => config.user.name = value.to_string(),
                    "email" => config.user.email = value.to_string(),
                    "username" => config.user.username = value.to_string(),
                    _ => {}
                },
                Section::Github => {
                    let token = config
                        .github_token
                        .get_or_insert_with(GithubToken::default);
                    match key {
                        "user" | "username" => token.username = value.to_string(),
                        "token" => token.token = value.to_string(),
                        _ => {}
                    }
                }
                Section::Other => {}
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_and_user() {
        let raw = b"[remote \"origin\"]\n\turl = https://example.com/proj.git\n[user]\n\temail = a@b.com\n\tname = A\n";
        let config = RepoConfig::parse(raw);

        assert_eq!(config.repository_name, "proj");
        assert_eq!(
            config.remotes,
            vec![Remote {
                name: "origin".to_string(),
                url: "https://example.com/proj.git".to_string(),
            }]
        );
        assert_eq!(config.user.name, "A");
        assert_eq!(config.user.email, "a@b.com");
        assert!(config.github_token.is_none());
    }

    #[test]
    fn test_parse_branches() {
        let raw = b"[branch \"main\"]\n\tremote = origin\n\tmerge = refs/heads/main\n[branch \"dev\"]\n\tremote = upstream\n";
        let config = RepoConfig::parse(raw);
        assert_eq!(
            config.branches,
            vec![
                Branch {
                    name: "main".to_string(),
                    remote: "origin".to_string(),
                },
                Branch {
                    name: "dev".to_string(),
                    remote: "upstream".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_unnamed_section_gets_sentinel() {
        let config = RepoConfig::parse(b"[remote]\n\turl = ssh://host/x\n");
        assert_eq!(config.remotes[0].name, "?");
        assert_eq!(config.repository_name, "x");
    }

    #[test]
    fn test_repository_name_uses_last_segment() {
        let config =
            RepoConfig::parse(b"[remote \"origin\"]\n\turl = git@github.com:org/deep/name.git\n");
        assert_eq!(config.repository_name, "name");
    }

    #[test]
    fn test_parse_github_token() {
        let raw = b"[github]\n\tuser = alice\n\ttoken = ghp_secret\n";
        let config = RepoConfig::parse(raw);
        let token = config.github_token.unwrap();
        assert_eq!(token.username, "alice");
        assert_eq!(token.token, "ghp_secret");
    }

    #[test]
    fn test_parse_skips_malformed_and_unknown() {
        let raw = b"[core]\n\tbare = false\nnot a key value line\n[user]\n\tname = B\n";
        let config = RepoConfig::parse(raw);
        assert_eq!(config.user.name, "B");
        assert!(config.remotes.is_empty());
    }
}
