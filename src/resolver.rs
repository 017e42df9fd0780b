//! Base branch discovery.
//!
//! Names the branch the current branch most plausibly diverged from by
//! trying a fixed chain of strategies and stopping at the first that
//! produces an answer:
//!
//! 1. the configured upstream (`@{upstream}`)
//! 2. common main-line names on the primary remote (`origin/main`, ...)
//! 3. the remote branch with the fewest commits between it and `HEAD`
//! 4. the primary remote's default branch pointer (`origin/HEAD`)
//!
//! A failing git query never aborts the chain; it only makes the current
//! strategy inapplicable.

use crate::backend::VcsBackend;
use crate::config::Config;
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// How a base branch was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryMethod {
    Upstream,
    CommonDefaultBranch,
    ClosestRemoteBranch,
    RemoteHead,
}

impl DiscoveryMethod {
    /// Strategies in the order they are attempted.
    pub const ORDER: [DiscoveryMethod; 4] = [
        DiscoveryMethod::Upstream,
        DiscoveryMethod::CommonDefaultBranch,
        DiscoveryMethod::ClosestRemoteBranch,
        DiscoveryMethod::RemoteHead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryMethod::Upstream => "upstream",
            DiscoveryMethod::CommonDefaultBranch => "common-default-branch",
            DiscoveryMethod::ClosestRemoteBranch => "closest-remote-branch",
            DiscoveryMethod::RemoteHead => "remote-head",
        }
    }
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved base branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseBranch {
    /// Remote-qualified branch name, e.g. `origin/main`.
    #[serde(rename = "branch")]
    pub name: String,
    pub method: DiscoveryMethod,
}

impl BaseBranch {
    fn new(name: impl Into<String>, method: DiscoveryMethod) -> Self {
        Self {
            name: name.into(),
            method,
        }
    }
}

/// Runs the strategy chain against a backend.
pub struct BaseBranchResolver<'a, B: VcsBackend + ?Sized> {
    backend: &'a B,
    config: &'a Config,
}

impl<'a, B: VcsBackend + ?Sized> BaseBranchResolver<'a, B> {
    pub fn new(backend: &'a B, config: &'a Config) -> Self {
        Self { backend, config }
    }

    /// Refresh remote-tracking refs. Failures are logged and ignored.
    pub fn refresh(&self) {
        debug!("fetching latest remote refs");
        if let Err(e) = self.backend.fetch() {
            debug!("  fetch failed, continuing with local refs: {}", e);
        }
    }

    /// Try every strategy in order; `None` when none applies.
    pub fn resolve(&self) -> Option<BaseBranch> {
        let found = DiscoveryMethod::ORDER
            .into_iter()
            .find_map(|method| self.try_strategy(method));

        match &found {
            Some(base) => debug!("result: {} (via {})", base.name, base.method),
            None => debug!("no strategy produced a base branch"),
        }
        found
    }

    /// Run a single strategy.
    pub fn try_strategy(&self, method: DiscoveryMethod) -> Option<BaseBranch> {
        let name = match method {
            DiscoveryMethod::Upstream => self.try_upstream(),
            DiscoveryMethod::CommonDefaultBranch => self.try_common_default_branches(),
            DiscoveryMethod::ClosestRemoteBranch => self.try_closest_remote_branch(),
            DiscoveryMethod::RemoteHead => self.try_remote_head(),
        }?;
        Some(BaseBranch::new(name, method))
    }

    fn try_upstream(&self) -> Option<String> {
        debug!("trying @{{upstream}}");
        let upstream = query("upstream", self.backend.upstream())?;
        debug!("  upstream is {}", upstream);

        let base = query("merge-base", self.backend.merge_base("HEAD", "@{upstream}"))?;
        debug!("  found merge-base {} with {}", short_sha(&base), upstream);
        Some(upstream)
    }

    fn try_common_default_branches(&self) -> Option<String> {
        debug!("trying common default branches");
        let remote = self.config.primary_remote();

        for name in &self.config.default_branches {
            let candidate = format!("{}/{}", remote, name);
            debug!("  checking {}", candidate);
            if !self.backend.ref_exists(&candidate) {
                debug!("  {} does not exist", candidate);
                continue;
            }
            if let Some(base) = query("merge-base", self.backend.merge_base("HEAD", &candidate)) {
                debug!("  found merge-base {} with {}", short_sha(&base), candidate);
                return Some(candidate);
            }
        }
        None
    }

    fn try_closest_remote_branch(&self) -> Option<String> {
        debug!("trying closest remote branch by commit distance");
        debug!("  preferred remotes: {:?}", self.config.preferred_remotes);

        let existing = query("remote list", self.backend.remotes()).unwrap_or_default();
        debug!("  existing remotes: {:?}", existing);

        let remotes: Vec<&str> = self
            .config
            .preferred_remotes
            .iter()
            .filter(|r| existing.contains(r))
            .map(String::as_str)
            .collect();
        if remotes.is_empty() {
            debug!("  no preferred remotes found");
            return None;
        }

        let current = query("current branch", self.backend.current_branch()).flatten();
        debug!("  current branch: {:?}", current);

        // Strictly-smaller comparison in remote-priority, then ref order keeps
        // the earliest candidate on ties.
        let mut best: Option<(u64, String)> = None;
        for remote in remotes {
            debug!("  checking remote: {}", remote);
            let branches = query("remote branches", self.backend.remote_branches(remote))
                .unwrap_or_default();
            if branches.is_empty() {
                debug!("    no branches for {}", remote);
                continue;
            }

            for remote_branch in branches {
                if self.should_skip(remote, &remote_branch, current.as_deref()) {
                    continue;
                }
                let Some((base, distance)) = self.branch_distance(&remote_branch) else {
                    continue;
                };
                debug!(
                    "    {}: merge-base {}, distance {}",
                    remote_branch,
                    short_sha(&base),
                    distance
                );
                if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                    best = Some((distance, remote_branch));
                }
            }
        }

        match best {
            Some((distance, branch)) => {
                debug!("  closest: {} with distance {}", branch, distance);
                Some(branch)
            }
            None => {
                debug!("  no suitable branch found in any preferred remote");
                None
            }
        }
    }

    fn try_remote_head(&self) -> Option<String> {
        let remote = self.config.primary_remote();
        let head = format!("{}/HEAD", remote);
        debug!("trying {}", head);

        let target = query(
            "remote HEAD",
            self.backend
                .symbolic_ref(&format!("refs/remotes/{}", head)),
        )?;
        let branch = target
            .strip_prefix("refs/remotes/")
            .unwrap_or(&target)
            .to_string();
        debug!("  {} points to {}", head, branch);

        let base = query("merge-base", self.backend.merge_base("HEAD", &head))?;
        debug!("  found merge-base {} with {}", short_sha(&base), branch);
        Some(branch)
    }

    /// Skip the current feature branch's own remote-tracking branch.
    ///
    /// A main-line branch still compares against its remote counterpart, which
    /// exposes unpushed commits.
    fn should_skip(&self, remote: &str, remote_branch: &str, current: Option<&str>) -> bool {
        let Some(current) = current else {
            return false;
        };
        if remote_branch != format!("{}/{}", remote, current) {
            return false;
        }
        if self.config.is_default_branch(current) {
            debug!("    including {} (tracking branch for default branch)", remote_branch);
            return false;
        }
        debug!("    skipping {} (tracking branch for feature branch)", remote_branch);
        true
    }

    fn branch_distance(&self, remote_branch: &str) -> Option<(String, u64)> {
        let base = query("merge-base", self.backend.merge_base("HEAD", remote_branch))?;
        let distance = query("rev-list count", self.backend.commit_count(&base, "HEAD"))?;
        Some((base, distance))
    }
}

/// Turn a failed query into "no data", leaving a trace at debug level.
fn query<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("  {} unavailable: {}", what, e);
            None
        }
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..12).unwrap_or(sha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBackend;

    fn resolve(backend: &FakeBackend) -> Option<BaseBranch> {
        let config = Config::default();
        BaseBranchResolver::new(backend, &config).resolve()
    }

    #[test]
    fn upstream_wins_over_closer_candidates() {
        let mut backend = FakeBackend::default()
            .with_remote_branch("origin/release", 10)
            .with_remote_branch("origin/main", 0);
        backend.upstream = Some("origin/release".to_string());

        let base = resolve(&backend).unwrap();
        assert_eq!(base, BaseBranch::new("origin/release", DiscoveryMethod::Upstream));
    }

    #[test]
    fn upstream_without_merge_base_falls_through() {
        let mut backend = FakeBackend::default().with_remote_branch("origin/main", 3);
        backend.upstream = Some("fork/unrelated".to_string());

        let base = resolve(&backend).unwrap();
        assert_eq!(base.method, DiscoveryMethod::CommonDefaultBranch);
        assert_eq!(base.name, "origin/main");
    }

    #[test]
    fn default_branch_names_are_probed_in_priority_order() {
        let backend = FakeBackend::default()
            .with_remote_branch("origin/dev", 1)
            .with_remote_branch("origin/master", 7);

        let base = resolve(&backend).unwrap();
        assert_eq!(
            base,
            BaseBranch::new("origin/master", DiscoveryMethod::CommonDefaultBranch)
        );
    }

    #[test]
    fn default_branches_only_checked_on_primary_remote() {
        let backend = FakeBackend::default()
            .with_remote_branch("upstream/main", 4)
            .with_remote_branch("upstream/topic", 2);

        let base = resolve(&backend).unwrap();
        assert_eq!(
            base,
            BaseBranch::new("upstream/topic", DiscoveryMethod::ClosestRemoteBranch)
        );
    }

    #[test]
    fn closest_branch_picks_minimum_distance() {
        let backend = FakeBackend::default()
            .with_remote_branch("origin/feature-a", 5)
            .with_remote_branch("origin/feature-b", 2)
            .with_remote_branch("origin/feature-c", 9);

        let base = resolve(&backend).unwrap();
        assert_eq!(
            base,
            BaseBranch::new("origin/feature-b", DiscoveryMethod::ClosestRemoteBranch)
        );
    }

    #[test]
    fn closest_branch_compares_across_remotes() {
        let backend = FakeBackend::default()
            .with_remote_branch("origin/feature-a", 6)
            .with_remote_branch("upstream/feature-b", 1);

        let base = resolve(&backend).unwrap();
        assert_eq!(base.name, "upstream/feature-b");
    }

    #[test]
    fn distance_ties_prefer_remote_priority_then_ref_order() {
        let backend = FakeBackend::default()
            .with_remote_branch("github/aaa", 3)
            .with_remote_branch("upstream/zzz", 3)
            .with_remote_branch("upstream/yyy", 3)
            .with_remote_branch("origin/late", 4);

        let base = resolve(&backend).unwrap();
        assert_eq!(base.name, "upstream/zzz");
    }

    #[test]
    fn remotes_outside_preference_list_are_ignored() {
        let backend = FakeBackend::default()
            .with_remote_branch("personal/topic", 0)
            .with_remote_branch("origin/topic", 8);

        let base = resolve(&backend).unwrap();
        assert_eq!(base.name, "origin/topic");
    }

    #[test]
    fn feature_tracking_branch_is_skipped() {
        let mut backend = FakeBackend::default()
            .with_remote_branch("origin/my-feature", 0)
            .with_remote_branch("origin/parent", 3);
        backend.current_branch = Some("my-feature".to_string());

        let base = resolve(&backend).unwrap();
        assert_eq!(base.name, "origin/parent");
    }

    #[test]
    fn default_branch_tracking_branch_is_still_considered() {
        let config = Config {
            default_branches: vec!["trunk".to_string()],
            ..Config::default()
        };
        let mut backend = FakeBackend::default()
            .with_remote_branch("origin/trunk", 2)
            .with_remote_branch("origin/other", 4);
        backend.current_branch = Some("trunk".to_string());
        // Make the name-based strategy inapplicable so the distance scan runs.
        backend.existing_refs.clear();

        let base = BaseBranchResolver::new(&backend, &config)
            .resolve()
            .unwrap();
        assert_eq!(
            base,
            BaseBranch::new("origin/trunk", DiscoveryMethod::ClosestRemoteBranch)
        );
    }

    #[test]
    fn branches_without_merge_base_are_skipped() {
        let mut backend = FakeBackend::default()
            .with_remote_branch("origin/orphan", 0)
            .with_remote_branch("origin/topic", 5);
        backend.merge_bases.remove("origin/orphan");

        let base = resolve(&backend).unwrap();
        assert_eq!(base.name, "origin/topic");
    }

    #[test]
    fn remote_head_is_last_resort() {
        let mut backend = FakeBackend {
            remotes: vec!["origin".to_string()],
            ..FakeBackend::default()
        };
        backend.symbolic_refs.insert(
            "refs/remotes/origin/HEAD".to_string(),
            "refs/remotes/origin/trunk".to_string(),
        );
        backend
            .merge_bases
            .insert("origin/HEAD".to_string(), "abc123".to_string());

        let base = resolve(&backend).unwrap();
        assert_eq!(base, BaseBranch::new("origin/trunk", DiscoveryMethod::RemoteHead));
    }

    #[test]
    fn remote_head_without_merge_base_fails() {
        let mut backend = FakeBackend::default();
        backend.symbolic_refs.insert(
            "refs/remotes/origin/HEAD".to_string(),
            "refs/remotes/origin/trunk".to_string(),
        );

        assert_eq!(resolve(&backend), None);
    }

    #[test]
    fn nothing_applicable_returns_none() {
        assert_eq!(resolve(&FakeBackend::default()), None);
    }

    #[test]
    fn refresh_ignores_fetch_failure() {
        let backend = FakeBackend {
            fail_fetch: true,
            ..FakeBackend::default()
        };
        let config = Config::default();
        let resolver = BaseBranchResolver::new(&backend, &config);

        resolver.refresh();
        assert!(backend.fetched.get());
    }

    #[test]
    fn method_serializes_as_kebab_case() {
        let base = BaseBranch::new("origin/main", DiscoveryMethod::CommonDefaultBranch);
        let json = serde_json::to_string(&base).unwrap();
        assert_eq!(
            json,
            r#"{"branch":"origin/main","method":"common-default-branch"}"#
        );
    }
}
