//! Startup update advisory.
//!
//! Compares the compiled-in version tag with the latest published one and
//! posts exactly one notice. It runs as a supervised background task, so a
//! slow or unreachable server never delays the prompt.

use std::{cmp::Ordering, future::Future, time::Duration};

use wayfarer_app::{LogLine, RuntimeHandle};

use crate::AdvisoryError;

/// Where the latest published version tag is read from.
pub const DEFAULT_VERSION_URL: &str =
    "https://raw.githubusercontent.com/wayfarer-rs/wayfarer/main/VERSION";

/// Upper bound on the version request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of the latest published version tag.
pub trait VersionSource {
    /// Fetch the latest version tag.
    fn latest(&self) -> impl Future<Output = Result<String, AdvisoryError>> + Send;
}

/// Reads the version tag from a plain-text HTTP resource.
#[derive(Debug, Clone)]
pub struct HttpVersionSource {
    client: reqwest::Client,
    url: String,
}

impl HttpVersionSource {
    /// Create a source for `url` whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AdvisoryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }
}

impl VersionSource for HttpVersionSource {
    async fn latest(&self) -> Result<String, AdvisoryError> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(body.trim().to_string())
    }
}

/// Release channel of a version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// `-rc` suffix.
    ReleaseCandidate,
    /// Any other pre-release suffix.
    PreRelease,
    /// Plain `major.minor.patch`.
    Stable,
}

impl Channel {
    /// Classify a version tag.
    pub fn of(tag: &str) -> Self {
        if tag.contains("-rc") {
            Self::ReleaseCandidate
        } else if tag.contains('-') {
            Self::PreRelease
        } else {
            Self::Stable
        }
    }
}

/// Numeric components of a tag, ignoring a leading `v` and any suffix.
fn components(tag: &str) -> Result<Vec<u64>, AdvisoryError> {
    let trimmed = tag.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let core = trimmed.split(['-', '+']).next().unwrap_or(trimmed);

    core.split('.')
        .map(|part| part.parse::<u64>().map_err(|_| AdvisoryError::Malformed(tag.to_string())))
        .collect()
}

/// Compare two tags numerically. Missing components count as zero.
pub fn compare_versions(local: &str, remote: &str) -> Result<Ordering, AdvisoryError> {
    let (local, remote) = (components(local)?, components(remote)?);
    let width = local.len().max(remote.len());

    let ordering = (0..width)
        .map(|i| {
            let a = local.get(i).copied().unwrap_or(0);
            let b = remote.get(i).copied().unwrap_or(0);
            a.cmp(&b)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal);
    Ok(ordering)
}

/// Build the advisory line for the running version.
///
/// Release candidates and pre-releases are reported without a fetch.
pub async fn advise<S: VersionSource>(source: &S, local: &str) -> LogLine {
    match Channel::of(local) {
        Channel::ReleaseCandidate => {
            return LogLine::info(format!("Running release candidate {local}"));
        },
        Channel::PreRelease => return LogLine::info(format!("Running pre-release {local}")),
        Channel::Stable => {},
    }

    let outcome = match source.latest().await {
        Ok(latest) => compare_versions(local, &latest).map(|ordering| (ordering, latest)),
        Err(e) => Err(e),
    };
    match outcome {
        Ok((Ordering::Less, latest)) => {
            LogLine::warning(format!("Wayfarer {latest} is available (running {local})"))
        },
        Ok(_) => LogLine::success(format!("Wayfarer {local} is up to date")),
        Err(e) => LogLine::warning(format!("Could not check for updates: {e}")),
    }
}

/// Post the advisory for `local` to the runtime.
pub async fn run<S: VersionSource + Sync>(source: S, local: String, handle: RuntimeHandle) {
    let line = advise(&source, &local).await;
    tracing::debug!(%line, "update advisory");
    handle.notify(line);
}

#[cfg(test)]
mod tests {
    use wayfarer_app::Severity;

    use super::*;

    struct Fixed(Option<&'static str>);

    impl VersionSource for Fixed {
        async fn latest(&self) -> Result<String, AdvisoryError> {
            self.0.map(str::to_string).ok_or_else(|| AdvisoryError::Malformed("<html>".into()))
        }
    }

    #[test]
    fn channels() {
        assert_eq!(Channel::of("1.4.0-rc.2"), Channel::ReleaseCandidate);
        assert_eq!(Channel::of("1.4.0-beta"), Channel::PreRelease);
        assert_eq!(Channel::of("1.4.0"), Channel::Stable);
    }

    #[test]
    fn versions_compare_numerically() {
        assert!(matches!(compare_versions("0.9.0", "0.10.0"), Ok(Ordering::Less)));
        assert!(matches!(compare_versions("v1.2", "1.2.0"), Ok(Ordering::Equal)));
        assert!(matches!(compare_versions("2.0.0", "1.9.9"), Ok(Ordering::Greater)));
        assert!(matches!(compare_versions("1.0.0", "latest"), Err(AdvisoryError::Malformed(_))));
    }

    #[tokio::test]
    async fn newer_remote_is_a_warning() {
        let line = advise(&Fixed(Some("0.2.0")), "0.1.0").await;

        insta::assert_snapshot!(
            line.to_string(),
            @"[warning] Wayfarer 0.2.0 is available (running 0.1.0)"
        );
    }

    #[tokio::test]
    async fn same_or_older_remote_is_current() {
        let line = advise(&Fixed(Some("0.1.0")), "0.1.0").await;
        assert_eq!(line, LogLine::success("Wayfarer 0.1.0 is up to date"));

        let line = advise(&Fixed(Some("0.0.9")), "0.1.0").await;
        assert_eq!(line.severity, Severity::Success);
    }

    #[tokio::test]
    async fn fetch_failure_is_one_warning() {
        let line = advise(&Fixed(None), "0.1.0").await;

        let expected = "Could not check for updates: unrecognised version '<html>'";
        assert_eq!(line, LogLine::warning(expected));
    }

    #[tokio::test]
    async fn prerelease_skips_the_comparison() {
        let line = advise(&Fixed(None), "0.2.0-rc.1").await;
        assert_eq!(line, LogLine::info("Running release candidate 0.2.0-rc.1"));

        let line = advise(&Fixed(None), "0.2.0-alpha").await;
        assert_eq!(line, LogLine::info("Running pre-release 0.2.0-alpha"));
    }
}
