//! Dependency resolver using backtracking search.
//!
//! Given a target release and an index of known releases, the resolver looks for
//! one release per package name such that every dependency reachable from the
//! target is satisfied.
//!
//! Decisions are made in queue order, always trying the highest matching version
//! first. When a choice leads to a dead end the search backtracks to the most recent
//! decision and tries its next candidate. Requirements whose candidates were all
//! exhausted are counted as problematic and moved to the front of the queue on
//! later attempts, so the search fails fast on constraints that are known to be hard.
//! A requirement is identified by its package name together with its constraint.
//!
//! ```
//! # use relaxed_semver::{BasicDependency, BasicRelease, Resolver, constraint, version};
//! let release = |name: &str, version: &str, dependencies: Vec<BasicDependency>| {
//!     BasicRelease::builder()
//!         .name(name)
//!         .version(version!(version))
//!         .dependencies(dependencies)
//!         .build()
//! };
//!
//! let app = release("app", "1.0.0", vec![BasicDependency::new("lib", constraint!("^1.2"))]);
//! let mut resolver = Resolver::new();
//! resolver.add_release(app.clone());
//! resolver.add_release(release("lib", "1.2.0", vec![]));
//! resolver.add_release(release("lib", "1.4.1", vec![]));
//! resolver.add_release(release("lib", "2.0.0", vec![]));
//!
//! let solution = resolver.resolve(&app).expect("must resolve");
//! let chosen = solution.iter().map(ToString::to_string).collect::<Vec<_>>();
//! assert_eq!(chosen, vec!["app@1.0.0", "lib@1.4.1"]);
//! ```

use std::{
    cmp::Reverse,
    collections::{HashMap, VecDeque},
};

use bon::Builder;
use derive_more::Display;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Constraint, Version};

/// A requirement on another package.
pub trait Dependency {
    /// The name of the required package.
    fn name(&self) -> &str;

    /// The versions of the package that satisfy the requirement.
    fn constraint(&self) -> &Constraint;
}

/// A specific version of a package.
pub trait Release {
    /// The type describing this release's requirements.
    type Dependency: Dependency;

    /// The package name.
    fn name(&self) -> &str;

    /// The version of the package.
    fn version(&self) -> &Version;

    /// The packages this release requires.
    fn dependencies(&self) -> &[Self::Dependency];
}

/// A ready made [`Dependency`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize, new)]
#[display("{name}{constraint}")]
pub struct BasicDependency {
    /// The name of the required package.
    #[new(into)]
    pub name: String,

    /// The versions of the package that satisfy the requirement.
    #[serde(default = "always")]
    pub constraint: Constraint,
}

fn always() -> Constraint {
    Constraint::True
}

impl Dependency for BasicDependency {
    fn name(&self) -> &str {
        &self.name
    }

    fn constraint(&self) -> &Constraint {
        &self.constraint
    }
}

/// A ready made [`Release`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize, Builder)]
#[display("{name}@{version}")]
pub struct BasicRelease {
    /// The package name.
    #[builder(into)]
    pub name: String,

    /// The version of the package.
    pub version: Version,

    /// The packages this release requires.
    #[builder(default)]
    #[serde(default)]
    pub dependencies: Vec<BasicDependency>,
}

impl Release for BasicRelease {
    type Dependency = BasicDependency;

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &Version {
        &self.version
    }

    fn dependencies(&self) -> &[BasicDependency] {
        &self.dependencies
    }
}

/// An index of known releases, grouped by package name.
#[derive(Debug, Clone)]
pub struct Resolver<R> {
    releases: HashMap<String, Vec<R>>,
}

impl<R> Default for Resolver<R> {
    fn default() -> Self {
        Self {
            releases: HashMap::new(),
        }
    }
}

impl<R: Release> Resolver<R> {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a release to the index.
    pub fn add_release(&mut self, release: R) {
        self.releases
            .entry(release.name().to_string())
            .or_default()
            .push(release);
    }

    /// Add many releases to the index.
    pub fn add_releases(&mut self, releases: impl IntoIterator<Item = R>) {
        for release in releases {
            self.add_release(release);
        }
    }

    /// The known releases for a package, in the order they were added.
    pub fn releases(&self, name: &str) -> &[R] {
        self.releases
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether a release of the package with an equal version is known.
    pub fn contains(&self, name: &str, version: &Version) -> bool {
        self.releases(name).iter().any(|r| r.version() == version)
    }

    /// Find a release for every package reachable from the target.
    ///
    /// The target itself must be in the index.
    /// Returns the target followed by the chosen releases in the order they were decided,
    /// or `None` if no consistent set of releases exists.
    #[tracing::instrument(skip_all, fields(package = target.name(), version = %target.version()))]
    pub fn resolve(&self, target: &R) -> Option<Vec<R>>
    where
        R: Clone,
    {
        if !self.contains(target.name(), target.version()) {
            debug!("target release is not in the index");
            return None;
        }

        let mut search = Search::new(&self.releases, target);
        if search.run() {
            let solution = search.solution().cloned().collect::<Vec<_>>();
            debug!(releases = solution.len(), "resolved");
            Some(solution)
        } else {
            debug!("no solution");
            None
        }
    }
}

impl<R: Release> Extend<R> for Resolver<R> {
    fn extend<T: IntoIterator<Item = R>>(&mut self, iter: T) {
        self.add_releases(iter);
    }
}

impl<R: Release> FromIterator<R> for Resolver<R> {
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        let mut resolver = Self::new();
        resolver.add_releases(iter);
        resolver
    }
}

/// What happened when draining the pending queue.
enum Step {
    /// Every dependency is satisfied.
    Solved,

    /// A new decision was pushed and needs its first candidate.
    Branch,

    /// A dependency conflicts with a release chosen earlier.
    Conflict,
}

/// A decision point: which release to choose for a package.
struct Frame<'a, R: Release> {
    name: &'a str,
    constraint: &'a Constraint,

    /// Matching releases not yet tried, highest version first.
    candidates: std::vec::IntoIter<&'a R>,

    chosen: Option<&'a R>,

    /// The queue as it was when this decision was made, minus the dependency being decided.
    rest: VecDeque<&'a R::Dependency>,
}

/// The state of a single resolution run.
struct Search<'a, R: Release> {
    index: &'a HashMap<String, Vec<R>>,
    target: &'a R,
    chosen: HashMap<&'a str, &'a R>,
    pending: VecDeque<&'a R::Dependency>,
    frames: Vec<Frame<'a, R>>,

    /// How often each requirement exhausted its candidates, keyed by package name and constraint.
    problematic: HashMap<(&'a str, &'a Constraint), usize>,
}

impl<'a, R: Release> Search<'a, R> {
    fn new(index: &'a HashMap<String, Vec<R>>, target: &'a R) -> Self {
        Self {
            index,
            target,
            chosen: HashMap::from([(target.name(), target)]),
            pending: target.dependencies().iter().collect(),
            frames: Vec::new(),
            problematic: HashMap::new(),
        }
    }

    fn run(&mut self) -> bool {
        loop {
            match self.advance() {
                Step::Solved => return true,
                Step::Branch | Step::Conflict => {
                    if !self.next_candidate() {
                        return false;
                    }
                }
            }
        }
    }

    /// The target followed by every release chosen so far.
    fn solution(&self) -> impl Iterator<Item = &'a R> {
        std::iter::once(self.target).chain(self.frames.iter().filter_map(|frame| frame.chosen))
    }

    /// Pop dependencies until one needs a decision, conflicts, or the queue is empty.
    fn advance(&mut self) -> Step {
        while let Some(dependency) = self.pending.pop_front() {
            let name = dependency.name();
            let constraint = dependency.constraint();
            let depth = self.frames.len();

            if let Some(existing) = self.chosen.get(name) {
                let version = existing.version();
                if constraint.matches(version) {
                    trace!(package = name, %version, %constraint, depth, "already satisfied");
                    continue;
                }
                debug!(package = name, %version, %constraint, depth, "conflicts with chosen release");
                return Step::Conflict;
            }

            let candidates = self.candidates(name, constraint);
            trace!(package = name, %constraint, depth, candidates = candidates.len(), "deciding");
            self.frames.push(Frame {
                name,
                constraint,
                candidates: candidates.into_iter(),
                chosen: None,
                rest: std::mem::take(&mut self.pending),
            });
            return Step::Branch;
        }
        Step::Solved
    }

    /// Releases of the package matching the constraint, highest version first.
    fn candidates(&self, name: &str, constraint: &Constraint) -> Vec<&'a R> {
        let index = self.index;
        let mut candidates = index
            .get(name)
            .into_iter()
            .flatten()
            .filter(|release| constraint.matches(release.version()))
            .collect::<Vec<_>>();
        candidates.sort_by(|a, b| b.version().cmp(a.version()));
        candidates
    }

    /// Move the most recent decision on to its next viable candidate,
    /// unwinding exhausted decisions.
    ///
    /// Returns `false` once every decision is exhausted.
    fn next_candidate(&mut self) -> bool {
        loop {
            let depth = self.frames.len();
            let index = self.index;
            let Some(frame) = self.frames.last_mut() else {
                return false;
            };

            let name = frame.name;
            let constraint = frame.constraint;
            if let Some(previous) = frame.chosen.take() {
                self.chosen.remove(name);
                trace!(package = name, version = %previous.version(), depth, "undoing choice");
            }

            let next = frame.candidates.find(|candidate| {
                let missing = missing_dependency(index, *candidate);
                if let Some(missing) = missing {
                    trace!(package = name, version = %candidate.version(), missing, "skipping release with unknown dependency");
                }
                missing.is_none()
            });

            let Some(candidate) = next else {
                let failures = self.problematic.entry((name, constraint)).or_default();
                *failures += 1;
                debug!(package = name, %constraint, depth, failures = *failures, "no candidate left, backtracking");
                self.frames.pop();
                continue;
            };

            debug!(package = name, version = %candidate.version(), depth, "trying");
            frame.chosen = Some(candidate);
            self.chosen.insert(name, candidate);

            let mut pending = frame.rest.clone();
            pending.extend(candidate.dependencies());
            let problematic = &self.problematic;
            pending.make_contiguous().sort_by_cached_key(|dependency| {
                let dependency: &'a R::Dependency = *dependency;
                let key = (dependency.name(), dependency.constraint());
                Reverse(problematic.get(&key).copied().unwrap_or(0))
            });
            self.pending = pending;
            return true;
        }
    }
}

/// The first dependency of the release naming a package absent from the index.
fn missing_dependency<'r, R: Release>(
    index: &HashMap<String, Vec<R>>,
    release: &'r R,
) -> Option<&'r str> {
    release
        .dependencies()
        .iter()
        .map(|dependency| dependency.name())
        .find(|name| !index.contains_key(*name))
}
