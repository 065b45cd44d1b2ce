//! Shared domain types.
//!
//! The allocation stages keep `ClassifiedStudent` values immutable once integrator
//! detection is done. Everything a stage changes afterwards (assigned role,
//! preference level, group membership) is stored in index-based tables keyed by
//! the student's position in the input.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alloc::AllocError;

/// Students whose top two scores differ by at most this much are integrators.
pub const DEFAULT_TIE_THRESHOLD: f64 = 2.0;

/// Legacy per-role quota (one member of each role for six groups).
pub const DEFAULT_TARGET_PER_ROLE: usize = 6;

/// Rows whose best role score is below this are flagged during ingest.
pub const DEFAULT_MIN_SCORE: f64 = 9.0;

pub const DEFAULT_MIN_GROUP_SIZE: usize = 3;
pub const DEFAULT_MAX_GROUP_SIZE: usize = 6;
pub const DEFAULT_IDEAL_GROUP_SIZE: usize = 4;

/// One of the four cognitive-style roles.
///
/// The declaration order is the fixed precedence order used to break score
/// ties, to process roles during balancing and assembly, and to order reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Clarifier,
    Ideator,
    Developer,
    Implementer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Clarifier, Role::Ideator, Role::Developer, Role::Implementer];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::Clarifier => "Clarifier",
            Role::Ideator => "Ideator",
            Role::Developer => "Developer",
            Role::Implementer => "Implementer",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Role::Clarifier => "Clarifiers",
            Role::Ideator => "Ideators",
            Role::Developer => "Developers",
            Role::Implementer => "Implementers",
        }
    }

    /// Lowercase fragments that identify this role's score column in a header.
    ///
    /// Spreadsheets exported from the Spanish edition of the questionnaire use the
    /// Spanish role names, so both spellings are accepted.
    pub fn header_aliases(self) -> &'static [&'static str] {
        match self {
            Role::Clarifier => &["clarificador", "clarifier"],
            Role::Ideator => &["ideador", "ideator"],
            Role::Developer => &["desarrollador", "developer"],
            Role::Implementer => &["implementador", "implementer"],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A value per role, addressable by `Role`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleMap<T> {
    slots: [T; 4],
}

impl<T> RoleMap<T> {
    pub fn from_fn(mut f: impl FnMut(Role) -> T) -> Self {
        Self {
            slots: std::array::from_fn(|i| f(Role::ALL[i])),
        }
    }

    /// Iterate in `Role::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &T)> {
        Role::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T> Index<Role> for RoleMap<T> {
    type Output = T;

    fn index(&self, role: Role) -> &T {
        &self.slots[role.index()]
    }
}

impl<T> IndexMut<Role> for RoleMap<T> {
    fn index_mut(&mut self, role: Role) -> &mut T {
        &mut self.slots[role.index()]
    }
}

/// Exactly one score per role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleScores {
    pub clarifier: f64,
    pub ideator: f64,
    pub developer: f64,
    pub implementer: f64,
}

impl RoleScores {
    pub fn new(clarifier: f64, ideator: f64, developer: f64, implementer: f64) -> Self {
        Self {
            clarifier,
            ideator,
            developer,
            implementer,
        }
    }

    pub fn get(&self, role: Role) -> f64 {
        match role {
            Role::Clarifier => self.clarifier,
            Role::Ideator => self.ideator,
            Role::Developer => self.developer,
            Role::Implementer => self.implementer,
        }
    }

    /// `(role, score)` pairs in `Role::ALL` order.
    pub fn pairs(&self) -> [(Role, f64); 4] {
        Role::ALL.map(|role| (role, self.get(role)))
    }

    pub fn max(&self) -> f64 {
        self.pairs().iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max)
    }
}

/// A validated input row: a name plus one finite score per role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub scores: RoleScores,
}

impl ScoreRecord {
    pub fn new(name: impl Into<String>, scores: RoleScores) -> Self {
        Self {
            name: name.into(),
            scores,
        }
    }
}

/// How far down a student's own ranking their assigned role sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceLevel {
    Primary,
    Secondary,
    /// Never assigned by the current balancer; kept so saved rosters and
    /// reports have a label for it.
    Tertiary,
}

impl PreferenceLevel {
    pub fn rank(self) -> u8 {
        match self {
            PreferenceLevel::Primary => 1,
            PreferenceLevel::Secondary => 2,
            PreferenceLevel::Tertiary => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PreferenceLevel::Primary => "1st choice",
            PreferenceLevel::Secondary => "2nd choice",
            PreferenceLevel::Tertiary => "3rd choice",
        }
    }
}

/// A score record enriched with its role ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedStudent {
    pub record: ScoreRecord,
    /// Roles ranked by score, descending; equal scores keep `Role::ALL` order.
    pub ranking: [Role; 4],
    /// Primary score minus secondary score (never negative).
    pub delta: f64,
    pub is_integrator: bool,
}

impl ClassifiedStudent {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn scores(&self) -> &RoleScores {
        &self.record.scores
    }

    pub fn primary(&self) -> Role {
        self.ranking[0]
    }

    pub fn secondary(&self) -> Role {
        self.ranking[1]
    }

    pub fn tertiary(&self) -> Role {
        self.ranking[2]
    }
}

/// Where the balancer put a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub role: Role,
    pub level: PreferenceLevel,
}

impl Placement {
    pub fn primary(student: &ClassifiedStudent) -> Self {
        Self {
            role: student.primary(),
            level: PreferenceLevel::Primary,
        }
    }
}

/// Borrowed view of a student together with their placement.
#[derive(Debug, Clone, Copy)]
pub struct AssignedStudent<'a> {
    pub student: &'a ClassifiedStudent,
    pub placement: Placement,
}

/// A group of students; members are indices into `Allocation::students`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: usize,
    pub target_size: usize,
    pub members: Vec<usize>,
}

/// Group count and per-group target sizes (larger groups first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPlan {
    pub sizes: Vec<usize>,
}

impl GroupPlan {
    /// Everyone in a single group.
    pub fn single(n: usize) -> Self {
        Self { sizes: vec![n] }
    }

    pub fn num_groups(&self) -> usize {
        self.sizes.len()
    }

    pub fn total(&self) -> usize {
        self.sizes.iter().sum()
    }
}

/// Bounds used by the group size optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingConfig {
    pub min_size: usize,
    pub max_size: usize,
    pub ideal_size: usize,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_GROUP_SIZE,
            max_size: DEFAULT_MAX_GROUP_SIZE,
            ideal_size: DEFAULT_IDEAL_GROUP_SIZE,
        }
    }
}

/// How the per-role quota handed to the balancer is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuotaPolicy {
    /// A fixed number of students per role.
    Fixed(usize),
    /// One student of each role per planned group.
    PerGroup,
}

impl QuotaPolicy {
    pub fn resolve(self, num_groups: usize) -> usize {
        match self {
            QuotaPolicy::Fixed(n) => n,
            QuotaPolicy::PerGroup => num_groups,
        }
    }

    /// Flip between the fixed default and the per-group policy.
    pub fn toggled(self) -> Self {
        match self {
            QuotaPolicy::Fixed(_) => QuotaPolicy::PerGroup,
            QuotaPolicy::PerGroup => QuotaPolicy::Fixed(DEFAULT_TARGET_PER_ROLE),
        }
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        QuotaPolicy::Fixed(DEFAULT_TARGET_PER_ROLE)
    }
}

impl fmt::Display for QuotaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaPolicy::Fixed(n) => write!(f, "{n}"),
            QuotaPolicy::PerGroup => f.write_str("groups"),
        }
    }
}

impl FromStr for QuotaPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("groups") || s.eq_ignore_ascii_case("per-group") {
            return Ok(QuotaPolicy::PerGroup);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(QuotaPolicy::Fixed(n)),
            _ => Err(format!("invalid quota '{s}': expected a positive integer or `groups`")),
        }
    }
}

/// Settings for the allocation pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocConfig {
    pub tie_threshold: f64,
    pub quota: QuotaPolicy,
    pub sizing: SizingConfig,
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self {
            tie_threshold: DEFAULT_TIE_THRESHOLD,
            quota: QuotaPolicy::default(),
            sizing: SizingConfig::default(),
        }
    }
}

impl AllocConfig {
    pub fn validate(&self) -> Result<(), AllocError> {
        if !(self.tie_threshold.is_finite() && self.tie_threshold >= 0.0) {
            return Err(AllocError::InvalidConfig(format!(
                "tie threshold must be finite and >= 0 (got {})",
                self.tie_threshold
            )));
        }
        if self.quota == QuotaPolicy::Fixed(0) {
            return Err(AllocError::InvalidConfig("quota must be > 0".to_string()));
        }
        let s = self.sizing;
        if s.min_size == 0 {
            return Err(AllocError::InvalidConfig("minimum group size must be > 0".to_string()));
        }
        if !(s.min_size <= s.ideal_size && s.ideal_size <= s.max_size) {
            return Err(AllocError::InvalidConfig(format!(
                "group sizes must satisfy min <= ideal <= max (got min={}, ideal={}, max={})",
                s.min_size, s.ideal_size, s.max_size
            )));
        }
        Ok(())
    }
}

/// Where and how to read the score table.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub csv_path: PathBuf,
    pub min_score: f64,
}

/// A full `fsg assign` / `fsg tui` run as understood by the app layer.
///
/// This is derived from CLI flags (plus env/.env defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub ingest: IngestConfig,
    pub alloc: AllocConfig,
    /// Accept ignored rows without prompting.
    pub assume_yes: bool,
    pub export_csv: Option<PathBuf>,
    pub export_roster: Option<PathBuf>,
}

/// Complete result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub students: Vec<ClassifiedStudent>,
    /// Indexed like `students`.
    pub placements: Vec<Placement>,
    pub groups: Vec<Group>,
    /// Indices of integrators, in input order.
    pub integrators: Vec<usize>,
    pub plan: GroupPlan,
    /// Resolved per-role quota used by the balancer.
    pub quota: usize,
    pub tie_threshold: f64,
    /// Students moved to their secondary role by overflow.
    pub overflowed: Vec<usize>,
    /// Integrators pulled into an under-quota role.
    pub filled: Vec<usize>,
    /// Roles left below quota after the fill step, with their final count.
    pub shortfalls: Vec<(Role, usize)>,
}

impl Allocation {
    pub fn assigned(&self, idx: usize) -> AssignedStudent<'_> {
        AssignedStudent {
            student: &self.students[idx],
            placement: self.placements[idx],
        }
    }

    pub fn members<'a>(&'a self, group: &'a Group) -> impl Iterator<Item = AssignedStudent<'a>> + 'a {
        group.members.iter().map(move |&idx| self.assigned(idx))
    }

    pub fn integrator_views(&self) -> impl Iterator<Item = AssignedStudent<'_>> + '_ {
        self.integrators.iter().map(move |&idx| self.assigned(idx))
    }

    /// Assigned-role counts across all groups.
    pub fn role_counts(&self) -> RoleMap<usize> {
        let mut counts = RoleMap::default();
        for group in &self.groups {
            for member in self.members(group) {
                counts[member.placement.role] += 1;
            }
        }
        counts
    }

    pub fn group_cards(&self) -> Vec<GroupCard> {
        self.groups
            .iter()
            .map(|group| GroupCard {
                id: group.id,
                target_size: group.target_size,
                members: self.members(group).map(MemberCard::from).collect(),
            })
            .collect()
    }

    pub fn integrator_cards(&self) -> Vec<MemberCard> {
        self.integrator_views().map(MemberCard::from).collect()
    }
}

/// Presentation-ready member details (also the roster JSON schema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberCard {
    pub name: String,
    pub assigned_role: Role,
    pub preference_level: PreferenceLevel,
    pub primary: Role,
    pub secondary: Role,
    pub tertiary: Role,
    pub delta: f64,
    pub is_integrator: bool,
    pub scores: RoleScores,
}

impl From<AssignedStudent<'_>> for MemberCard {
    fn from(value: AssignedStudent<'_>) -> Self {
        let s = value.student;
        Self {
            name: s.name().to_string(),
            assigned_role: value.placement.role,
            preference_level: value.placement.level,
            primary: s.primary(),
            secondary: s.secondary(),
            tertiary: s.tertiary(),
            delta: s.delta,
            is_integrator: s.is_integrator,
            scores: *s.scores(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCard {
    pub id: usize,
    pub target_size: usize,
    pub members: Vec<MemberCard>,
}

/// Per-role member counts over a set of group cards.
pub fn card_role_counts(groups: &[GroupCard]) -> RoleMap<usize> {
    let mut counts = RoleMap::default();
    for member in groups.iter().flat_map(|g| g.members.iter()) {
        counts[member.assigned_role] += 1;
    }
    counts
}

/// A saved roster file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: Option<String>,
    pub quota: usize,
    pub tie_threshold: f64,
    pub plan: GroupPlan,
    pub groups: Vec<GroupCard>,
    pub integrators: Vec<MemberCard>,
}
