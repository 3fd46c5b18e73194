//! Curriculum configuration and the derived month timeline.
//!
//! The module list, durations, and exclusion set are immutable, process-wide
//! configuration. They are injected at construction rather than read from
//! ambient globals so tests can run against alternate curricula.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// One curriculum module: a unique name plus an optional expected duration.
///
/// A `None` duration means the module has no place on the pacing timeline
/// (e.g. a parallel specialization track); it still appears in raw
/// completion counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDefinition {
    /// Unique module name, the snapshot score key
    pub name: String,

    /// Expected duration in months; `None` excludes the module from pacing
    pub duration_months: Option<f64>,
}

impl ModuleDefinition {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, duration_months: Option<f64>) -> Self {
        Self {
            name: name.into(),
            duration_months,
        }
    }
}

/// Immutable curriculum configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumConfig {
    /// Modules in curriculum order; position is the ordinal
    pub modules: Vec<ModuleDefinition>,

    /// Modules excluded from leaderboard counting (no gradable tasks)
    pub excluded: BTreeSet<String>,
}

impl CurriculumConfig {
    /// The standard program: the full module list with durations for the
    /// sequential core track. Specialization tracks run in parallel and
    /// carry no duration. Onboarding is reading-only and excluded from
    /// leaderboard counting.
    pub fn standard_program() -> Self {
        let modules = vec![
            ModuleDefinition::new("Onboarding", None),
            ModuleDefinition::new("Preseason Web", Some(2.0)),
            ModuleDefinition::new("Preseason Data", Some(2.0)),
            ModuleDefinition::new("Season 01 Arc 01", Some(3.0)),
            ModuleDefinition::new("Season 01 Arc 02", Some(3.0)),
            ModuleDefinition::new("Season 01 Cloud Devops", Some(2.0)),
            ModuleDefinition::new("Season 02 Fullstack", Some(4.0)),
            ModuleDefinition::new("Season 02 Data Science", None),
            ModuleDefinition::new("Season 02 Software Engineer", None),
            ModuleDefinition::new("Season 03 Fullstack Java", None),
            ModuleDefinition::new("Season 03 Fullstack Python", None),
            ModuleDefinition::new("Season 03 Frontend", None),
            ModuleDefinition::new("Season 03 Backend", None),
            ModuleDefinition::new("Season 03 Cloud Engineer", None),
            ModuleDefinition::new("Season 03 Software Engineer Golang", None),
            ModuleDefinition::new("Season 03 Software Engineer CPP", None),
            ModuleDefinition::new("Season 03 Software Engineer Rust", None),
            ModuleDefinition::new("Season 03 Machine Learning", None),
            ModuleDefinition::new("Season 03 Data Science", None),
            ModuleDefinition::new("Season 03 Agentic AI", None),
            ModuleDefinition::new("Season 04 Masters", None),
        ];
        let excluded = ["Onboarding".to_string()].into_iter().collect();
        Self { modules, excluded }
    }
}

/// One entry of the pacing timeline: a duration-bearing module laid out
/// back-to-back from month 0 in curriculum order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSegment {
    /// Module name
    pub module: String,

    /// Expected duration in months
    pub duration_months: f64,

    /// Running total of all prior segments' durations
    pub start_month: f64,

    /// `start_month + duration_months`
    pub end_month: f64,
}

/// The curriculum plus everything derived from it.
///
/// Construction precomputes the timeline; all accessors are pure and
/// deterministic.
#[derive(Debug, Clone)]
pub struct Curriculum {
    config: CurriculumConfig,
    durations: HashMap<String, f64>,
    timeline: Vec<TimelineSegment>,
}

impl Curriculum {
    /// Build a curriculum from its configuration.
    pub fn new(config: CurriculumConfig) -> Self {
        let durations: HashMap<String, f64> = config
            .modules
            .iter()
            .filter_map(|m| m.duration_months.map(|d| (m.name.clone(), d)))
            .collect();

        let mut timeline = Vec::new();
        let mut current_month = 0.0;
        for module in &config.modules {
            let Some(duration) = module.duration_months else {
                continue;
            };
            let start_month = current_month;
            let end_month = current_month + duration;
            current_month = end_month;
            timeline.push(TimelineSegment {
                module: module.name.clone(),
                duration_months: duration,
                start_month,
                end_month,
            });
        }

        Self {
            config,
            durations,
            timeline,
        }
    }

    /// The standard program curriculum.
    pub fn standard() -> Self {
        Self::new(CurriculumConfig::standard_program())
    }

    /// All module names in curriculum order.
    pub fn module_names(&self) -> Vec<&str> {
        self.config.modules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Modules that count for the leaderboard: everything except the
    /// configured exclusion set.
    pub fn leaderboard_modules(&self) -> Vec<&str> {
        self.config
            .modules
            .iter()
            .filter(|m| !self.config.excluded.contains(&m.name))
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Modules with a defined duration, used for pacing math.
    pub fn duration_modules(&self) -> Vec<&str> {
        self.config
            .modules
            .iter()
            .filter(|m| m.duration_months.is_some())
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Expected duration for a module, if it has one.
    pub fn duration_of(&self, module: &str) -> Option<f64> {
        self.durations.get(module).copied()
    }

    /// The sequential pacing timeline.
    pub fn timeline(&self) -> &[TimelineSegment] {
        &self.timeline
    }

    /// Expected cumulative progress after `months_enrolled` months.
    ///
    /// Walks the timeline: a segment entirely behind contributes its full
    /// 100 points, the straddled segment contributes a linearly interpolated
    /// share, segments ahead contribute 0. Monotone non-decreasing in
    /// `months_enrolled`.
    pub fn expected_progress(&self, months_enrolled: f64) -> f64 {
        if months_enrolled <= 0.0 {
            return 0.0;
        }

        let mut expected = 0.0;
        for segment in &self.timeline {
            if months_enrolled >= segment.end_month {
                expected += 100.0;
            } else if months_enrolled > segment.start_month {
                let time_in_module = months_enrolled - segment.start_month;
                expected += time_in_module / segment.duration_months * 100.0;
            }
        }
        expected
    }
}
